//! Page accumulation for one search, fetched page by page on demand.

use crate::finder::FindQuery;
use crate::github_searcher::GITHUB_PER_PAGE;
use crate::models::{GithubUser, GithubUserSearchError, GithubUserSearchResponse};

pub const PAGE_SIZE: u32 = GITHUB_PER_PAGE;
pub const INITIAL_PAGE: u32 = 1;

/// The page to request after `last_page_param`, or `None` once every result
/// up to `total_count` has been covered.
pub fn next_page_param(last_page: &GithubUserSearchResponse, last_page_param: u32) -> Option<u32> {
    if u64::from(last_page_param) * u64::from(PAGE_SIZE) >= last_page.total_count {
        None
    } else {
        Some(last_page_param + 1)
    }
}

/// Accumulated pages for a single [`FindQuery`].
#[derive(Debug, Clone, Default)]
pub struct InfiniteQuery {
    query: FindQuery,
    pages: Vec<GithubUserSearchResponse>,
    page_params: Vec<u32>,
    error: Option<GithubUserSearchError>,
    failed_page: Option<u32>,
    is_fetching: bool,
}

impl InfiniteQuery {
    pub fn new(query: FindQuery) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &FindQuery {
        &self.query
    }

    /// Switches to another key. Pages of the old key are dropped.
    pub fn reset_for(&mut self, query: FindQuery) -> bool {
        if self.query == query {
            return false;
        }
        *self = Self::new(query);
        true
    }

    pub fn pages(&self) -> &[GithubUserSearchResponse] {
        &self.pages
    }

    pub fn page_params(&self) -> &[u32] {
        &self.page_params
    }

    pub fn users(&self) -> impl Iterator<Item = &GithubUser> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    /// Total reported by the first page; zero before any data.
    pub fn total_count(&self) -> u64 {
        self.pages.first().map_or(0, |page| page.total_count)
    }

    pub fn error(&self) -> Option<&GithubUserSearchError> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page to load next: the first page, a page after the last one, or the
    /// page that failed.
    pub fn pending_page(&self) -> Option<u32> {
        if let Some(page) = self.failed_page {
            return Some(page);
        }
        match (self.pages.last(), self.page_params.last()) {
            (Some(page), Some(&param)) => next_page_param(page, param),
            _ => Some(INITIAL_PAGE),
        }
    }

    pub fn has_next_page(&self) -> bool {
        !self.pages.is_empty() && self.pending_page().is_some()
    }

    /// End of list: data is present and nothing more to fetch.
    pub fn is_eol(&self) -> bool {
        !self.pages.is_empty() && !self.has_next_page() && !self.is_error()
    }

    /// Whether the list should load its next page now.
    pub fn should_fetch_next(&self) -> bool {
        !self.query.is_skipped()
            && !self.is_fetching
            && !self.is_error()
            && (self.pages.is_empty() || self.has_next_page())
    }

    pub fn begin_fetch(&mut self) -> Option<u32> {
        let page = self.pending_page()?;
        self.is_fetching = true;
        Some(page)
    }

    pub fn complete(&mut self, page: u32, response: GithubUserSearchResponse) {
        self.is_fetching = false;
        self.error = None;
        self.failed_page = None;
        self.pages.push(response);
        self.page_params.push(page);
    }

    pub fn fail(&mut self, page: u32, error: GithubUserSearchError) {
        self.is_fetching = false;
        self.error = Some(error);
        self.failed_page = Some(page);
    }

    /// Clears the error so the failed page is requested again.
    pub fn clear_error(&mut self) -> Option<u32> {
        self.error = None;
        self.failed_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::Sort;
    use crate::models::RateLimit;

    fn page(total_count: u64, logins: &[&str]) -> GithubUserSearchResponse {
        GithubUserSearchResponse {
            total_count,
            incomplete_results: false,
            items: logins
                .iter()
                .enumerate()
                .map(|(i, login)| {
                    serde_json::from_value(serde_json::json!({ "login": login, "id": i }))
                        .unwrap()
                })
                .collect(),
            status: 200,
            rate: RateLimit::default(),
            extra: Default::default(),
        }
    }

    fn react() -> FindQuery {
        FindQuery::new("react", "", Sort::Default)
    }

    #[test]
    fn next_page_predicate() {
        assert_eq!(next_page_param(&page(15000, &[]), 1), Some(2));
        assert_eq!(next_page_param(&page(101, &[]), 1), Some(2));
        assert_eq!(next_page_param(&page(101, &[]), 2), None);
        assert_eq!(next_page_param(&page(100, &[]), 1), None);
        assert_eq!(next_page_param(&page(10, &[]), 1), None);
        assert_eq!(next_page_param(&page(0, &[]), 1), None);
    }

    #[test]
    fn accumulates_pages_until_end_of_list() {
        let mut q = InfiniteQuery::new(react());
        assert!(q.should_fetch_next());
        assert!(q.is_empty());

        let p = q.begin_fetch().unwrap();
        assert_eq!(p, 1);
        assert!(q.is_fetching());
        assert!(!q.should_fetch_next());
        q.complete(p, page(101, &["a", "b"]));

        assert!(q.has_next_page());
        assert!(!q.is_eol());
        let p = q.begin_fetch().unwrap();
        assert_eq!(p, 2);
        q.complete(p, page(101, &["c"]));

        assert!(q.is_eol());
        assert!(!q.should_fetch_next());
        assert_eq!(q.total_count(), 101);
        assert_eq!(q.page_params(), &[1, 2]);
        let logins: Vec<_> = q.users().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, ["a", "b", "c"]);
    }

    #[test]
    fn empty_result_is_eol_with_zero_count() {
        let mut q = InfiniteQuery::new(FindQuery::new("no-results", "", Sort::Default));
        let p = q.begin_fetch().unwrap();
        q.complete(p, page(0, &[]));
        assert!(q.is_eol());
        assert_eq!(q.total_count(), 0);
    }

    #[test]
    fn error_stops_fetching_until_retry() {
        let mut q = InfiniteQuery::new(react());
        let p = q.begin_fetch().unwrap();
        q.complete(p, page(15000, &["a"]));

        let p = q.begin_fetch().unwrap();
        q.fail(p, GithubUserSearchError::new(403, "API rate limit exceeded", RateLimit::default()));

        assert!(q.is_error());
        assert!(!q.is_eol());
        assert!(!q.should_fetch_next());

        assert_eq!(q.clear_error(), Some(2));
        assert!(q.should_fetch_next());
        assert_eq!(q.begin_fetch(), Some(2));
        q.complete(2, page(15000, &["b"]));
        assert_eq!(q.pending_page(), Some(3));
    }

    #[test]
    fn skipped_query_never_fetches() {
        let q = InfiniteQuery::new(FindQuery::default());
        assert!(!q.should_fetch_next());
    }

    #[test]
    fn changing_key_drops_pages() {
        let mut q = InfiniteQuery::new(react());
        let p = q.begin_fetch().unwrap();
        q.complete(p, page(500, &["a"]));

        assert!(!q.reset_for(react()));
        assert_eq!(q.pages().len(), 1);

        assert!(q.reset_for(FindQuery::new("react", "type:org", Sort::Default)));
        assert!(q.is_empty());
        assert_eq!(q.pending_page(), Some(INITIAL_PAGE));
    }
}
