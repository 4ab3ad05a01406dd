use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api_utils::{default_search_error, parse_github_user_search_error, FetchError};
use crate::config::Config;
use crate::error::Result;
use crate::finder::FindQuery;
use crate::models::{GithubUserSearchError, GithubUserSearchResponse};
use crate::pagination::InfiniteQuery;

pub const FIND_PATH: &str = "/api/find";

/// Talks to the proxy's `/api/find` route.
#[derive(Clone)]
pub struct FindClient {
    client: Client,
    base_url: String,
}

impl FindClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().user_agent("github-user-finder").build()?;
        Ok(Self {
            client,
            base_url: config.finder_api_url.clone(),
        })
    }

    /// Fetch one page. Any failure, including transport errors, is turned
    /// into the error banner's content.
    pub async fn fetch_page(
        &self,
        query: &FindQuery,
        page: u32,
    ) -> std::result::Result<GithubUserSearchResponse, GithubUserSearchError> {
        let url = format!("{}{}", self.base_url, FIND_PATH);
        debug!("Requesting {} page {} for '{}'", url, page, query.q());

        let response = self
            .client
            .get(&url)
            .query(&query.params(page))
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", url, e);
                default_search_error()
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!("Reading response from {} failed: {}", url, e);
            default_search_error()
        })?;

        if !status.is_success() {
            let error = FetchError {
                status: status.as_u16(),
                data: serde_json::from_slice::<Value>(&body).ok(),
            };
            return Err(parse_github_user_search_error(Some(&error)).unwrap_or_else(default_search_error));
        }

        serde_json::from_slice(&body).map_err(|e| {
            warn!("Unexpected body from {}: {}", url, e);
            default_search_error()
        })
    }
}

/// Drives an [`InfiniteQuery`] against the proxy.
pub struct InfiniteFinder {
    client: FindClient,
    state: InfiniteQuery,
}

impl InfiniteFinder {
    pub fn new(client: FindClient, query: FindQuery) -> Self {
        Self {
            client,
            state: InfiniteQuery::new(query),
        }
    }

    pub fn state(&self) -> &InfiniteQuery {
        &self.state
    }

    /// Starts over when the search, filter or sort changed.
    pub fn set_query(&mut self, query: FindQuery) {
        if self.state.reset_for(query) {
            debug!("Query changed to '{}', pages dropped", self.state.query().q());
        }
    }

    /// Loads the next page if one is due. Returns whether a request was made.
    pub async fn fetch_next_page(&mut self) -> bool {
        if !self.state.should_fetch_next() {
            return false;
        }
        let Some(page) = self.state.begin_fetch() else {
            return false;
        };

        match self.client.fetch_page(self.state.query(), page).await {
            Ok(response) => {
                info!(
                    "Loaded page {} ({} users, {} total)",
                    page,
                    response.items.len(),
                    response.total_count
                );
                self.state.complete(page, response);
            }
            Err(error) => {
                warn!("Page {} failed: {} ({})", page, error.message, error.status);
                self.state.fail(page, error);
            }
        }
        true
    }

    /// Requests the failed page again.
    pub async fn retry(&mut self) -> bool {
        if self.state.clear_error().is_none() {
            return false;
        }
        self.fetch_next_page().await
    }

    /// Keeps loading until the list ends, an error occurs, or `max_pages`
    /// pages are held.
    pub async fn fetch_all(&mut self, max_pages: Option<u32>) {
        loop {
            if let Some(max) = max_pages {
                if self.state.pages().len() >= max as usize {
                    info!("Max page limit reached (limit: {})", max);
                    break;
                }
            }
            if !self.fetch_next_page().await {
                break;
            }
            if self.state.is_error() {
                break;
            }
        }
    }
}
