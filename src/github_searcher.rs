use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_utils::create_github_api_response;
use crate::config::Config;
use crate::error::Result;
use crate::models::FindResponse;

/// Maximum page size GitHub accepts for search endpoints.
pub const GITHUB_PER_PAGE: u32 = 100;

const USER_AGENT: &str = "github-user-finder";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Client for GitHub's `/search/users` endpoint.
///
/// The searcher owns the credentials; callers only ever hand it the query
/// string they received.
#[derive(Clone)]
pub struct GitHubSearcher {
    client: Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubSearcher {
    /// Create a new GitHubSearcher instance
    pub fn new(config: &Config) -> Result<Self> {
        if config.github_token.is_none() {
            warn!("GITHUB_TOKEN not set; searches are limited to the anonymous rate limit");
        }

        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(GitHubSearcher {
            client,
            token: config.github_token.clone(),
            base_url: config.github_api_url.clone(),
        })
    }

    /// Builds the upstream URL for a raw query string, always asking for a
    /// full page of results.
    pub fn search_url(&self, raw_query: Option<&str>) -> String {
        let per_page = format!("per_page={}", GITHUB_PER_PAGE);
        match raw_query.map(|q| q.trim_start_matches('?')).filter(|q| !q.is_empty()) {
            Some(query) => format!("{}/search/users?{}&{}", self.base_url, query, per_page),
            None => format!("{}/search/users?{}", self.base_url, per_page),
        }
    }

    /// Forward a query string to GitHub and reshape the answer.
    ///
    /// Only transport failures are returned as `Err`; anything GitHub says,
    /// including errors, comes back as a [`FindResponse`].
    pub async fn search_users(&self, raw_query: Option<&str>) -> Result<FindResponse> {
        let url = self.search_url(raw_query);
        debug!("Requesting URL: {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        log_rate_limit(&headers);

        let body = response.bytes().await?;
        let reshaped = create_github_api_response(status, &headers, &body);

        match &reshaped {
            FindResponse::Success(res) => info!(
                "GitHub returned {} of {} users",
                res.items.len(),
                res.total_count
            ),
            FindResponse::Failure(err) => warn!("GitHub error {}: {}", err.status, err.message),
        }

        Ok(reshaped)
    }
}

/// Logs the remaining budget and, once it is spent, when it resets.
fn log_rate_limit(headers: &HeaderMap) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
    };

    let (Some(remaining), Some(limit)) = (header("X-RateLimit-Remaining"), header("X-RateLimit-Limit"))
    else {
        return;
    };
    debug!("Rate limit: {}/{}", remaining, limit);

    if remaining == 0 {
        match header("X-RateLimit-Reset").and_then(reset_time) {
            Some(reset) => {
                let wait_secs = (reset - Utc::now()).num_seconds().max(0) + 1;
                warn!(
                    "Rate limit reached. Resets at {} (in {} seconds)",
                    reset.to_rfc3339(),
                    wait_secs
                );
            }
            None => warn!("Rate limit reached"),
        }
    }
}

fn reset_time(timestamp: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::try_from(timestamp).ok()?, 0)
}
