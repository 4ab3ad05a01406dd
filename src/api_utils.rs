//! Conversion between GitHub's raw search responses and the envelopes the
//! proxy hands to its clients.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{
    FindResponse, GithubUserSearchError, GithubUserSearchResponse, RateLimit, RATE_LIMIT_UNKNOWN,
};

pub const UNEXPECTED_SERVER_ERROR: &str = "An unexpected server error occurred.";
pub const UNKNOWN_ERROR: &str = "Unknown Error";

const RATE_LIMIT_HEADER: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Reads the rate-limit envelope from response headers.
pub fn rate_limit_from_headers(headers: &HeaderMap) -> RateLimit {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| RATE_LIMIT_UNKNOWN.to_string())
    };

    RateLimit {
        rate_limit: read(RATE_LIMIT_HEADER),
        rate_limit_remaining: read(RATE_LIMIT_REMAINING_HEADER),
    }
}

/// Reshapes a GitHub `/search/users` response into a [`FindResponse`].
///
/// A body carrying `items` is a success and keeps every upstream field. A body
/// without `items` but with a `message` is a GitHub error. Everything else,
/// including bodies that are not JSON, becomes a 500.
pub fn create_github_api_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> FindResponse {
    let rate = rate_limit_from_headers(headers);

    let parsed = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!("GitHub returned a non-object body: {}", other);
            return unexpected(rate);
        }
        Err(e) => {
            warn!("GitHub returned a body that is not JSON: {}", e);
            return unexpected(rate);
        }
    };

    if !parsed.contains_key("items") && !body_status_is_ok(&parsed) {
        if let Some(message) = parsed.get("message").and_then(Value::as_str) {
            let code = body_status(&parsed).unwrap_or(status.as_u16());
            debug!("GitHub error {}: {}", code, message);
            return FindResponse::Failure(GithubUserSearchError::new(code, message, rate));
        }
    }

    if parsed.contains_key("items") {
        return match into_success(parsed, rate.clone()) {
            Ok(res) => FindResponse::Success(res),
            Err(e) => {
                warn!("Could not read GitHub search items: {}", e);
                unexpected(rate)
            }
        };
    }

    unexpected(rate)
}

fn into_success(
    mut map: Map<String, Value>,
    rate: RateLimit,
) -> serde_json::Result<GithubUserSearchResponse> {
    if !map.contains_key("total_count") {
        let count = map
            .get("items")
            .and_then(Value::as_array)
            .map_or(0, |items| items.len());
        map.insert("total_count".into(), Value::from(count));
    }
    map.insert("status".into(), Value::from(200));
    map.insert("rate_limit".into(), Value::from(rate.rate_limit));
    map.insert(
        "rate_limit_remaining".into(),
        Value::from(rate.rate_limit_remaining),
    );

    serde_json::from_value(Value::Object(map))
}

/// GitHub sends `status` as a string on newer error bodies and omits it on
/// older ones.
fn body_status(map: &Map<String, Value>) -> Option<u16> {
    match map.get("status")? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        _ => None,
    }
}

fn body_status_is_ok(map: &Map<String, Value>) -> bool {
    body_status(map) == Some(200)
}

fn unexpected(rate: RateLimit) -> FindResponse {
    FindResponse::Failure(GithubUserSearchError::new(500, UNEXPECTED_SERVER_ERROR, rate))
}

/// A non-2xx answer from the proxy as seen by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchError {
    pub status: u16,
    pub data: Option<Value>,
}

/// The error shown when a failed request carries nothing usable.
pub fn default_search_error() -> GithubUserSearchError {
    GithubUserSearchError::new(500, UNKNOWN_ERROR, RateLimit::default())
}

/// Normalises a failed proxy call into the error banner's content.
///
/// The body must carry all of `message`, `rate_limit` and
/// `rate_limit_remaining` to be trusted; otherwise the default error is used.
/// Keys that are present but `null` fall back to the default's values.
pub fn parse_github_user_search_error(
    error: Option<&FetchError>,
) -> Option<GithubUserSearchError> {
    let error = error?;

    let Some(Value::Object(data)) = &error.data else {
        return Some(default_search_error());
    };

    let required = ["message", "rate_limit", "rate_limit_remaining"];
    if !required.iter().all(|key| data.contains_key(*key)) {
        return Some(default_search_error());
    }

    let fallback = default_search_error();
    let text = |key: &str, default: &str| match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    };

    Some(GithubUserSearchError {
        status: error.status,
        message: text("message", &fallback.message),
        rate: RateLimit {
            rate_limit: text("rate_limit", &fallback.rate.rate_limit),
            rate_limit_remaining: text(
                "rate_limit_remaining",
                &fallback.rate.rate_limit_remaining,
            ),
        },
    })
}
