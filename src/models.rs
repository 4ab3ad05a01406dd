use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder used when GitHub did not send a rate-limit header.
pub const RATE_LIMIT_UNKNOWN: &str = "-";

/// A single account returned by `/search/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    /// `User` or `Organization`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Remaining upstream fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `(limit, remaining)` pair read from GitHub's response headers.
///
/// Both values are kept as the raw header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    #[serde(default = "unknown")]
    pub rate_limit: String,
    #[serde(default = "unknown")]
    pub rate_limit_remaining: String,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            rate_limit: RATE_LIMIT_UNKNOWN.to_string(),
            rate_limit_remaining: RATE_LIMIT_UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubUserSearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<GithubUser>,
    #[serde(default = "ok_status")]
    pub status: u16,
    #[serde(flatten)]
    pub rate: RateLimit,
    /// Top-level fields GitHub may add later.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubUserSearchError {
    pub status: u16,
    pub message: String,
    #[serde(flatten)]
    pub rate: RateLimit,
}

impl GithubUserSearchError {
    pub fn new(status: u16, message: impl Into<String>, rate: RateLimit) -> Self {
        Self {
            status,
            message: message.into(),
            rate,
        }
    }
}

/// What the proxy answers for `/api/find`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FindResponse {
    Success(GithubUserSearchResponse),
    Failure(GithubUserSearchError),
}

impl FindResponse {
    pub fn status(&self) -> u16 {
        match self {
            FindResponse::Success(res) => res.status,
            FindResponse::Failure(err) => err.status,
        }
    }

    pub fn rate(&self) -> &RateLimit {
        match self {
            FindResponse::Success(res) => &res.rate,
            FindResponse::Failure(err) => &err.rate,
        }
    }
}

fn ok_status() -> u16 {
    200
}

fn unknown() -> String {
    RATE_LIMIT_UNKNOWN.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_keeps_unknown_fields() {
        let user: GithubUser = serde_json::from_value(json!({
            "login": "octocat",
            "id": 1,
            "avatar_url": "https://avatars.githubusercontent.com/u/1",
            "html_url": "https://github.com/octocat",
            "type": "User",
            "site_admin": false
        }))
        .unwrap();

        assert_eq!(user.kind.as_deref(), Some("User"));
        assert_eq!(user.extra.get("site_admin"), Some(&json!(false)));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["type"], "User");
        assert_eq!(back["site_admin"], false);
    }

    #[test]
    fn missing_user_fields_stay_missing() {
        let user: GithubUser = serde_json::from_value(json!({ "login": "ghost", "id": 10 })).unwrap();
        assert_eq!(user.avatar_url, None);
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({ "login": "ghost", "id": 10 })
        );
    }

    #[test]
    fn error_serializes_flat() {
        let err = GithubUserSearchError::new(
            403,
            "API rate limit exceeded",
            RateLimit {
                rate_limit: "60".into(),
                rate_limit_remaining: "0".into(),
            },
        );

        assert_eq!(
            serde_json::to_value(FindResponse::Failure(err)).unwrap(),
            json!({
                "status": 403,
                "message": "API rate limit exceeded",
                "rate_limit": "60",
                "rate_limit_remaining": "0"
            })
        );
    }

    #[test]
    fn untagged_response_picks_variant_by_shape() {
        let ok: FindResponse = serde_json::from_value(json!({
            "total_count": 1,
            "items": [{ "login": "a", "id": 2 }],
            "rate_limit": "60",
            "rate_limit_remaining": "59"
        }))
        .unwrap();
        assert!(matches!(ok, FindResponse::Success(_)));
        assert_eq!(ok.status(), 200);

        let failed: FindResponse = serde_json::from_value(json!({
            "status": 422,
            "message": "Validation Failed",
            "rate_limit": "-",
            "rate_limit_remaining": "-"
        }))
        .unwrap();
        assert_eq!(failed.status(), 422);
        assert_eq!(failed.rate(), &RateLimit::default());
    }
}
