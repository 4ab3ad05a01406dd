use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::error::{FinderError, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_FINDER_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_AVATAR_HOST: &str = "avatars.githubusercontent.com";

/// Runtime settings shared by the proxy and the terminal client.
///
/// Values come from the process environment (after `.env` is loaded) and may
/// be overridden by command line flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub finder_api_url: String,
    /// The only host the proxy fetches avatars from.
    pub avatar_host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            finder_api_url: DEFAULT_FINDER_API_URL.to_string(),
            avatar_host: DEFAULT_AVATAR_HOST.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            port: try_load("FINDER_PORT", DEFAULT_PORT)?,
            github_token: token_from(var("GITHUB_TOKEN")),
            github_api_url: trim_base(try_load("GITHUB_API_URL", DEFAULT_GITHUB_API_URL.to_string())?),
            finder_api_url: trim_base(try_load("FINDER_API_URL", DEFAULT_FINDER_API_URL.to_string())?),
            avatar_host: try_load("FINDER_AVATAR_HOST", DEFAULT_AVATAR_HOST.to_string())?,
        })
    }

    /// Applies a token given on the command line. Blank values are ignored.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token_from(token) {
            self.github_token = Some(token);
        }
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn with_finder_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.finder_api_url = trim_base(url);
        }
        self
    }

    pub fn with_github_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.github_api_url = trim_base(url);
        }
        self
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            FinderError::Config(format!("{key}={raw}: {e}"))
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn token_from(raw: Option<String>) -> Option<String> {
    raw.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
