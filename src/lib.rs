//! # GitHub User Finder
//!
//! Search GitHub users and organizations with filters, sorting and
//! page-by-page loading, through a small proxy that keeps the GitHub token
//! server side and reports the API rate limit on every answer.
//!
//! ## Main Components
//!
//! - [`server`]: the `/api/find` proxy (plus `/api/avatar` thumbnails)
//! - [`GitHubSearcher`]: the upstream client for `/search/users`
//! - [`FinderState`] and [`SearchFilters`]: search text, sort key and filter string
//! - [`InfiniteFinder`]: accumulates result pages for one query
//! - [`thumbnail`]: the fixed 40x40 circular avatar transform
//!
//! ## Example
//!
//! ```no_run
//! use github_user_finder_lib::{Config, FindClient, FindQuery, InfiniteFinder, Sort};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = Config::load()?;
//!     let client = FindClient::new(&config)?;
//!
//!     let mut finder = InfiniteFinder::new(client, FindQuery::new("rust", "type:org", Sort::Followers));
//!     finder.fetch_all(Some(2)).await;
//!
//!     for user in finder.state().users() {
//!         println!("{}", user.login);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api_utils;
mod args;
pub mod config;
pub mod error;
pub mod filters;
pub mod find_client;
pub mod finder;
mod github_searcher;
pub mod models;
pub mod pagination;
pub mod render;
pub mod server;
pub mod thumbnail;

pub use crate::args::{Args, Command, SearchArgs};
pub use crate::config::Config;
pub use crate::error::{FinderError, Result};
pub use crate::filters::SearchFilters;
pub use crate::find_client::{FindClient, InfiniteFinder};
pub use crate::finder::{FindQuery, FinderAction, FinderState, Sort};
pub use crate::github_searcher::{GitHubSearcher, GITHUB_PER_PAGE};
