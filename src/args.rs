use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::filters::{
    parse_date, parse_range, AccountType, SearchFilters, SearchIn, FOLLOWER_COUNT_MAX,
    REPO_COUNT_MAX,
};
use crate::finder::Sort;

/// GitHub user finder: a rate-limit aware search proxy and a terminal client
/// with filters, sorting and page-by-page loading.
#[derive(Parser)]
#[clap(
    author,
    version,
    about,
    long_about = "Search GitHub users and organizations through a small proxy that hides credentials and reports the API rate limit."
)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the search proxy.
    Serve {
        /// Port to listen on.
        #[clap(short, long, env = "FINDER_PORT")]
        port: Option<u16>,

        /// GitHub API token for authentication.
        #[clap(short, long)]
        token: Option<String>,

        /// Base URL of the GitHub API.
        #[clap(long, value_name = "URL")]
        github_api_url: Option<String>,
    },

    /// Search users through the proxy.
    Search(SearchArgs),

    /// Render an avatar as a 40x40 circular PNG.
    Thumb {
        /// Avatar image URL.
        url: String,

        /// Output PNG path.
        #[clap(short, long, default_value = "avatar.png")]
        output: PathBuf,
    },
}

#[derive(Parser)]
pub struct SearchArgs {
    /// Words to search for.
    #[clap(num_args = 1.., required = true)]
    pub words: Vec<String>,

    /// Sort by: default, followers, repositories or joined.
    #[clap(short, long, default_value = "default")]
    pub sort: Sort,

    /// Account type: all, user or org.
    #[clap(long = "type", default_value = "all")]
    pub account_type: AccountType,

    /// Match against the account name (login).
    #[clap(long)]
    pub in_login: bool,

    /// Match against the user's full name.
    #[clap(long)]
    pub in_name: bool,

    /// Match against the public email.
    #[clap(long)]
    pub in_email: bool,

    #[clap(long)]
    pub location: Option<String>,

    #[clap(long)]
    pub language: Option<String>,

    /// Joined on or after this date (YYYY-MM-DD).
    #[clap(long, value_name = "DATE")]
    pub created_from: Option<String>,

    /// Joined on or before this date (YYYY-MM-DD).
    #[clap(long, value_name = "DATE")]
    pub created_to: Option<String>,

    /// Repository count range, e.g. `10..100` or `50..`.
    #[clap(long, value_name = "RANGE")]
    pub repos: Option<String>,

    /// Follower count range, e.g. `100..5000` or `1000..`.
    #[clap(long, value_name = "RANGE")]
    pub followers: Option<String>,

    /// Only sponsorable accounts.
    #[clap(long)]
    pub sponsorable: bool,

    /// Maximum number of pages to load.
    /// Each page contains up to 100 results.
    #[clap(short = 'p', long, value_name = "NUM", default_value = "1")]
    pub max_pages: u32,

    /// Base URL of the proxy.
    #[clap(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Write loaded users as JSON to this file.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Write avatar thumbnails (PNG) into this directory.
    #[clap(long, value_name = "DIR")]
    pub thumbnails: Option<PathBuf>,

    /// Maximum number of concurrent avatar downloads.
    #[clap(short = 'c', long, default_value = "4")]
    pub concurrency: usize,
}

impl SearchArgs {
    pub fn search_string(&self) -> String {
        self.words.join(" ")
    }

    pub fn filters(&self) -> Result<SearchFilters> {
        Ok(SearchFilters {
            account_type: self.account_type,
            search_in: SearchIn {
                name: self.in_name,
                login: self.in_login,
                email: self.in_email,
            },
            location: self.location.clone().unwrap_or_default(),
            language: self.language.clone().unwrap_or_default(),
            created_from: self.created_from.as_deref().map(parse_date).transpose()?,
            created_to: self.created_to.as_deref().map(parse_date).transpose()?,
            repo_count: match &self.repos {
                Some(r) => parse_range(r, REPO_COUNT_MAX)?,
                None => SearchFilters::default().repo_count,
            },
            follower_count: match &self.followers {
                Some(r) => parse_range(r, FOLLOWER_COUNT_MAX)?,
                None => SearchFilters::default().follower_count,
            },
            is_sponsorable: self.sponsorable,
        })
    }
}
