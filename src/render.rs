//! Plain-text rendering of the result list.

use std::fmt::Write;

use crate::models::{GithubUser, GithubUserSearchError};
use crate::pagination::InfiniteQuery;

const DIVIDER_WIDTH: usize = 48;

/// `15000` -> `15,000`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `Found 1 user` / `Found 1,234 users`; `None` before any data arrived.
pub fn header_line(state: &InfiniteQuery) -> Option<String> {
    if state.is_empty() {
        return None;
    }
    let count = state.total_count();
    Some(format!(
        "Found {} user{}",
        format_count(count),
        if count == 1 { "" } else { "s" }
    ))
}

pub fn user_card(user: &GithubUser) -> String {
    format!(
        "{:<32} {:<12} {}",
        user.login,
        user.kind.as_deref().unwrap_or("-"),
        user.html_url.as_deref().unwrap_or_default()
    )
}

pub fn error_banner(error: &GithubUserSearchError) -> String {
    format!(
        "Error ({})\n{}\nRateLimit {}/{}",
        error.status, error.message, error.rate.rate_limit_remaining, error.rate.rate_limit
    )
}

fn divider(label: &str) -> String {
    let side = DIVIDER_WIDTH.saturating_sub(label.len() + 2) / 2;
    format!("{0} {1} {0}", "-".repeat(side), label)
}

/// Renders the whole list as the terminal shows it.
pub fn render_list(state: &InfiniteQuery, sort: &str) -> String {
    let mut out = String::new();

    match header_line(state) {
        Some(header) => {
            let _ = writeln!(out, "{header:<40}Sort by: {sort}");
        }
        None => {
            let _ = writeln!(out, "{:<40}Sort by: {sort}", "");
        }
    }
    let _ = writeln!(out, "{}", "-".repeat(DIVIDER_WIDTH));

    for user in state.users() {
        let _ = writeln!(out, "{}", user_card(user));
    }

    if state.is_eol() && state.total_count() > 0 {
        let _ = writeln!(out, "{}", divider("END OF LIST"));
    }

    if let Some(error) = state.error() {
        let _ = writeln!(out, "{}", error_banner(error));
    }

    out
}
