//! Builds GitHub search qualifiers from the filter form.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::FinderError;

pub const REPO_COUNT_MAX: u32 = 1000;
pub const FOLLOWER_COUNT_MAX: u32 = 10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountType {
    #[default]
    All,
    User,
    Org,
}

impl AccountType {
    fn qualifier(self) -> Option<&'static str> {
        match self {
            AccountType::All => None,
            AccountType::User => Some("type:user"),
            AccountType::Org => Some("type:org"),
        }
    }
}

impl FromStr for AccountType {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(AccountType::All),
            "user" => Ok(AccountType::User),
            "org" | "organization" => Ok(AccountType::Org),
            other => Err(FinderError::InvalidFilter(format!("unknown account type '{other}'"))),
        }
    }
}

/// Which fields the search text is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchIn {
    pub name: bool,
    pub login: bool,
    pub email: bool,
}

/// An inclusive count range with a ceiling meaning "and above".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
    ceiling: u32,
}

impl CountRange {
    pub fn full(ceiling: u32) -> Self {
        Self {
            min: 0,
            max: ceiling,
            ceiling,
        }
    }

    /// Clamps both ends into `0..=ceiling` and orders them.
    pub fn new(min: u32, max: u32, ceiling: u32) -> Self {
        let (a, b) = (min.min(ceiling), max.min(ceiling));
        Self {
            min: a.min(b),
            max: a.max(b),
            ceiling,
        }
    }

    fn qualifier(&self, key: &str) -> Option<String> {
        match (self.min, self.max == self.ceiling) {
            (0, true) => None,
            (min, true) => Some(format!("{key}:>={min}")),
            (min, false) => Some(format!("{key}:{min}..{}", self.max)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    pub account_type: AccountType,
    pub search_in: SearchIn,
    pub location: String,
    pub language: String,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub repo_count: CountRange,
    pub follower_count: CountRange,
    pub is_sponsorable: bool,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            account_type: AccountType::All,
            search_in: SearchIn::default(),
            location: String::new(),
            language: String::new(),
            created_from: None,
            created_to: None,
            repo_count: CountRange::full(REPO_COUNT_MAX),
            follower_count: CountRange::full(FOLLOWER_COUNT_MAX),
            is_sponsorable: false,
        }
    }
}

impl SearchFilters {
    /// Qualifiers joined by single spaces; empty when nothing is set.
    pub fn to_filter_string(&self) -> String {
        let mut options: Vec<String> = Vec::new();

        if let Some(q) = self.account_type.qualifier() {
            options.push(q.to_string());
        }

        if self.search_in.email {
            options.push("in:email".into());
        }
        if self.search_in.login {
            options.push("in:login".into());
        }
        if self.search_in.name {
            options.push("in:name".into());
        }

        if let Some(q) = text_qualifier("location", &self.location) {
            options.push(q);
        }
        if let Some(q) = text_qualifier("language", &self.language) {
            options.push(q);
        }
        if let Some(q) = self.created_qualifier() {
            options.push(q);
        }
        if self.is_sponsorable {
            options.push("is:sponsorable".into());
        }

        options.extend(self.repo_count.qualifier("repos"));
        options.extend(self.follower_count.qualifier("followers"));

        options.join(" ")
    }

    fn created_qualifier(&self) -> Option<String> {
        const FMT: &str = "%Y-%m-%d";
        match (self.created_from, self.created_to) {
            (Some(from), Some(to)) => {
                let (from, to) = if from <= to { (from, to) } else { (to, from) };
                Some(format!("created:{}..{}", from.format(FMT), to.format(FMT)))
            }
            (Some(from), None) => Some(format!("created:>={}", from.format(FMT))),
            (None, Some(to)) => Some(format!("created:<={}", to.format(FMT))),
            (None, None) => None,
        }
    }
}

fn text_qualifier(key: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else if value.contains(char::is_whitespace) {
        Some(format!("{key}:\"{}\"", value.replace('"', "")))
    } else {
        Some(format!("{key}:{value}"))
    }
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, FinderError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| FinderError::InvalidFilter(format!("bad date '{s}': {e}")))
}

/// Parses `MIN..MAX`, `MIN..` or a bare `MIN` against a ceiling.
pub fn parse_range(s: &str, ceiling: u32) -> Result<CountRange, FinderError> {
    let bad = |e: std::num::ParseIntError| FinderError::InvalidFilter(format!("bad range '{s}': {e}"));
    let s = s.trim();

    match s.split_once("..") {
        Some((min, max)) => {
            let min = if min.is_empty() { 0 } else { min.parse().map_err(bad)? };
            let max = if max.is_empty() { ceiling } else { max.parse().map_err(bad)? };
            Ok(CountRange::new(min, max, ceiling))
        }
        None => Ok(CountRange::new(s.parse().map_err(bad)?, ceiling, ceiling)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn default_filters_are_empty() {
        assert_eq!(SearchFilters::default().to_filter_string(), "");
    }

    #[test]
    fn single_account_type() {
        let filters = SearchFilters {
            account_type: AccountType::Org,
            ..SearchFilters::default()
        };
        assert_eq!(filters.to_filter_string(), "type:org");
    }

    #[test]
    fn qualifiers_keep_fixed_order() {
        let filters = SearchFilters {
            account_type: AccountType::User,
            search_in: SearchIn {
                name: true,
                login: true,
                email: true,
            },
            location: "Seoul".into(),
            language: "TypeScript".into(),
            created_from: Some(date("2020-01-02")),
            is_sponsorable: true,
            ..SearchFilters::default()
        };

        assert_eq!(
            filters.to_filter_string(),
            "type:user in:email in:login in:name location:Seoul language:TypeScript created:>=2020-01-02 is:sponsorable"
        );
    }

    #[test]
    fn location_with_spaces_is_quoted() {
        let filters = SearchFilters {
            location: " New York ".into(),
            ..SearchFilters::default()
        };
        assert_eq!(filters.to_filter_string(), "location:\"New York\"");
    }

    #[test]
    fn created_ranges() {
        let only_to = SearchFilters {
            created_to: Some(date("2021-05-01")),
            ..SearchFilters::default()
        };
        assert_eq!(only_to.to_filter_string(), "created:<=2021-05-01");

        let reversed = SearchFilters {
            created_from: Some(date("2022-01-01")),
            created_to: Some(date("2019-01-01")),
            ..SearchFilters::default()
        };
        assert_eq!(reversed.to_filter_string(), "created:2019-01-01..2022-01-01");
    }

    #[test]
    fn count_ranges() {
        let filters = SearchFilters {
            repo_count: CountRange::new(10, REPO_COUNT_MAX, REPO_COUNT_MAX),
            follower_count: CountRange::new(100, 500, FOLLOWER_COUNT_MAX),
            ..SearchFilters::default()
        };
        assert_eq!(filters.to_filter_string(), "repos:>=10 followers:100..500");
    }

    #[test]
    fn count_range_clamps_and_orders() {
        let range = CountRange::new(5000, 20, REPO_COUNT_MAX);
        assert_eq!((range.min, range.max), (20, 1000));
        assert_eq!(range.qualifier("repos").as_deref(), Some("repos:>=20"));
        assert_eq!(CountRange::new(0, 50, 1000).qualifier("repos").as_deref(), Some("repos:0..50"));
    }

    #[test]
    fn parse_range_forms() {
        assert_eq!(parse_range("10..20", 1000).unwrap(), CountRange::new(10, 20, 1000));
        assert_eq!(parse_range("10..", 1000).unwrap(), CountRange::new(10, 1000, 1000));
        assert_eq!(parse_range("..20", 1000).unwrap(), CountRange::new(0, 20, 1000));
        assert_eq!(parse_range("7", 1000).unwrap(), CountRange::new(7, 1000, 1000));
        assert!(parse_range("a..b", 1000).is_err());
    }

    #[test]
    fn account_type_parses() {
        assert_eq!("organization".parse::<AccountType>().unwrap(), AccountType::Org);
        assert_eq!("".parse::<AccountType>().unwrap(), AccountType::All);
        assert!("bot".parse::<AccountType>().is_err());
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(parse_date("2020/01/01").is_err());
    }
}
