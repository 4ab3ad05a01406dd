use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FinderError;

/// Sort keys offered for the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    #[default]
    Default,
    Followers,
    Repositories,
    Joined,
}

impl Sort {
    pub const ALL: [Sort; 4] = [Sort::Default, Sort::Followers, Sort::Repositories, Sort::Joined];

    pub fn as_str(self) -> &'static str {
        match self {
            Sort::Default => "default",
            Sort::Followers => "followers",
            Sort::Repositories => "repositories",
            Sort::Joined => "joined",
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sort {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sort::ALL
            .into_iter()
            .find(|sort| sort.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FinderError::InvalidFilter(format!("unknown sort option '{s}'")))
    }
}

/// The three values that decide which search is shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FinderState {
    pub search_string: String,
    pub sort: Sort,
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinderAction {
    SetSearchString(Option<String>),
    SetSortOption(Option<Sort>),
    SetFilterOption(Option<String>),
}

impl FinderState {
    /// Applies one action. A missing payload resets that field.
    pub fn reduce(self, action: FinderAction) -> Self {
        match action {
            FinderAction::SetSearchString(s) => Self {
                search_string: s.unwrap_or_default(),
                ..self
            },
            FinderAction::SetSortOption(sort) => Self {
                sort: sort.unwrap_or_default(),
                ..self
            },
            FinderAction::SetFilterOption(filter) => Self {
                filter: filter.unwrap_or_default(),
                ..self
            },
        }
    }

    pub fn dispatch(&mut self, action: FinderAction) {
        *self = std::mem::take(self).reduce(action);
    }

    pub fn query(&self) -> FindQuery {
        FindQuery {
            search_string: self.search_string.clone(),
            filter: self.filter.clone(),
            sort: self.sort,
        }
    }
}

/// Identifies one accumulated result list. Changing any part starts over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FindQuery {
    pub search_string: String,
    pub filter: String,
    pub sort: Sort,
}

impl FindQuery {
    pub fn new(search_string: impl Into<String>, filter: impl Into<String>, sort: Sort) -> Self {
        Self {
            search_string: search_string.into(),
            filter: filter.into(),
            sort,
        }
    }

    /// The `q` parameter: search text followed by the filter qualifiers.
    pub fn q(&self) -> String {
        if self.filter.is_empty() {
            self.search_string.clone()
        } else {
            format!("{} {}", self.search_string, self.filter)
        }
    }

    /// Nothing is requested until there is search text.
    pub fn is_skipped(&self) -> bool {
        self.search_string.is_empty()
    }

    /// Query parameters for one page, in request order.
    pub fn params(&self, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.q()),
            ("sort", self.sort.to_string()),
            ("page", page.to_string()),
        ]
    }
}
