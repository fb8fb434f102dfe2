//! Field types: spreadsheet rows and how they compare to the live page.

use serde::{Deserialize, Serialize};

/// One spreadsheet row: a field name and the value it should hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// The field's `name` attribute on the page. Never empty.
    pub name: String,

    /// The value the spreadsheet wants. May be empty.
    pub desired_value: String,
}

impl FieldRecord {
    pub fn new(name: impl Into<String>, desired_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desired_value: desired_value.into(),
        }
    }

    /// Classify this row against the value read from the page.
    ///
    /// `live` is `None` when the field could not be found.
    pub fn compare(&self, live: Option<&str>) -> Comparison {
        match live {
            None => Comparison::Missing,
            Some(live) if live == self.desired_value => Comparison::Match {
                live: live.to_string(),
            },
            Some(live) if live.trim().is_empty() => Comparison::Empty {
                live: live.to_string(),
            },
            Some(live) => Comparison::Mismatch {
                live: live.to_string(),
            },
        }
    }
}

/// How a spreadsheet row relates to the live page.
///
/// Equality is exact: no whitespace or case normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The field is not on the page.
    Missing,

    /// The page already holds the desired value.
    Match { live: String },

    /// The page field is blank (after trimming) and differs from the desired value.
    Empty { live: String },

    /// The page field holds something else.
    Mismatch { live: String },
}
