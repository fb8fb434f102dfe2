//! Change events: the audit record of what a pass did to each field.
//!
//! One event per row processed. The action decides which values are
//! present, so each action has its own constructor.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// What happened to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The page already held the desired value. Nothing was changed.
    Matched,

    /// A blank field was filled with the desired value.
    Filled,

    /// A mismatch was left as-is.
    Skipped,

    /// The desired value was appended to the existing value.
    Appended,

    /// The existing value was replaced by the desired value.
    Overwrote,

    /// The field is not on the page.
    FieldNotFound,

    /// The outcome could not be established.
    Unknown,
}

impl Action {
    /// The label stored in the history database.
    pub fn label(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Filled => "filled",
            Self::Skipped => "skipped",
            Self::Appended => "appended",
            Self::Overwrote => "overwrote",
            Self::FieldNotFound => "field_not_found",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a stored label. Unrecognized labels become `Unknown`.
    ///
    /// Also accepts the short verbs older history databases used.
    pub fn from_label(label: &str) -> Self {
        match label {
            "matched" => Self::Matched,
            "filled" => Self::Filled,
            "skipped" | "skip" => Self::Skipped,
            "appended" | "append" => Self::Appended,
            "overwrote" | "overwrite" => Self::Overwrote,
            "field_not_found" => Self::FieldNotFound,
            _ => Self::Unknown,
        }
    }

    /// Human-readable name for reports.
    pub fn title(self) -> &'static str {
        match self {
            Self::Matched => "Matched",
            Self::Filled => "Filled",
            Self::Skipped => "Skipped",
            Self::Appended => "Appended",
            Self::Overwrote => "Overwrote",
            Self::FieldNotFound => "Field Not Found",
            Self::Unknown => "Unknown",
        }
    }
}

/// A single, immutable record of what happened to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub timestamp: Timestamp,
    pub field_name: String,
    pub action: Action,
    pub prev_value: Option<String>,
    pub new_value: Option<String>,
}

impl ChangeEvent {
    fn now(
        field_name: &str,
        action: Action,
        prev_value: Option<&str>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            timestamp: Timestamp::now(),
            field_name: field_name.to_string(),
            action,
            prev_value: prev_value.map(String::from),
            new_value,
        }
    }

    pub fn matched(field_name: &str, live: &str) -> Self {
        Self::now(field_name, Action::Matched, Some(live), None)
    }

    pub fn filled(field_name: &str, live: &str, desired: &str) -> Self {
        Self::now(field_name, Action::Filled, Some(live), Some(desired.to_string()))
    }

    pub fn skipped(field_name: &str, live: &str) -> Self {
        Self::now(field_name, Action::Skipped, Some(live), None)
    }

    /// The new value is `live + desired`, with no separator.
    pub fn appended(field_name: &str, live: &str, desired: &str) -> Self {
        Self::now(
            field_name,
            Action::Appended,
            Some(live),
            Some(format!("{live}{desired}")),
        )
    }

    pub fn overwrote(field_name: &str, live: &str, desired: &str) -> Self {
        Self::now(
            field_name,
            Action::Overwrote,
            Some(live),
            Some(desired.to_string()),
        )
    }

    pub fn not_found(field_name: &str, desired: &str) -> Self {
        Self::now(
            field_name,
            Action::FieldNotFound,
            None,
            Some(desired.to_string()),
        )
    }

    pub fn unknown(field_name: &str, live: Option<&str>) -> Self {
        Self::now(field_name, Action::Unknown, live, None)
    }

    /// Whether the values present match what the action allows.
    pub fn is_well_formed(&self) -> bool {
        if self.field_name.trim().is_empty() {
            return false;
        }
        let (prev, new) = (self.prev_value.is_some(), self.new_value.is_some());
        match self.action {
            Action::Matched | Action::Skipped => prev && !new,
            Action::Filled | Action::Appended | Action::Overwrote => prev && new,
            Action::FieldNotFound => !prev && new,
            Action::Unknown => !new,
        }
    }
}
