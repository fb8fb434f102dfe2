//! Decisions: how a mismatch gets resolved.

use std::str::FromStr;

/// What to do with a field whose page value differs from the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// Leave the page value alone.
    Skip,

    /// Add the spreadsheet value after the page value.
    Append,

    /// Replace the page value with the spreadsheet value.
    Overwrite,
}

/// A resolved mismatch, optionally applied to every remaining mismatch in the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub kind: DecisionKind,
    pub apply_to_all: bool,
}

impl Decision {
    /// A decision for this field only.
    pub fn once(kind: DecisionKind) -> Self {
        Self {
            kind,
            apply_to_all: false,
        }
    }

    /// A decision for this and every remaining mismatch in the pass.
    pub fn for_all(kind: DecisionKind) -> Self {
        Self {
            kind,
            apply_to_all: true,
        }
    }
}

/// The input was not one of the accepted responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized choice '{0}' (expected s, a, or o, optionally followed by 'all')")]
pub struct ParseDecisionError(pub String);

impl FromStr for Decision {
    type Err = ParseDecisionError;

    /// Parse a prompt response: `s`, `a`, `o` or their full words,
    /// optionally followed by `all`. Case and surrounding whitespace are ignored.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        let mut words = normalized.split_whitespace();

        let kind = match words.next() {
            Some("s" | "skip") => DecisionKind::Skip,
            Some("a" | "append") => DecisionKind::Append,
            Some("o" | "overwrite") => DecisionKind::Overwrite,
            _ => return Err(ParseDecisionError(input.trim().to_string())),
        };

        match (words.next(), words.next()) {
            (None, _) => Ok(Self::once(kind)),
            (Some("all"), None) => Ok(Self::for_all(kind)),
            _ => Err(ParseDecisionError(input.trim().to_string())),
        }
    }
}
