//! Core data model for Cosmo.
//!
//! These types describe one reconciliation pass: the spreadsheet rows going
//! in, how each row relates to the live page, the decisions taken on
//! mismatches, and the change events coming out.

mod decision;
mod event;
mod field;

pub use decision::{Decision, DecisionKind};
pub use event::{Action, ChangeEvent};
pub use field::{Comparison, FieldRecord};
