//! The live surface: named fields on a rendered page.
//!
//! Everything that reads or writes the page goes through [`LiveSurface`],
//! so the reconciliation loop never knows whether it is talking to Chrome
//! or to an in-memory table.

mod cdp;
#[cfg(test)]
mod memory;

pub use cdp::CdpSurface;
#[cfg(test)]
pub use memory::{MemorySurface, Mutation};

/// Errors that can occur while talking to the page.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error(
        "browser not available at {0} (start Chrome with --remote-debugging-port=9222)"
    )]
    Unavailable(String),

    #[error("no page target found at {0}")]
    NoPage(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("protocol error: {message} (code {code})")]
    Protocol { code: i64, message: String },

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field not found: {0}")]
    FieldNotFound(String),
}

impl From<tungstenite::Error> for SurfaceError {
    fn from(e: tungstenite::Error) -> Self {
        SurfaceError::WebSocket(e.to_string())
    }
}

pub type Result<T> = core::result::Result<T, SurfaceError>;

/// Read and write access to named fields on the page.
///
/// Fields are addressed by their `name` attribute.
pub trait LiveSurface {
    /// Read a field's current value. `Ok(None)` when the field is absent.
    fn lookup(&mut self, name: &str) -> Result<Option<String>>;

    /// Replace the field's value with `value`.
    fn set(&mut self, name: &str, value: &str) -> Result<()>;

    /// Add `value` after the field's current contents.
    fn append(&mut self, name: &str, value: &str) -> Result<()>;

    /// Empty the field.
    fn clear(&mut self, name: &str) -> Result<()>;
}
