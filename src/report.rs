//! Per-run change logs.
//!
//! One pass produces one batch of events, rendered three ways under a
//! shared `log_<timestamp>` stem: Markdown for reading, JSON for tooling,
//! and plain text for grepping.

use std::{
    fmt::Write as _,
    fs, io,
    path::PathBuf,
};

use jiff::Zoned;
use tracing::{debug, warn};

use crate::model::ChangeEvent;

/// Errors that can occur writing logs.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp format '{format}': {source}")]
    Timestamp { format: String, source: jiff::Error },
}

/// Format `now` with a `strftime` pattern.
pub fn format_timestamp(format: &str, now: &Zoned) -> Result<String, ReportError> {
    jiff::fmt::strtime::format(format, now).map_err(|source| ReportError::Timestamp {
        format: format.to_string(),
        source,
    })
}

/// What a write produced.
#[derive(Debug)]
pub struct LogReport {
    /// Markdown, JSON, and text files, in that order.
    pub paths: Vec<PathBuf>,

    /// Events left out because they were malformed.
    pub skipped: usize,
}

/// Writes change logs into a directory.
pub struct LogWriter {
    dir: PathBuf,
    timestamp_format: String,
}

impl LogWriter {
    pub fn new(dir: impl Into<PathBuf>, timestamp_format: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Render `events` to Markdown, JSON, and text files.
    pub fn write(&self, events: &[ChangeEvent]) -> Result<LogReport, ReportError> {
        self.write_at(events, &Zoned::now())
    }

    /// Like [`write`](Self::write), with the clock supplied.
    pub fn write_at(&self, events: &[ChangeEvent], now: &Zoned) -> Result<LogReport, ReportError> {
        fs::create_dir_all(&self.dir)?;

        let mut valid = Vec::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            if event.is_well_formed() {
                valid.push(event);
            } else {
                warn!(
                    index,
                    field = %event.field_name,
                    action = event.action.label(),
                    "skipped malformed log entry"
                );
            }
        }
        let skipped = events.len() - valid.len();

        let stem = self.unique_stem(&format!(
            "log_{}",
            format_timestamp(&self.timestamp_format, now)?
        ));

        let md = self.dir.join(format!("{stem}.md"));
        let json = self.dir.join(format!("{stem}.json"));
        let txt = self.dir.join(format!("{stem}.txt"));

        fs::write(&md, render_markdown(&valid, &self.timestamp_format)?)?;
        fs::write(&json, serde_json::to_string_pretty(&valid)?)?;
        fs::write(&txt, render_text(&valid, &self.timestamp_format)?)?;
        debug!(dir = %self.dir.display(), %stem, entries = valid.len(), "wrote logs");

        Ok(LogReport {
            paths: vec![md, json, txt],
            skipped,
        })
    }

    /// Add `_1`, `_2`, … until no rendering of the stem exists yet.
    fn unique_stem(&self, base: &str) -> String {
        let taken = |stem: &str| {
            ["md", "json", "txt"]
                .iter()
                .any(|ext| self.dir.join(format!("{stem}.{ext}")).exists())
        };
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|stem| !taken(stem))
            .unwrap_or_else(|| base.to_string())
    }
}

fn local_time(event: &ChangeEvent, format: &str) -> Result<String, ReportError> {
    let zoned = event.timestamp.to_zoned(jiff::tz::TimeZone::system());
    format_timestamp(format, &zoned)
}

fn show(value: Option<&String>) -> &str {
    value.map_or("None", String::as_str)
}

fn render_markdown(events: &[&ChangeEvent], format: &str) -> Result<String, ReportError> {
    let mut out = String::new();
    for event in events {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "- **Timestamp**: {}\n  \
             - **Field Name**: {}\n  \
             - **Action**: {}\n  \
             - **Previous Value**: {}\n  \
             - **New Value**: {}\n\n",
            local_time(event, format)?,
            event.field_name,
            event.action.title(),
            show(event.prev_value.as_ref()),
            show(event.new_value.as_ref()),
        );
    }
    Ok(out)
}

fn render_text(events: &[&ChangeEvent], format: &str) -> Result<String, ReportError> {
    let mut out = String::new();
    for event in events {
        let _ = writeln!(
            out,
            "Timestamp: {}, Field Name: {}, Action: {}, Previous Value: {}, New Value: {}",
            local_time(event, format)?,
            event.field_name,
            event.action.title(),
            show(event.prev_value.as_ref()),
            show(event.new_value.as_ref()),
        );
    }
    Ok(out)
}
