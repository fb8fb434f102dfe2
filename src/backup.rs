//! Snapshots of live field values.
//!
//! A backup is an `.xlsx` file with a `field_name | value` header, named
//! `<identifier>_<timestamp>.xlsx`. It has the same shape as an input
//! spreadsheet, so `revert` feeds it straight back through the engine.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use jiff::Zoned;
use tracing::debug;

use crate::report::{ReportError, format_timestamp};
use crate::sheet::{self, SheetError};

const HEADER: [&str; 2] = ["field_name", "value"];

/// Errors that can occur writing or locating backups.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Timestamp(#[from] ReportError),
}

/// Writes backups into a directory.
pub struct BackupWriter {
    dir: PathBuf,
    timestamp_format: String,
}

impl BackupWriter {
    pub fn new(dir: impl Into<PathBuf>, timestamp_format: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Save `(field, value)` rows and return the absolute path written.
    pub fn save(
        &self,
        rows: &[(String, Option<String>)],
        identifier: &str,
    ) -> Result<PathBuf, BackupError> {
        self.save_at(rows, identifier, &Zoned::now())
    }

    /// Like [`save`](Self::save), with the clock supplied.
    pub fn save_at(
        &self,
        rows: &[(String, Option<String>)],
        identifier: &str,
        now: &Zoned,
    ) -> Result<PathBuf, BackupError> {
        fs::create_dir_all(&self.dir)?;

        let stem = format!(
            "{}_{}",
            sanitize(identifier),
            format_timestamp(&self.timestamp_format, now)?
        );
        let path = self.unique_path(&stem);

        sheet::write_xlsx(&path, HEADER, rows)?;
        debug!(path = %path.display(), rows = rows.len(), "wrote backup");

        Ok(std::path::absolute(&path)?)
    }

    fn unique_path(&self, stem: &str) -> PathBuf {
        let candidate = self.dir.join(format!("{stem}.xlsx"));
        if !candidate.exists() {
            return candidate;
        }
        (1..)
            .map(|n| self.dir.join(format!("{stem}_{n}.xlsx")))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

/// The most recently modified `.xlsx` in `dir`, if any.
pub fn latest(dir: &Path) -> Result<Option<PathBuf>, BackupError> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut newest: Option<(SystemTime, Vec<NameChunk>, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_xlsx = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        if !is_xlsx || !path.is_file() {
            continue;
        }
        let modified = fs::metadata(&path)?.modified()?;
        // Ties go to the later name so same-second backups order by suffix.
        let key = natural_key(&path.file_name().unwrap_or_default().to_string_lossy());
        let newer = newest
            .as_ref()
            .is_none_or(|(time, best, _)| (modified, &key) > (*time, best));
        if newer {
            newest = Some((modified, key, path));
        }
    }
    Ok(newest.map(|(_, _, path)| path))
}

/// A run of digits or of other characters in a file name.
///
/// Digit runs compare by value, so `_9` sorts before `_10`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NameChunk {
    /// Significant digits, ordered by length then lexically.
    Number(usize, String),
    Text(String),
}

fn natural_key(name: &str) -> Vec<NameChunk> {
    let mut chunks = Vec::new();
    let mut rest = name;
    while let Some(first) = rest.chars().next() {
        let digits = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        chunks.push(if digits {
            let significant = run.trim_start_matches('0');
            NameChunk::Number(significant.len(), significant.to_string())
        } else {
            NameChunk::Text(run.to_string())
        });
        rest = tail;
    }
    chunks
}

/// Make an identifier safe to use in a file name.
///
/// Anything other than ASCII alphanumerics, `-`, and `_` becomes `_`.
/// An identifier with nothing usable falls back to `backup`.
pub fn sanitize(identifier: &str) -> String {
    let cleaned: String = identifier
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '_') {
        "backup".to_string()
    } else {
        cleaned
    }
}
