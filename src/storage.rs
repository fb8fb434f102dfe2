//! Local persistence for Cosmo.
//!
//! Everything lives under one root directory:
//!
//! ```text
//! <root>/
//!   config.toml          # Settings and the staged-file pointer
//!   aliases.config       # Folder and file aliases for `stage set`
//!   database/history.db  # Append-only change history (SQLite)
//!   staging/             # Copies of staged spreadsheets
//! ```
//!
//! Backup and log directories are configurable and may live elsewhere.

mod history;

use std::{env, fs, io, path::PathBuf};

use rusqlite::Connection;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt data: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Local storage rooted at a single directory.
pub struct Storage {
    root: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Opens storage rooted at the given directory.
    ///
    /// The directory and the history database are created if they don't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let db_dir = root.join("database");
        fs::create_dir_all(&db_dir)?;
        let conn = Connection::open(db_dir.join("history.db"))?;
        history::init_schema(&conn)?;
        Ok(Self { root, conn })
    }

    /// Returns the default storage root.
    ///
    /// `$COSMO_HOME` when set, otherwise `~/.config/cosmo/`.
    pub fn default_root() -> Option<PathBuf> {
        if let Ok(home) = env::var("COSMO_HOME")
            && !home.is_empty()
        {
            return Some(PathBuf::from(home));
        }
        dirs::home_dir().map(|h| h.join(".config").join("cosmo"))
    }

    /// Where staged spreadsheets are copied to.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// The alias definition file consulted by `stage set`.
    pub fn aliases_path(&self) -> PathBuf {
        self.root.join("aliases.config")
    }
}
