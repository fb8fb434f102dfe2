//! Cosmo configuration.
//!
//! Loaded from `<root>/config.toml`. Created with defaults if missing.
//! The staged-file pointer lives here too, so every command that omits
//! `--file` sees the same default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_TITLE_SELECTOR: &str = ".MuiTypography-h6";
const DEFAULT_DEBUGGER_ADDRESS: &str = "127.0.0.1:9222";

/// Cosmo configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub vcs: VcsConfig,

    /// Where this config was loaded from. Relative defaults resolve against its directory.
    #[serde(skip)]
    path: PathBuf,
}

/// Per-run change logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggerConfig {
    /// `strftime` format for log file names.
    pub timestamp_format: String,

    /// Defaults to `<root>/logs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_directory: Option<String>,
}

/// Snapshots of page values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackupConfig {
    /// `strftime` format for backup file names.
    pub timestamp_format: String,

    /// Defaults to `<root>/backups`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_directory: Option<String>,

    /// Spreadsheet whose first column lists the fields to back up.
    /// When unset, `backup` uses the input spreadsheet's field names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_file: Option<String>,

    /// CSS selector for the page heading that names the record being edited.
    pub title_selector: String,
}

/// Connection to the browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Chrome remote-debugging address.
    pub debugger_address: String,
}

/// The staged-file pointer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VcsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staged_file: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            logs_directory: None,
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            backup_directory: None,
            fields_file: None,
            title_selector: DEFAULT_TITLE_SELECTOR.to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debugger_address: DEFAULT_DEBUGGER_ADDRESS.to_string(),
        }
    }
}

impl Config {
    /// Load config from `path`, writing a default file first if none exists.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();

        if !path.exists() {
            let config = Self {
                path,
                ..Self::default()
            };
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let mut config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;
        config.path = path;

        Ok(config)
    }

    /// Write the config back to where it was loaded from.
    pub fn save(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize config: {e}"))?;
        fs::write(&self.path, contents)
            .map_err(|e| format!("failed to write {}: {e}", self.path.display()))
    }

    /// The config file path under a storage root.
    pub fn path_in(root: &Path) -> PathBuf {
        root.join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.resolve(self.logger.logs_directory.as_deref(), "logs")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.resolve(self.backup.backup_directory.as_deref(), "backups")
    }

    pub fn fields_file(&self) -> Option<PathBuf> {
        self.backup.fields_file.as_deref().map(expand_home)
    }

    /// A configured directory, or `fallback` next to the config file.
    fn resolve(&self, configured: Option<&str>, fallback: &str) -> PathBuf {
        match configured {
            Some(dir) => expand_home(dir),
            None => self
                .path
                .parent()
                .map_or_else(|| PathBuf::from(fallback), |root| root.join(fallback)),
        }
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
