//! The staged-file pointer.
//!
//! Staging copies a spreadsheet into the staging area and remembers the
//! copy in config, so later commands can omit `--file`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::config::Config;

/// Copy `source` into `staging_dir` and point the config at the copy.
///
/// Returns the staged path.
pub fn stage(config: &mut Config, staging_dir: &Path, source: &Path) -> Result<PathBuf, String> {
    if !source.is_file() {
        return Err(format!("{} is not a file", source.display()));
    }
    let name = source
        .file_name()
        .ok_or_else(|| format!("{} has no file name", source.display()))?;

    fs::create_dir_all(staging_dir)
        .map_err(|e| format!("failed to create {}: {e}", staging_dir.display()))?;

    let staged = staging_dir.join(name);
    if is_same_file(source, &staged) {
        // Copying a file onto itself truncates it.
        debug!(path = %staged.display(), "already in the staging area");
    } else {
        fs::copy(source, &staged).map_err(|e| {
            format!(
                "failed to copy {} to {}: {e}",
                source.display(),
                staged.display()
            )
        })?;
    }

    config.vcs.staged_file = Some(staged.clone());
    config.save()?;
    info!(path = %staged.display(), "staged");

    Ok(staged)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Remove the staged copy and clear the pointer.
///
/// Returns `false` if nothing was staged.
pub fn unstage(config: &mut Config) -> Result<bool, String> {
    let Some(staged) = config.vcs.staged_file.take() else {
        return Ok(false);
    };

    if staged.exists() {
        fs::remove_file(&staged)
            .map_err(|e| format!("failed to remove {}: {e}", staged.display()))?;
    } else {
        debug!(path = %staged.display(), "staged copy already gone");
    }

    config.save()?;
    Ok(true)
}

/// The currently staged file, if any.
pub fn staged(config: &Config) -> Option<&Path> {
    config.vcs.staged_file.as_deref()
}

/// The input file for a command: `explicit` if given, else the staged file.
pub fn resolve_input(config: &Config, explicit: Option<&Path>) -> Result<PathBuf, String> {
    explicit
        .or_else(|| staged(config))
        .map(Path::to_path_buf)
        .ok_or_else(|| "no file given and nothing staged; pass --file or run `cosmo stage set`".to_string())
}
