//! `cosmo backup` and `cosmo revert`.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::warn;

use crate::backup::{self, BackupWriter};
use crate::config::Config;
use crate::reconcile::{Mode, NoDecisions, Reconciler};
use crate::sheet;
use crate::storage::Storage;
use crate::surface::{CdpSurface, LiveSurface};

use super::prompt::Progress;
use super::{connect, finish};

const FALLBACK_ID: &str = "backup";

pub(super) fn cmd_backup(
    config: &Config,
    file: Option<&Path>,
    id: Option<&str>,
) -> Result<(), String> {
    let names = field_names(config, file)?;
    let mut surface = connect(config)?;

    let path = snapshot(config, &mut surface, &names, id)?;
    println!("{}", format!("Backup saved to {}", path.display()).yellow());
    Ok(())
}

pub(super) fn cmd_revert(
    config: &Config,
    storage: &Storage,
    file: Option<&Path>,
) -> Result<(), String> {
    let path = match file {
        Some(path) => path.to_path_buf(),
        None => backup::latest(&config.backup_dir())
            .map_err(|e| format!("failed to look for backups: {e}"))?
            .ok_or_else(|| {
                format!(
                    "no backup found to revert to in {}",
                    config.backup_dir().display()
                )
            })?,
    };

    let records = sheet::read_records(&path)
        .map_err(|e| format!("failed to read backup {}: {e}", path.display()))?;
    let mut surface = connect(config)?;

    eprintln!("Reverting from {}", path.display());
    let mut progress = Progress::new(storage);
    let events = Reconciler::new(&mut surface, &mut NoDecisions, &mut progress)
        .run(&records, Mode::Overwrite);

    finish(config, &events, progress.unsaved)?;
    println!("Reverted to the previous state.");
    Ok(())
}

/// Fields to back up: the configured fields file, else the input spreadsheet.
fn field_names(config: &Config, file: Option<&Path>) -> Result<Vec<String>, String> {
    let path = match config.fields_file() {
        Some(path) => path,
        None => crate::staging::resolve_input(config, file)?,
    };
    sheet::read_field_names(&path).map_err(|e| format!("failed to read {}: {e}", path.display()))
}

/// Read `names` from the page and save them as a backup.
///
/// Without an explicit `id` the record ID is taken from the page title.
pub(super) fn snapshot(
    config: &Config,
    surface: &mut CdpSurface,
    names: &[String],
    id: Option<&str>,
) -> Result<PathBuf, String> {
    let identifier = match id {
        Some(id) => id.to_string(),
        None => title_id(surface, &config.backup.title_selector),
    };

    let rows = read_values(surface, names);

    BackupWriter::new(config.backup_dir(), &config.backup.timestamp_format)
        .save(&rows, &identifier)
        .map_err(|e| format!("failed to save backup: {e}"))
}

/// Current page values. Missing or unreadable fields back up as empty.
fn read_values(surface: &mut dyn LiveSurface, names: &[String]) -> Vec<(String, Option<String>)> {
    names
        .iter()
        .map(|name| {
            let value = surface.lookup(name).unwrap_or_else(|e| {
                warn!(field = %name, error = %e, "failed to read field for backup");
                None
            });
            (name.clone(), value)
        })
        .collect()
}

/// The record ID in a heading like "Translations for 1234 Acme".
fn title_id(surface: &mut CdpSurface, selector: &str) -> String {
    match surface.text_of(selector) {
        Ok(Some(title)) => id_from_title(&title),
        Ok(None) => FALLBACK_ID.to_string(),
        Err(e) => {
            warn!(selector, error = %e, "failed to read page title");
            FALLBACK_ID.to_string()
        }
    }
}

fn id_from_title(title: &str) -> String {
    title
        .split_whitespace()
        .nth(2)
        .unwrap_or(FALLBACK_ID)
        .to_string()
}
