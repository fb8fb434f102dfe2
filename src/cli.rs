//! CLI interface for Cosmo.
//!
//! Every command that reads a spreadsheet takes `-f/--file` and falls back to
//! the staged file. Commands that touch the page connect to an already
//! running Chrome through its remote-debugging address.

mod backup;
mod fill;
mod format;
mod history;
mod prompt;
mod stage;
mod verify;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::model::{ChangeEvent, FieldRecord};
use crate::report::LogWriter;
use crate::storage::Storage;
use crate::surface::CdpSurface;
use crate::{sheet, staging};

use stage::StageCommand;

/// Cosmo: fill web forms from spreadsheet data.
#[derive(Debug, Parser)]
#[command(name = "cosmo", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow:
  1. Start Chrome with --remote-debugging-port=9222 and open the form.
  2. cosmo stage set --file ~/Documents/acme-form.xlsx
  3. cosmo verify            # compare page with spreadsheet, read only
  4. cosmo fill --backup     # fill, asking on every mismatch
  5. cosmo revert            # restore the latest backup if needed

The spreadsheet's first column names the field (its `name` attribute),
the second holds the value. The first row is a header.";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fill the page from a spreadsheet.
    ///
    /// Blank fields are filled. Mismatches are resolved by prompt unless
    /// `--cmd` says otherwise.
    Fill {
        #[command(flatten)]
        input: InputArg,

        /// Resolve every mismatch without prompting.
        #[arg(long, value_enum)]
        cmd: Option<FillMode>,

        /// Back up the page's current values first.
        #[arg(long)]
        backup: bool,
    },

    /// Compare the page with a spreadsheet without changing anything.
    Verify {
        #[command(flatten)]
        input: InputArg,
    },

    /// Show a character diff for every mismatched field.
    Diff {
        #[command(flatten)]
        input: InputArg,
    },

    /// Save the page's current values to a timestamped `.xlsx` file.
    Backup {
        #[command(flatten)]
        input: InputArg,

        /// Name for the backup file. Defaults to the record ID in the page title.
        #[arg(long)]
        id: Option<String>,
    },

    /// Restore the page from a backup. Defaults to the latest backup.
    Revert {
        /// Backup file to restore.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show every recorded change.
    History,

    /// Manage the staged spreadsheet.
    Stage {
        #[command(subcommand)]
        command: StageCommand,
    },
}

/// `-f/--file`, shared by the commands that read a spreadsheet.
#[derive(Debug, clap::Args)]
pub struct InputArg {
    /// Spreadsheet (`.xlsx` or `.csv`). Defaults to the staged file.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

/// Non-interactive fill modes.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FillMode {
    /// Show a character diff for each mismatch, then overwrite it.
    Diff,
    /// Overwrite every mismatch.
    Overwrite,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &mut Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fill { input, cmd, backup } => {
            fill::cmd_fill(config, storage, input.file.as_deref(), cmd, backup)
        }
        Command::Verify { input } => verify::cmd_verify(config, input.file.as_deref()),
        Command::Diff { input } => verify::cmd_diff(config, input.file.as_deref()),
        Command::Backup { input, id } => {
            backup::cmd_backup(config, input.file.as_deref(), id.as_deref())
        }
        Command::Revert { file } => backup::cmd_revert(config, storage, file.as_deref()),
        Command::History => history::cmd_history(storage),
        Command::Stage { command } => stage::run(config, storage, command),
    }
}

/// Resolve the input file and read its rows.
fn load_records(config: &Config, explicit: Option<&Path>) -> Result<Vec<FieldRecord>, String> {
    let path = staging::resolve_input(config, explicit)?;
    sheet::read_records(&path).map_err(|e| format!("failed to read {}: {e}", path.display()))
}

/// Connect to the browser named in config.
fn connect(config: &Config) -> Result<CdpSurface, String> {
    let address = &config.browser.debugger_address;
    CdpSurface::connect(address)
        .map_err(|e| format!("failed to connect to browser at {address}: {e}"))
}

/// Write the run logs for a pass.
///
/// History is written row by row during the pass; `unsaved` counts rows that
/// failed to reach it.
fn finish(config: &Config, events: &[ChangeEvent], unsaved: usize) -> Result<(), String> {
    let writer = LogWriter::new(config.logs_dir(), &config.logger.timestamp_format);
    let report = writer
        .write(events)
        .map_err(|e| format!("failed to write logs: {e}"))?;

    if report.skipped > 0 {
        eprintln!(
            "Left {} malformed entr{} out of the logs",
            report.skipped,
            if report.skipped == 1 { "y" } else { "ies" }
        );
    }
    if let Some(path) = report.paths.first() {
        eprintln!("Log written to {}", path.display());
    }
    if unsaved > 0 {
        return Err(format!("failed to record {unsaved} change(s) in history"));
    }
    Ok(())
}
