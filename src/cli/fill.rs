//! `cosmo fill`.

use std::io;
use std::path::Path;

use colored::Colorize;

use crate::config::Config;
use crate::reconcile::{Mode, Reconciler};
use crate::storage::Storage;

use super::backup::snapshot;
use super::prompt::{Progress, Prompt};
use super::{FillMode, connect, finish, load_records};

pub(super) fn cmd_fill(
    config: &Config,
    storage: &Storage,
    file: Option<&Path>,
    cmd: Option<FillMode>,
    backup: bool,
) -> Result<(), String> {
    let records = load_records(config, file)?;
    let mut surface = connect(config)?;

    if backup {
        let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
        let path = snapshot(config, &mut surface, &names, None)?;
        println!("{}", format!("Backup saved to {}", path.display()).yellow());
    }

    let mode = match cmd {
        None => Mode::Interactive,
        Some(FillMode::Diff) => Mode::Diff,
        Some(FillMode::Overwrite) => Mode::Overwrite,
    };

    let stdin = io::stdin();
    let mut prompt = Prompt::new(stdin.lock(), io::stdout());
    let mut progress = Progress::new(storage);
    let events = Reconciler::new(&mut surface, &mut prompt, &mut progress).run(&records, mode);

    finish(config, &events, progress.unsaved)?;
    println!("Form filling completed!");
    Ok(())
}
