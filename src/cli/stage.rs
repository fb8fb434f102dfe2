//! Staging commands: set, show, unset.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::aliases::Aliases;
use crate::config::Config;
use crate::staging;
use crate::storage::Storage;

#[derive(Debug, Subcommand)]
pub enum StageCommand {
    /// Stage a spreadsheet, by path or by alias.
    ///
    /// Aliases come from `aliases.config` in the Cosmo home directory.
    Set {
        /// Folder alias.
        folder_alias: Option<String>,

        /// File alias within the folder.
        file_alias: Option<String>,

        /// Stage this file directly, ignoring aliases.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show the staged file.
    Show,

    /// Unstage the staged file.
    Unset,
}

pub(super) fn run(
    config: &mut Config,
    storage: &Storage,
    command: StageCommand,
) -> Result<(), String> {
    match command {
        StageCommand::Set {
            folder_alias,
            file_alias,
            file,
        } => {
            let source = match file {
                Some(path) => path,
                None => {
                    let aliases = Aliases::load(&storage.aliases_path())
                        .map_err(|e| format!("failed to load aliases: {e}"))?;
                    alias_target(&aliases, folder_alias.as_deref(), file_alias.as_deref())?
                }
            };
            cmd_set(config, &storage.staging_dir(), &source)
        }
        StageCommand::Show => {
            match staging::staged(config) {
                Some(path) => println!("Staged file: {}", path.display()),
                None => println!("No file currently staged."),
            }
            Ok(())
        }
        StageCommand::Unset => {
            if staging::unstage(config)? {
                println!("Staged file has been unstaged.");
            } else {
                println!("No file currently staged.");
            }
            Ok(())
        }
    }
}

fn cmd_set(config: &mut Config, staging_dir: &Path, source: &Path) -> Result<(), String> {
    if !source.exists() {
        return Err(format!("file not found at {}", source.display()));
    }
    let staged = staging::stage(config, staging_dir, source)?;
    println!("File {} has been staged.", source.display());
    eprintln!("Copied to {}", staged.display());
    Ok(())
}

/// The file a pair of aliases points at.
fn alias_target(
    aliases: &Aliases,
    folder: Option<&str>,
    file: Option<&str>,
) -> Result<PathBuf, String> {
    let folder = folder.ok_or("specify a folder alias and file alias, or --file")?;
    aliases
        .folder_path(folder)
        .ok_or_else(|| format!("folder alias '{folder}' not found"))?;
    let file = file.ok_or_else(|| format!("specify a file alias within '{folder}'"))?;
    aliases
        .file_path(folder, file)
        .ok_or_else(|| format!("file alias '{file}' not found in '{folder}'"))
}
