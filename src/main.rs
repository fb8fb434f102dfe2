mod aliases;
mod backup;
mod cli;
mod config;
mod model;
mod reconcile;
mod report;
mod sheet;
mod staging;
mod storage;
mod surface;

use std::{io, process};

use tracing_subscriber::EnvFilter;

use config::Config;
use storage::Storage;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("COSMO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let root = Storage::default_root().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let storage = match Storage::new(&root) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    let mut config = match Config::load(Config::path_in(&root)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&mut config, &storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
