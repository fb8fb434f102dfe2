//! Console side of a pass: the mismatch prompt, progress output, and history.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use tracing::warn;

use crate::model::{ChangeEvent, Decision, DecisionKind};
use crate::reconcile::{Conflict, DecisionSource, Mode, Observer};
use crate::storage::Storage;

use super::format::{describe_event, render_diff};

/// Asks the user how to resolve each mismatch.
///
/// Unrecognized answers are asked again. End of input skips.
pub(super) struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub(super) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn show(&mut self, conflict: &Conflict<'_>) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{}",
            format!(" WARNING: Mismatch in field {} ", conflict.field)
                .red()
                .reversed()
        )?;
        writeln!(self.output)?;
        writeln!(self.output, "{}", format!("Webpage value: {}", conflict.live).red())?;
        writeln!(
            self.output,
            "{}",
            format!("Spreadsheet value: {}", conflict.desired).yellow()
        )?;
        writeln!(self.output)?;
        writeln!(self.output, "Choose an action:")?;
        writeln!(self.output, " - {} = skip", "s".blue())?;
        writeln!(self.output, " - {} = append", "a".yellow())?;
        writeln!(self.output, " - {} = overwrite", "o".magenta())?;
        writeln!(
            self.output,
            " - Add {} to any option to apply to all (ex: \"{} {}\" to overwrite all.)",
            "all".bright_blue(),
            "o".magenta(),
            "all".bright_blue()
        )
    }

    fn note(&mut self, message: &dyn std::fmt::Display) {
        if let Err(e) = writeln!(self.output, "{message}") {
            warn!(error = %e, "failed to write to console");
        }
    }

    /// Read one line. `None` at end of input.
    fn read_answer(&mut self) -> Option<String> {
        if let Err(e) = write!(self.output, "> ").and_then(|()| self.output.flush()) {
            warn!(error = %e, "failed to write to console");
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                warn!(error = %e, "failed to read answer");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> DecisionSource for Prompt<R, W> {
    fn decide(&mut self, conflict: &Conflict<'_>) -> Decision {
        if let Err(e) = self.show(conflict) {
            warn!(error = %e, "failed to show prompt");
        }
        loop {
            let Some(answer) = self.read_answer() else {
                self.note(&"No input; skipping.".dimmed());
                return Decision::once(DecisionKind::Skip);
            };
            match answer.parse::<Decision>() {
                Ok(decision) => return decision,
                Err(e) => self.note(&e.to_string().red()),
            }
        }
    }
}

/// Prints each row's outcome with a running count and records it in history.
pub(super) struct Progress<'a> {
    storage: &'a Storage,

    /// Events that could not be written to history.
    pub(super) unsaved: usize,
}

impl<'a> Progress<'a> {
    pub(super) fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            unsaved: 0,
        }
    }
}

impl Observer for Progress<'_> {
    fn conflict(&mut self, conflict: &Conflict<'_>, mode: Mode) {
        if mode == Mode::Diff {
            println!("{}", format!("Diff for field {}:", conflict.field).yellow());
            println!("{}", render_diff(conflict.desired, conflict.live));
        }
    }

    fn recorded(&mut self, event: &ChangeEvent, position: usize, total: usize) {
        let counter = format!("[{position}/{total}]").cyan();
        println!("{counter} {}", describe_event(event));

        if let Err(e) = self.storage.append_event(event) {
            warn!(field = %event.field_name, error = %e, "failed to record history");
            self.unsaved += 1;
        }
    }
}
