//! `cosmo verify` and `cosmo diff`: read-only comparisons.

use std::path::Path;

use colored::Colorize;
use tracing::warn;

use crate::config::Config;
use crate::model::{Comparison, FieldRecord};
use crate::surface::LiveSurface;

use super::format::{fit, render_diff};
use super::{connect, load_records};

const FIELD_WIDTH: usize = 40;
const VALUE_WIDTH: usize = 30;

/// What a read-only comparison found.
#[derive(Debug, Default)]
struct Findings {
    matches: usize,
    missing: Vec<String>,
    mismatches: Vec<Mismatch>,
}

#[derive(Debug, PartialEq, Eq)]
struct Mismatch {
    field: String,
    sheet: String,
    page: String,
}

pub(super) fn cmd_verify(config: &Config, file: Option<&Path>) -> Result<(), String> {
    let records = load_records(config, file)?;
    let mut surface = connect(config)?;

    let findings = compare_all(&mut surface, &records, |record, comparison| match comparison {
        Comparison::Match { .. } => {
            println!("{}", format!("Match for field {}.", record.name).green());
        }
        Comparison::Missing => println!(
            "{}",
            format!("Field with name {} not found on the page!", record.name).red()
        ),
        Comparison::Empty { .. } | Comparison::Mismatch { .. } => {}
    });

    print_summary(&findings);
    Ok(())
}

pub(super) fn cmd_diff(config: &Config, file: Option<&Path>) -> Result<(), String> {
    let records = load_records(config, file)?;
    let mut surface = connect(config)?;

    let findings = compare_all(&mut surface, &records, |record, comparison| match comparison {
        Comparison::Empty { live } | Comparison::Mismatch { live } => {
            println!("{}", format!("Diff for field {}:", record.name).yellow());
            println!("{}", render_diff(&record.desired_value, live));
        }
        Comparison::Missing => println!(
            "{}",
            format!("Field with name {} not found on the page!", record.name).red()
        ),
        Comparison::Match { .. } => {}
    });

    if findings.mismatches.is_empty() {
        println!("{}", "No differences.".green());
    }
    Ok(())
}

/// Compare every row with the page, reporting each result as it comes.
///
/// Never mutates the surface. A failed lookup counts as missing.
fn compare_all(
    surface: &mut dyn LiveSurface,
    records: &[FieldRecord],
    mut on_result: impl FnMut(&FieldRecord, &Comparison),
) -> Findings {
    let mut findings = Findings::default();

    for record in records {
        let live = surface.lookup(&record.name).unwrap_or_else(|e| {
            warn!(field = %record.name, error = %e, "lookup failed; treating field as missing");
            None
        });
        let comparison = record.compare(live.as_deref());
        on_result(record, &comparison);

        match comparison {
            Comparison::Match { .. } => findings.matches += 1,
            Comparison::Missing => findings.missing.push(record.name.clone()),
            Comparison::Empty { live } | Comparison::Mismatch { live } => {
                findings.mismatches.push(Mismatch {
                    field: record.name.clone(),
                    sheet: record.desired_value.clone(),
                    page: live,
                });
            }
        }
    }

    findings
}

fn print_summary(findings: &Findings) {
    let bullet = " • ".yellow();
    println!();
    println!("{}", "Summary".bold().underline());
    println!("{bullet}{} {}", "Matching Lines:".italic().green(), findings.matches);
    println!(
        "{bullet}{} {}",
        "Missing Fields:".italic().yellow(),
        findings.missing.len()
    );
    println!(
        "{bullet}{} {}",
        "Mismatched Lines:".italic().red(),
        findings.mismatches.len()
    );

    if !findings.mismatches.is_empty() {
        println!();
        println!("{}", "Mismatched Lines".bold());
        println!(
            "{} {} {}",
            fit("Field", FIELD_WIDTH).bold(),
            fit("Spreadsheet Value", VALUE_WIDTH).bold(),
            "Page Value".bold()
        );
        for m in &findings.mismatches {
            println!(
                "{} {} {}",
                fit(&m.field, FIELD_WIDTH),
                fit(&m.sheet, VALUE_WIDTH),
                m.page
            );
        }
    }

    if !findings.missing.is_empty() {
        println!();
        println!("{}", "Missing Fields".bold());
        for field in &findings.missing {
            println!("- {field}");
        }
    }
}
