//! `cosmo history`.

use colored::Colorize;
use jiff::tz::TimeZone;

use crate::report::format_timestamp;
use crate::storage::Storage;

use super::format::{fit, or_dash, styled_action};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(super) fn cmd_history(storage: &Storage) -> Result<(), String> {
    let events = storage
        .list_events()
        .map_err(|e| format!("failed to load history: {e}"))?;

    if events.is_empty() {
        println!("No history");
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{} {} {} {} {}",
            fit("Timestamp", 19),
            fit("Field Name", 25),
            fit("Action", 15),
            fit("Old Value", 30),
            "New Value"
        )
        .bold()
        .magenta()
    );

    for event in &events {
        let local = event.timestamp.to_zoned(TimeZone::system());
        let when = format_timestamp(TIME_FORMAT, &local)
            .map_err(|e| format!("failed to format timestamp: {e}"))?;
        // Pad before coloring so escape codes don't count toward the width.
        let action = styled_action(event.action);
        let padding = " ".repeat(15usize.saturating_sub(event.action.label().len()));
        println!(
            "{} {} {action}{padding} {} {}",
            when.dimmed(),
            fit(&event.field_name, 25),
            fit(or_dash(event.prev_value.as_deref()), 30),
            or_dash(event.new_value.as_deref())
        );
    }

    Ok(())
}
