//! Output formatting for CLI display.

use colored::{ColoredString, Colorize};

use crate::model::{Action, ChangeEvent};
use crate::reconcile::{CharDiff, char_diff};

/// Color an action label by kind.
pub(super) fn styled_action(action: Action) -> ColoredString {
    let label = action.label();
    match action {
        Action::Matched => label.dimmed(),
        Action::Filled => label.cyan(),
        Action::Skipped => label.red(),
        Action::Appended => label.yellow(),
        Action::Overwrote => label.green(),
        Action::FieldNotFound => label.magenta(),
        Action::Unknown => label.white(),
    }
}

/// One console line describing what a pass did to a field.
pub(super) fn describe_event(event: &ChangeEvent) -> String {
    let name = event.field_name.yellow();
    let prev = event.prev_value.as_deref().unwrap_or_default();
    let new = event.new_value.as_deref().unwrap_or_default();
    match event.action {
        Action::Matched => format!("Field {name} already has the same value. Skipping..."),
        Action::Filled => format!(
            "{} {name} {} {}",
            "Filled".green(),
            "with".green(),
            new.cyan()
        ),
        Action::Skipped => format!("{} {name}", "Skipped".green()),
        Action::Appended => format!(
            "{} to {name}: '{}' is now '{}'",
            "Appended".truecolor(255, 215, 0),
            prev,
            new.magenta()
        ),
        Action::Overwrote => format!(
            "{} {name}: '{}' → '{}'",
            "Overwrote".green(),
            prev,
            new.cyan()
        ),
        Action::FieldNotFound => format!("{} {name} {}", "Field".red(), "not found on the page!".red()),
        Action::Unknown => format!(
            "{} {name} {}",
            "Could not update".red().bold(),
            "(see log for details)".red()
        ),
    }
}

/// Render a character diff: sheet characters red, page characters green.
pub(super) fn render_diff(sheet: &str, page: &str) -> String {
    let mut out = String::new();
    for part in char_diff(sheet, page) {
        match part {
            CharDiff::Same(c) => out.push(c),
            CharDiff::Differs { sheet, page } => {
                out.push_str(&sheet.to_string().red().to_string());
                out.push_str(&page.to_string().green().to_string());
            }
            CharDiff::SheetOnly(c) => out.push_str(&c.to_string().red().to_string()),
            CharDiff::PageOnly(c) => out.push_str(&c.to_string().green().to_string()),
        }
    }
    out
}

/// Pad or cut `s` to exactly `width` characters.
pub(super) fn fit(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count <= width {
        return format!("{s:<width$}");
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// `-` for an absent value.
pub(super) fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
