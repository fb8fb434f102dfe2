//! The reconciliation loop.
//!
//! One pass walks the spreadsheet rows in order, compares each with the
//! live page, resolves mismatches, applies the result, and emits exactly one
//! [`ChangeEvent`] per row. Persistence is the caller's job: the pass returns
//! its events and the CLI hands them to the history store and the log writer.

use tracing::{debug, warn};

use crate::model::{ChangeEvent, Comparison, Decision, DecisionKind, FieldRecord};
use crate::surface::{LiveSurface, SurfaceError};

/// How mismatches are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Ask the decision source, honoring apply-to-all.
    #[default]
    Interactive,

    /// Overwrite every mismatch.
    Overwrite,

    /// Overwrite every mismatch, showing a character diff first.
    Diff,
}

/// A field whose page value differs from the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict<'a> {
    pub field: &'a str,
    pub live: &'a str,
    pub desired: &'a str,
}

/// Resolves mismatches during an interactive pass.
pub trait DecisionSource {
    fn decide(&mut self, conflict: &Conflict<'_>) -> Decision;
}

/// Receives progress from a pass.
pub trait Observer {
    /// A mismatch is about to be resolved.
    fn conflict(&mut self, _conflict: &Conflict<'_>, _mode: Mode) {}

    /// A row finished. `position` is 1-based.
    fn recorded(&mut self, event: &ChangeEvent, position: usize, total: usize);
}

/// A decision source for non-interactive passes. Always skips.
pub struct NoDecisions;

impl DecisionSource for NoDecisions {
    fn decide(&mut self, _conflict: &Conflict<'_>) -> Decision {
        Decision::once(DecisionKind::Skip)
    }
}

/// Drives one or more passes against a live surface.
pub struct Reconciler<'a> {
    surface: &'a mut dyn LiveSurface,
    decisions: &'a mut dyn DecisionSource,
    observer: &'a mut dyn Observer,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        surface: &'a mut dyn LiveSurface,
        decisions: &'a mut dyn DecisionSource,
        observer: &'a mut dyn Observer,
    ) -> Self {
        Self {
            surface,
            decisions,
            observer,
        }
    }

    /// Run one pass over `rows`.
    ///
    /// An apply-to-all decision lasts until the end of this pass.
    pub fn run(&mut self, rows: &[FieldRecord], mode: Mode) -> Vec<ChangeEvent> {
        let mut sticky: Option<DecisionKind> = None;
        let mut events = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            let event = self.reconcile(row, mode, &mut sticky);
            debug!(field = %event.field_name, action = event.action.label(), "reconciled");
            self.observer.recorded(&event, index + 1, rows.len());
            events.push(event);
        }

        events
    }

    fn reconcile(
        &mut self,
        row: &FieldRecord,
        mode: Mode,
        sticky: &mut Option<DecisionKind>,
    ) -> ChangeEvent {
        let name = row.name.as_str();
        let desired = row.desired_value.as_str();

        let live = match self.surface.lookup(name) {
            Ok(live) => live,
            Err(e) => {
                warn!(field = name, error = %e, "lookup failed; treating field as missing");
                None
            }
        };

        match row.compare(live.as_deref()) {
            Comparison::Missing => ChangeEvent::not_found(name, desired),
            Comparison::Match { live } => ChangeEvent::matched(name, &live),
            Comparison::Empty { live } => {
                self.mutate(name, &live, |s| s.set(name, desired), || {
                    ChangeEvent::filled(name, &live, desired)
                })
            }
            Comparison::Mismatch { live } => {
                let conflict = Conflict {
                    field: name,
                    live: &live,
                    desired,
                };
                self.observer.conflict(&conflict, mode);
                let kind = match mode {
                    Mode::Overwrite | Mode::Diff => DecisionKind::Overwrite,
                    Mode::Interactive => match *sticky {
                        Some(kind) => kind,
                        None => {
                            let decision = self.decisions.decide(&conflict);
                            if decision.apply_to_all {
                                *sticky = Some(decision.kind);
                            }
                            decision.kind
                        }
                    },
                };
                self.apply(name, &live, desired, kind)
            }
        }
    }

    fn apply(&mut self, name: &str, live: &str, desired: &str, kind: DecisionKind) -> ChangeEvent {
        match kind {
            DecisionKind::Skip => ChangeEvent::skipped(name, live),
            DecisionKind::Append => self.mutate(
                name,
                live,
                |s| s.append(name, desired),
                || ChangeEvent::appended(name, live, desired),
            ),
            DecisionKind::Overwrite => self.mutate(
                name,
                live,
                |s| {
                    s.clear(name)?;
                    s.set(name, desired)
                },
                || ChangeEvent::overwrote(name, live, desired),
            ),
        }
    }

    /// Apply a mutation. A failure becomes an `Unknown` event.
    fn mutate(
        &mut self,
        name: &str,
        live: &str,
        op: impl FnOnce(&mut dyn LiveSurface) -> Result<(), SurfaceError>,
        done: impl FnOnce() -> ChangeEvent,
    ) -> ChangeEvent {
        match op(&mut *self.surface) {
            Ok(()) => done(),
            Err(e) => {
                warn!(field = name, error = %e, "update failed; outcome unknown");
                ChangeEvent::unknown(name, Some(live))
            }
        }
    }
}

/// One position in a character comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharDiff {
    Same(char),
    Differs { sheet: char, page: char },
    SheetOnly(char),
    PageOnly(char),
}

/// Compare two values character by character, position for position.
///
/// The longer value's tail shows up as `SheetOnly` or `PageOnly`.
pub fn char_diff(sheet: &str, page: &str) -> Vec<CharDiff> {
    let mut sheet = sheet.chars();
    let mut page = page.chars();
    let mut out = Vec::new();
    loop {
        let next = match (sheet.next(), page.next()) {
            (None, None) => break,
            (Some(a), Some(b)) if a == b => CharDiff::Same(a),
            (Some(a), Some(b)) => CharDiff::Differs { sheet: a, page: b },
            (Some(a), None) => CharDiff::SheetOnly(a),
            (None, Some(b)) => CharDiff::PageOnly(b),
        };
        out.push(next);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use crate::model::Action;
    use crate::surface::{MemorySurface, Mutation};

    /// Hands out decisions in order. Skips once the script runs out.
    #[derive(Default)]
    struct Scripted {
        decisions: VecDeque<Decision>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
            Self {
                decisions: decisions.into_iter().collect(),
                asked: Vec::new(),
            }
        }
    }

    impl DecisionSource for Scripted {
        fn decide(&mut self, conflict: &Conflict<'_>) -> Decision {
            self.asked.push(conflict.field.to_string());
            self.decisions
                .pop_front()
                .unwrap_or(Decision::once(DecisionKind::Skip))
        }
    }

    #[derive(Default)]
    struct Recorder {
        progress: Vec<(usize, usize)>,
        conflicts: Vec<String>,
    }

    impl Observer for Recorder {
        fn conflict(&mut self, conflict: &Conflict<'_>, _mode: Mode) {
            self.conflicts.push(conflict.field.to_string());
        }

        fn recorded(&mut self, _event: &ChangeEvent, position: usize, total: usize) {
            self.progress.push((position, total));
        }
    }

    fn rows(pairs: &[(&str, &str)]) -> Vec<FieldRecord> {
        pairs.iter().map(|(n, v)| FieldRecord::new(*n, *v)).collect()
    }

    fn run(
        surface: &mut MemorySurface,
        decisions: &mut Scripted,
        rows: &[FieldRecord],
        mode: Mode,
    ) -> Vec<ChangeEvent> {
        let mut observer = Recorder::default();
        Reconciler::new(surface, decisions, &mut observer).run(rows, mode)
    }

    fn actions(events: &[ChangeEvent]) -> Vec<Action> {
        events.iter().map(|e| e.action).collect()
    }

    #[test]
    fn one_event_per_row_in_order() {
        let mut surface = MemorySurface::new([("a", "1"), ("b", ""), ("c", "x")]);
        let mut decisions = Scripted::default();
        let input = rows(&[("c", "y"), ("missing", "m"), ("a", "1"), ("b", "2")]);

        let mut observer = Recorder::default();
        let events = Reconciler::new(&mut surface, &mut decisions, &mut observer)
            .run(&input, Mode::Interactive);

        let names: Vec<&str> = events.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, ["c", "missing", "a", "b"]);
        assert_eq!(
            actions(&events),
            [Action::Skipped, Action::FieldNotFound, Action::Matched, Action::Filled]
        );
        assert_eq!(observer.progress, [(1, 4), (2, 4), (3, 4), (4, 4)]);
        assert!(events.iter().all(ChangeEvent::is_well_formed));
    }

    #[test]
    fn matching_field_is_untouched() {
        let mut surface = MemorySurface::new([("a", "1")]);
        let mut decisions = Scripted::default();

        let events = run(&mut surface, &mut decisions, &rows(&[("a", "1")]), Mode::Interactive);

        assert_eq!(events[0].action, Action::Matched);
        assert_eq!(events[0].prev_value.as_deref(), Some("1"));
        assert!(surface.mutations.is_empty());
        assert!(decisions.asked.is_empty());
    }

    #[test]
    fn blank_field_is_filled_without_asking() {
        let mut surface = MemorySurface::new([("b", "  ")]);
        let mut decisions = Scripted::default();

        let events = run(&mut surface, &mut decisions, &rows(&[("b", "2")]), Mode::Interactive);

        assert_eq!(events[0].action, Action::Filled);
        assert_eq!(events[0].prev_value.as_deref(), Some("  "));
        assert_eq!(events[0].new_value.as_deref(), Some("2"));
        assert_eq!(surface.value("b"), Some("2"));
        assert!(decisions.asked.is_empty());
    }

    #[test]
    fn append_concatenates_live_and_desired() {
        let mut surface = MemorySurface::new([("notes", "abc")]);
        let mut decisions = Scripted::new([Decision::once(DecisionKind::Append)]);

        let events = run(
            &mut surface,
            &mut decisions,
            &rows(&[("notes", "def")]),
            Mode::Interactive,
        );

        assert_eq!(events[0].action, Action::Appended);
        assert_eq!(events[0].new_value.as_deref(), Some("abcdef"));
        assert_eq!(surface.value("notes"), Some("abcdef"));
    }

    #[test]
    fn overwrite_clears_then_sets() {
        let mut surface = MemorySurface::new([("city", "Bergen")]);
        let mut decisions = Scripted::new([Decision::once(DecisionKind::Overwrite)]);

        let events = run(
            &mut surface,
            &mut decisions,
            &rows(&[("city", "Oslo")]),
            Mode::Interactive,
        );

        assert_eq!(events[0].action, Action::Overwrote);
        assert_eq!(events[0].prev_value.as_deref(), Some("Bergen"));
        assert_eq!(surface.value("city"), Some("Oslo"));
        assert_eq!(
            surface.mutations,
            [
                Mutation::Clear { name: "city".into() },
                Mutation::Set {
                    name: "city".into(),
                    value: "Oslo".into()
                },
            ]
        );
    }

    #[test]
    fn skip_leaves_page_alone() {
        let mut surface = MemorySurface::new([("city", "Bergen")]);
        let mut decisions = Scripted::new([Decision::once(DecisionKind::Skip)]);

        let events = run(
            &mut surface,
            &mut decisions,
            &rows(&[("city", "Oslo")]),
            Mode::Interactive,
        );

        assert_eq!(events[0].action, Action::Skipped);
        assert_eq!(events[0].new_value, None);
        assert_eq!(surface.value("city"), Some("Bergen"));
        assert!(surface.mutations.is_empty());
    }

    #[test]
    fn apply_to_all_covers_rest_of_pass() {
        let mut surface = MemorySurface::new([("a", "x"), ("b", "y"), ("c", "z")]);
        let mut decisions = Scripted::new([
            Decision::once(DecisionKind::Skip),
            Decision::for_all(DecisionKind::Overwrite),
        ]);
        let input = rows(&[("a", "1"), ("b", "2"), ("c", "3")]);

        let events = run(&mut surface, &mut decisions, &input, Mode::Interactive);

        assert_eq!(
            actions(&events),
            [Action::Skipped, Action::Overwrote, Action::Overwrote]
        );
        assert_eq!(decisions.asked, ["a", "b"]);
    }

    #[test]
    fn apply_to_all_resets_between_passes() {
        let mut surface = MemorySurface::new([("a", "x"), ("b", "y")]);
        let mut decisions = Scripted::new([
            Decision::for_all(DecisionKind::Skip),
            Decision::once(DecisionKind::Append),
        ]);
        let mut observer = Recorder::default();
        let mut reconciler = Reconciler::new(&mut surface, &mut decisions, &mut observer);

        let first = reconciler.run(&rows(&[("a", "1"), ("b", "2")]), Mode::Interactive);
        let second = reconciler.run(&rows(&[("a", "1")]), Mode::Interactive);

        assert_eq!(actions(&first), [Action::Skipped, Action::Skipped]);
        assert_eq!(actions(&second), [Action::Appended]);
        assert_eq!(decisions.asked, ["a", "a"]);
    }

    #[test]
    fn overwrite_mode_never_asks() {
        let mut surface = MemorySurface::new([("a", "1"), ("b", "")]);
        let mut decisions = Scripted::default();
        let input = rows(&[("a", "2"), ("b", "3")]);

        let mut observer = Recorder::default();
        let events = Reconciler::new(&mut surface, &mut decisions, &mut observer)
            .run(&input, Mode::Overwrite);

        assert_eq!(actions(&events), [Action::Overwrote, Action::Filled]);
        assert_eq!(surface.value("a"), Some("2"));
        assert_eq!(surface.value("b"), Some("3"));
        assert!(decisions.asked.is_empty());
        assert_eq!(observer.conflicts, ["a"]);
    }

    #[test]
    fn revert_scenario_restores_backup_values() {
        // The page after a fill; the backup holds the values from before it.
        let mut surface = MemorySurface::new([("a", "2"), ("b", "3")]);
        let mut decisions = Scripted::default();
        let backup = rows(&[("a", "1"), ("b", "")]);

        let events = run(&mut surface, &mut decisions, &backup, Mode::Overwrite);

        assert_eq!(actions(&events), [Action::Overwrote, Action::Overwrote]);
        assert_eq!(surface.value("a"), Some("1"));
        assert_eq!(surface.value("b"), Some(""));
        assert_eq!(events[1].prev_value.as_deref(), Some("3"));
        assert_eq!(events[1].new_value.as_deref(), Some(""));
    }

    #[test]
    fn chosen_overwrite_can_blank_a_field() {
        let mut surface = MemorySurface::new([("a", "1"), ("b", "2")]);
        let mut decisions = Scripted::new([Decision::once(DecisionKind::Overwrite)]);
        let input = rows(&[("a", "1"), ("b", "")]);

        let events = run(&mut surface, &mut decisions, &input, Mode::Interactive);

        assert_eq!(actions(&events), [Action::Matched, Action::Overwrote]);
        assert_eq!(decisions.asked, ["b"]);
        assert_eq!(surface.value("a"), Some("1"));
        assert_eq!(surface.value("b"), Some(""));
        assert_eq!(events[1].prev_value.as_deref(), Some("2"));
        assert_eq!(events[1].new_value.as_deref(), Some(""));
    }

    #[test]
    fn diff_mode_overwrites_after_showing_conflict() {
        let mut surface = MemorySurface::new([("a", "abc")]);
        let mut decisions = Scripted::default();
        let mut observer = Recorder::default();

        let events = Reconciler::new(&mut surface, &mut decisions, &mut observer)
            .run(&rows(&[("a", "abd")]), Mode::Diff);

        assert_eq!(events[0].action, Action::Overwrote);
        assert_eq!(observer.conflicts, ["a"]);
        assert!(decisions.asked.is_empty());
    }

    #[test]
    fn missing_field_is_recorded_and_pass_continues() {
        let mut surface = MemorySurface::new([("b", "")]);
        let mut decisions = Scripted::default();

        let events = run(
            &mut surface,
            &mut decisions,
            &rows(&[("a", "1"), ("b", "2")]),
            Mode::Interactive,
        );

        assert_eq!(events[0].action, Action::FieldNotFound);
        assert_eq!(events[0].prev_value, None);
        assert_eq!(events[0].new_value.as_deref(), Some("1"));
        assert_eq!(events[1].action, Action::Filled);
    }

    #[test]
    fn lookup_failure_counts_as_missing() {
        let mut surface = MemorySurface::new([("a", "x"), ("b", "")]);
        surface.drop_lookups("a");
        let mut decisions = Scripted::default();

        let events = run(
            &mut surface,
            &mut decisions,
            &rows(&[("a", "1"), ("b", "2")]),
            Mode::Overwrite,
        );

        assert_eq!(actions(&events), [Action::FieldNotFound, Action::Filled]);
        assert_eq!(surface.value("a"), Some("x"));
    }

    #[test]
    fn failed_update_is_unknown_and_pass_continues() {
        let mut surface = MemorySurface::new([("a", "x"), ("b", "y")]);
        surface.break_field("a");
        let mut decisions = Scripted::default();

        let events = run(
            &mut surface,
            &mut decisions,
            &rows(&[("a", "1"), ("b", "2")]),
            Mode::Overwrite,
        );

        assert_eq!(actions(&events), [Action::Unknown, Action::Overwrote]);
        assert_eq!(events[0].prev_value.as_deref(), Some("x"));
        assert_eq!(events[0].new_value, None);
        assert_eq!(surface.value("b"), Some("2"));
    }

    #[test]
    fn no_decisions_skips() {
        let conflict = Conflict {
            field: "a",
            live: "x",
            desired: "y",
        };
        assert_eq!(
            NoDecisions.decide(&conflict),
            Decision::once(DecisionKind::Skip)
        );
    }

    #[test]
    fn char_diff_marks_changes_and_tail() {
        assert_eq!(
            char_diff("abcd", "axc"),
            [
                CharDiff::Same('a'),
                CharDiff::Differs {
                    sheet: 'b',
                    page: 'x'
                },
                CharDiff::Same('c'),
                CharDiff::SheetOnly('d'),
            ]
        );
        assert_eq!(char_diff("", "z"), [CharDiff::PageOnly('z')]);
        assert!(char_diff("", "").is_empty());
    }
}
