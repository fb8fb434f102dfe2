//! History storage: append and list change events.
//!
//! The table is append-only. Rows are read back in insertion order.

use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use rusqlite::{Connection, params};

use crate::model::{Action, ChangeEvent};

use super::{Result, Storage, StorageError};

/// Creates the history table if it doesn't exist.
pub(super) fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS history_entries (
             id         INTEGER PRIMARY KEY AUTOINCREMENT,
             timestamp  TEXT NOT NULL,
             field_name TEXT NOT NULL,
             action     TEXT NOT NULL,
             old_value  TEXT,
             new_value  TEXT
         )",
    )?;
    Ok(())
}

const INSERT: &str = "INSERT INTO history_entries (timestamp, field_name, action, old_value, new_value)
                      VALUES (?1, ?2, ?3, ?4, ?5)";

impl Storage {
    /// Appends a change event to the history.
    ///
    /// Called once per row as a pass runs, so an interrupted pass still
    /// leaves a record of what it changed.
    pub fn append_event(&self, event: &ChangeEvent) -> Result<()> {
        self.conn.prepare_cached(INSERT)?.execute(params![
            event.timestamp.to_string(),
            &event.field_name,
            event.action.label(),
            &event.prev_value,
            &event.new_value,
        ])?;
        Ok(())
    }

    /// Lists every recorded event, oldest first.
    ///
    /// Ordered by `rowid` so tables created without the `id` column read too.
    pub fn list_events(&self) -> Result<Vec<ChangeEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, field_name, action, old_value, new_value
             FROM history_entries ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (timestamp, field_name, action, prev_value, new_value) = row?;
            let timestamp = parse_timestamp(&timestamp)?;
            events.push(ChangeEvent {
                timestamp,
                field_name,
                action: Action::from_label(&action),
                prev_value,
                new_value,
            });
        }
        Ok(events)
    }
}

/// Parses a stored timestamp.
///
/// Older databases stored naive local times (`2024-01-02T03:04:05.123456`);
/// those are read in the system time zone.
fn parse_timestamp(s: &str) -> Result<Timestamp> {
    if let Ok(ts) = s.parse::<Timestamp>() {
        return Ok(ts);
    }
    let civil = s
        .parse::<DateTime>()
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp '{s}': {e}")))?;
    civil
        .to_zoned(TimeZone::system())
        .map(|z| z.timestamp())
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("cosmo")).unwrap();
        (dir, storage)
    }

    #[test]
    fn list_events_empty() {
        let (_dir, storage) = test_storage();
        assert!(storage.list_events().unwrap().is_empty());
    }

    #[test]
    fn append_and_list_in_order() {
        let (_dir, storage) = test_storage();

        for event in [
            ChangeEvent::filled("city", "", "Oslo"),
            ChangeEvent::skipped("zip", "0150"),
            ChangeEvent::not_found("phone", "555"),
        ] {
            storage.append_event(&event).unwrap();
        }

        let events = storage.list_events().unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, ["city", "zip", "phone"]);
        assert_eq!(events[0].action, Action::Filled);
        assert_eq!(events[0].new_value.as_deref(), Some("Oslo"));
        assert_eq!(events[1].new_value, None);
        assert_eq!(events[2].prev_value, None);
    }

    #[test]
    fn events_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("cosmo");

        {
            let storage = Storage::new(&root).unwrap();
            storage
                .append_event(&ChangeEvent::overwrote("city", "Bergen", "Oslo"))
                .unwrap();
        }

        let storage = Storage::new(&root).unwrap();
        let events = storage.list_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, Action::Overwrote);
    }

    #[test]
    fn timestamps_round_trip() {
        let (_dir, storage) = test_storage();
        let event = ChangeEvent::matched("city", "Oslo");
        storage.append_event(&event).unwrap();

        let loaded = storage.list_events().unwrap();
        assert_eq!(loaded[0].timestamp, event.timestamp);
    }

    #[test]
    fn legacy_rows_load() {
        let (_dir, storage) = test_storage();
        storage
            .conn
            .execute(
                INSERT,
                params!["2024-01-02T03:04:05Z", "city", "overwrite", "a", "b"],
            )
            .unwrap();
        storage
            .conn
            .execute(
                INSERT,
                params!["2024-01-02T03:04:06Z", "zip", "Modified", "a", "b"],
            )
            .unwrap();

        let events = storage.list_events().unwrap();
        assert_eq!(events[0].action, Action::Overwrote);
        assert_eq!(events[1].action, Action::Unknown);
    }

    #[test]
    fn naive_timestamps_load() {
        let (_dir, storage) = test_storage();
        storage
            .conn
            .execute(
                INSERT,
                params!["2024-01-02T03:04:05.123456", "city", "skip", "a", None::<String>],
            )
            .unwrap();

        let events = storage.list_events().unwrap();
        assert_eq!(events[0].action, Action::Skipped);
        assert_eq!(events[0].new_value, None);
    }

    #[test]
    fn tables_without_id_column_load() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("cosmo");
        std::fs::create_dir_all(root.join("database")).unwrap();
        {
            let conn = Connection::open(root.join("database").join("history.db")).unwrap();
            conn.execute_batch(
                "CREATE TABLE history_entries (
                     timestamp TEXT,
                     field_name TEXT,
                     action TEXT,
                     old_value TEXT,
                     new_value TEXT
                 )",
            )
            .unwrap();
            conn.execute(INSERT, params!["2024-01-02T03:04:05.5", "city", "append", "a", "ab"])
                .unwrap();
        }

        let storage = Storage::new(&root).unwrap();
        storage
            .append_event(&ChangeEvent::filled("zip", "", "0150"))
            .unwrap();

        let events = storage.list_events().unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, ["city", "zip"]);
        assert_eq!(events[0].action, Action::Appended);
    }

    #[test]
    fn corrupt_timestamp_is_reported() {
        let (_dir, storage) = test_storage();
        storage
            .conn
            .execute(INSERT, params!["yesterday", "city", "filled", "", "x"])
            .unwrap();

        let err = storage.list_events().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
