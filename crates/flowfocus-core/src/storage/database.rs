//! SQLite-backed task and snapshot storage.
//!
//! Provides persistent storage for:
//! - Tasks, scoped by owner
//! - Daily availability snapshots, one per (owner, day)

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::migrations;
use crate::error::{CoreError, DatabaseError, Result};
use crate::snapshot::{decode_events, encode_events, DailySnapshot};
use crate::task::{Priority, Task};

const TASK_COLUMNS: &str = "id, owner, title, description, duration_minutes, priority, completed, completed_at, created_at";

/// Parse an RFC 3339 column, surfacing failures as conversion errors.
fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

/// Build a Task from a row selected with `TASK_COLUMNS`.
fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let priority: String = row.get(5)?;
    let completed_at: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok(Task {
        id: row.get(0)?,
        owner: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        duration_minutes: row.get(4)?,
        priority: Priority::from_stored(&priority),
        completed: row.get(6)?,
        completed_at: completed_at
            .as_deref()
            .map(|raw| parse_timestamp(7, raw))
            .transpose()?,
        created_at: parse_timestamp(8, &created_at)?,
    })
}

fn row_to_snapshot(row: &rusqlite::Row) -> rusqlite::Result<DailySnapshot> {
    let owner: String = row.get(0)?;
    let date: String = row.get(1)?;
    let events_json: String = row.get(4)?;
    let synced_at: String = row.get(5)?;

    Ok(DailySnapshot::new(
        &owner,
        parse_date(1, &date)?,
        row.get(2)?,
        row.get(3)?,
        decode_events(&events_json),
        parse_timestamp(5, &synced_at)?,
    ))
}

/// SQLite database for tasks and daily snapshots.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/flowfocus.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("flowfocus.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // === Tasks ===

    pub fn create_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tasks (id, owner, title, description, duration_minutes, priority, completed, completed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.id,
                task.owner,
                task.title,
                task.description,
                task.duration_minutes,
                task.priority.as_str(),
                task.completed,
                task.completed_at.map(|dt| dt.to_rfc3339()),
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, owner: &str, id: &str) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner = ?1 AND id = ?2"),
                params![owner, id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// All of an owner's tasks, newest first.
    pub fn list_tasks(&self, owner: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner = ?1 ORDER BY created_at DESC, rowid DESC"
        ))?;
        let tasks = stmt
            .query_map(params![owner], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Incomplete tasks in creation order.
    pub fn list_incomplete_tasks(&self, owner: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner = ?1 AND completed = 0 ORDER BY created_at ASC, rowid ASC"
        ))?;
        let tasks = stmt
            .query_map(params![owner], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Sum of durations of an owner's incomplete tasks.
    pub fn total_task_minutes(&self, owner: &str) -> Result<u32> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0) FROM tasks WHERE owner = ?1 AND completed = 0",
            params![owner],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(total).unwrap_or(u32::MAX))
    }

    /// Overwrite every mutable field of a stored task.
    ///
    /// # Errors
    /// Returns `TaskNotFound` if no such task exists for the owner.
    pub fn update_task(&self, task: &Task) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?3, description = ?4, duration_minutes = ?5, priority = ?6,
                 completed = ?7, completed_at = ?8
             WHERE owner = ?1 AND id = ?2",
            params![
                task.owner,
                task.id,
                task.title,
                task.description,
                task.duration_minutes,
                task.priority.as_str(),
                task.completed,
                task.completed_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::TaskNotFound(task.id.clone()));
        }
        Ok(())
    }

    /// # Errors
    /// Returns `TaskNotFound` if no such task exists for the owner.
    pub fn delete_task(&self, owner: &str, id: &str) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE owner = ?1 AND id = ?2",
            params![owner, id],
        )?;
        if changed == 0 {
            return Err(CoreError::TaskNotFound(id.to_string()));
        }
        Ok(())
    }

    // === Snapshots ===

    /// Insert or overwrite the snapshot for `(owner, date)`.
    ///
    /// Re-syncing a day replaces its totals and events; the row keeps its
    /// original `created_at`. Concurrent writers resolve last-write-wins.
    pub fn upsert_snapshot(&self, snapshot: &DailySnapshot) -> Result<DailySnapshot> {
        let events_json = encode_events(&snapshot.events)?;
        let synced_at = snapshot.synced_at.to_rfc3339();
        let date = snapshot.date.format("%Y-%m-%d").to_string();

        self.conn.execute(
            "INSERT INTO daily_snapshots
                (owner, sync_date, total_minutes, available_minutes, events_json, created_at, synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(owner, sync_date) DO UPDATE SET
                total_minutes = excluded.total_minutes,
                available_minutes = excluded.available_minutes,
                events_json = excluded.events_json,
                synced_at = excluded.synced_at",
            params![
                snapshot.owner,
                date,
                snapshot.total_minutes,
                snapshot.available_minutes,
                events_json,
                synced_at,
            ],
        )?;

        self.get_snapshot(&snapshot.owner, snapshot.date)?
            .ok_or_else(|| {
                CoreError::Database(DatabaseError::QueryFailed(
                    "snapshot missing after upsert".to_string(),
                ))
            })
    }

    /// The snapshot for `(owner, date)`, or `None` if that day was never synced.
    pub fn get_snapshot(&self, owner: &str, date: NaiveDate) -> Result<Option<DailySnapshot>> {
        let snapshot = self
            .conn
            .query_row(
                "SELECT owner, sync_date, total_minutes, available_minutes, events_json, synced_at
                 FROM daily_snapshots WHERE owner = ?1 AND sync_date = ?2",
                params![owner, date.format("%Y-%m-%d").to_string()],
                row_to_snapshot,
            )
            .optional()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::CalendarEvent;
    use crate::task::{NewTask, TaskPatch};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn ev(summary: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent::new(
            summary,
            DateTime::parse_from_rfc3339(start).unwrap(),
            DateTime::parse_from_rfc3339(end).unwrap(),
        )
    }

    #[test]
    fn task_crud_roundtrip() {
        let db = Database::open_memory().unwrap();
        let task = Task::new(
            "alice",
            NewTask::new("Write report")
                .with_duration(45)
                .with_priority(Priority::High),
            t0(),
        )
        .unwrap();
        db.create_task(&task).unwrap();

        let loaded = db.get_task("alice", &task.id).unwrap().unwrap();
        assert_eq!(loaded, task);
        assert!(db.get_task("bob", &task.id).unwrap().is_none());

        let mut updated = loaded.clone();
        updated
            .apply(
                TaskPatch {
                    completed: Some(true),
                    ..Default::default()
                },
                t0() + Duration::hours(1),
            )
            .unwrap();
        db.update_task(&updated).unwrap();
        let reloaded = db.get_task("alice", &task.id).unwrap().unwrap();
        assert!(reloaded.completed);
        assert_eq!(reloaded.completed_at, Some(t0() + Duration::hours(1)));

        db.delete_task("alice", &task.id).unwrap();
        assert!(db.get_task("alice", &task.id).unwrap().is_none());
        assert!(matches!(
            db.delete_task("alice", &task.id),
            Err(CoreError::TaskNotFound(_))
        ));
    }

    #[test]
    fn listing_orders_and_filters() {
        let db = Database::open_memory().unwrap();
        let first = Task::new("alice", NewTask::new("first"), t0()).unwrap();
        let mut second = Task::new("alice", NewTask::new("second"), t0() + Duration::minutes(5)).unwrap();
        let other = Task::new("bob", NewTask::new("not mine"), t0()).unwrap();
        second.set_completed(true, t0() + Duration::minutes(10));
        for t in [&first, &second, &other] {
            db.create_task(t).unwrap();
        }

        let all: Vec<String> = db.list_tasks("alice").unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(all, vec!["second", "first"]);

        let open = db.list_incomplete_tasks("alice").unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "first");
        assert_eq!(db.total_task_minutes("alice").unwrap(), 30);
    }

    #[test]
    fn unknown_stored_priority_reads_as_unranked() {
        let db = Database::open_memory().unwrap();
        let task = Task::new("alice", NewTask::new("legacy"), t0()).unwrap();
        db.create_task(&task).unwrap();
        db.conn()
            .execute("UPDATE tasks SET priority = 'Urgent' WHERE id = ?1", params![task.id])
            .unwrap();
        let loaded = db.get_task("alice", &task.id).unwrap().unwrap();
        assert_eq!(loaded.priority, Priority::Unranked);
    }

    #[test]
    fn update_missing_task_is_not_found() {
        let db = Database::open_memory().unwrap();
        let task = Task::new("alice", NewTask::new("ghost"), t0()).unwrap();
        assert!(matches!(db.update_task(&task), Err(CoreError::TaskNotFound(_))));
    }

    #[test]
    fn snapshot_upsert_keeps_single_row_with_latest_values() {
        let db = Database::open_memory().unwrap();
        let first = DailySnapshot::new(
            "alice",
            day(),
            480,
            420,
            vec![ev("1:1", "2026-03-02T10:00:00-06:00", "2026-03-02T11:00:00-06:00")],
            t0(),
        );
        db.upsert_snapshot(&first).unwrap();

        let second = DailySnapshot::new("alice", day(), 480, 480, vec![], t0() + Duration::hours(2));
        let stored = db.upsert_snapshot(&second).unwrap();
        assert_eq!(stored, second);

        let rows: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM daily_snapshots WHERE owner = 'alice' AND sync_date = '2026-03-02'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(db.get_snapshot("alice", day()).unwrap().unwrap().available_minutes, 480);
    }

    #[test]
    fn snapshot_lookup_is_scoped_by_owner_and_day() {
        let db = Database::open_memory().unwrap();
        let snap = DailySnapshot::new("alice", day(), 480, 300, vec![], t0());
        db.upsert_snapshot(&snap).unwrap();

        assert!(db.get_snapshot("bob", day()).unwrap().is_none());
        assert!(db
            .get_snapshot("alice", day().succ_opt().unwrap())
            .unwrap()
            .is_none());
        assert_eq!(db.get_snapshot("alice", day()).unwrap(), Some(snap));
    }

    #[test]
    fn malformed_stored_events_are_skipped() {
        let db = Database::open_memory().unwrap();
        db.upsert_snapshot(&DailySnapshot::new("alice", day(), 480, 400, vec![], t0()))
            .unwrap();
        db.conn()
            .execute(
                "UPDATE daily_snapshots SET events_json = ?1",
                params![r#"[{"summary":"bad","start":"??","end":"??"},{"summary":"ok","start":"2026-03-02T13:00:00-06:00","end":"2026-03-02T14:00:00-06:00"}]"#],
            )
            .unwrap();
        let snap = db.get_snapshot("alice", day()).unwrap().unwrap();
        assert_eq!(snap.events.len(), 1);
        assert_eq!(snap.events[0].summary, "ok");
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowfocus.db");
        {
            let db = Database::open_at(&path).unwrap();
            let task = Task::new("alice", NewTask::new("persisted"), t0()).unwrap();
            db.create_task(&task).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.list_tasks("alice").unwrap().len(), 1);
    }
}
