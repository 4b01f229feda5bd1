//! Database schema migrations for flowfocus.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: tasks and daily snapshots.
///
/// `(owner, sync_date)` is unique so a re-sync can only ever update the
/// existing row.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id               TEXT PRIMARY KEY,
            owner            TEXT NOT NULL,
            title            TEXT NOT NULL,
            description      TEXT,
            duration_minutes INTEGER NOT NULL DEFAULT 30 CHECK (duration_minutes > 0),
            priority         TEXT NOT NULL DEFAULT 'Medium',
            completed        INTEGER NOT NULL DEFAULT 0,
            completed_at     TEXT,
            created_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_snapshots (
            owner             TEXT NOT NULL,
            sync_date         TEXT NOT NULL,
            total_minutes     INTEGER NOT NULL DEFAULT 480,
            available_minutes INTEGER NOT NULL,
            events_json       TEXT NOT NULL DEFAULT '[]',
            created_at        TEXT NOT NULL,
            UNIQUE (owner, sync_date)
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: sync timestamp on snapshots and lookup index for tasks.
///
/// `synced_at` is refreshed on every upsert while `created_at` keeps the
/// first sync of the day.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE daily_snapshots ADD COLUMN synced_at TEXT NOT NULL DEFAULT '';
         UPDATE daily_snapshots SET synced_at = created_at WHERE synced_at = '';
         CREATE INDEX IF NOT EXISTS idx_tasks_owner_completed ON tasks(owner, completed);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn v2_backfills_synced_at() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO daily_snapshots (owner, sync_date, available_minutes, created_at)
             VALUES ('alice', '2026-03-02', 400, '2026-03-02T15:00:00+00:00')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();
        let synced_at: String = conn
            .query_row("SELECT synced_at FROM daily_snapshots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(synced_at, "2026-03-02T15:00:00+00:00");
    }
}
