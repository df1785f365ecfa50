//! Database schema migrations for habitroom.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
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
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: baseline schema.
///
/// Categories, habits, the per-habit performance record, an optional
/// description record and the check-in history.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS habit_category (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            type      TEXT NOT NULL UNIQUE,
            polarity  TEXT NOT NULL DEFAULT 'positive'
        );

        CREATE TABLE IF NOT EXISTS habits (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_name  TEXT NOT NULL,
            cat_hab_id  INTEGER NOT NULL REFERENCES habit_category(id),
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS performance (
            habit_id    INTEGER PRIMARY KEY REFERENCES habits(id),
            start_date  TEXT NOT NULL,
            streak      INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS habit_description (
            habit_id     INTEGER PRIMARY KEY REFERENCES habits(id),
            description  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS check_in (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id    INTEGER NOT NULL REFERENCES habits(id),
            checked_on  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_habits_is_active ON habits(is_active);
        CREATE INDEX IF NOT EXISTS idx_check_in_habit_id ON check_in(habit_id);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: denormalize the last check-in date onto `performance`.
///
/// Backfills `last_checked_in` from the check-in history and enforces one
/// history row per habit and day.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE performance ADD COLUMN last_checked_in TEXT;

         DELETE FROM check_in
         WHERE id NOT IN (
             SELECT MIN(id) FROM check_in GROUP BY habit_id, checked_on
         );

         CREATE UNIQUE INDEX IF NOT EXISTS idx_check_in_habit_day
             ON check_in(habit_id, checked_on);

         UPDATE performance
         SET last_checked_in = (
             SELECT MAX(checked_on) FROM check_in WHERE check_in.habit_id = performance.habit_id
         );",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}
