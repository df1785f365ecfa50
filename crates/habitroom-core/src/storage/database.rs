//! SQLite-based habit storage.
//!
//! Provides persistent storage for:
//! - Habits and their categories
//! - Per-habit performance (start date, streak, last check-in)
//! - Optional habit descriptions
//! - Check-in history
//!
//! Multi-record writes run inside a single `BEGIN IMMEDIATE` transaction and
//! roll back on any failure. Identifiers are always bound as parameters.

use chrono::NaiveDate;
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use super::migrations;
use crate::error::DatabaseError;
use crate::habit::{Habit, HabitId, NewHabit};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_HABIT: &str = "SELECT h.id, h.habit_name, c.type, h.is_active,
        p.start_date, COALESCE(p.streak, 0), p.last_checked_in
     FROM habits h
     JOIN habit_category c ON h.cat_hab_id = c.id
     LEFT JOIN performance p ON p.habit_id = h.id";

// === Helper Functions ===

fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

fn parse_date(idx: usize, raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Build a Habit from a `SELECT_HABIT` row
fn row_to_habit(row: &rusqlite::Row) -> Result<Habit, rusqlite::Error> {
    let start_date: Option<String> = row.get(4)?;
    let start_date = match start_date {
        Some(raw) => parse_date(4, &raw)?,
        None => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Null,
                "habit has no performance record".into(),
            ))
        }
    };
    let last_checked_in = row
        .get::<_, Option<String>>(6)?
        .map(|raw| parse_date(6, &raw))
        .transpose()?;

    Ok(Habit {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        active: row.get::<_, i64>(3)? != 0,
        start_date,
        streak: row.get(5)?,
        last_checked_in,
    })
}

/// Map row decoding failures to `CorruptRow`, anything else through `From`.
fn decode_error(table: &'static str) -> impl Fn(rusqlite::Error) -> DatabaseError {
    move |err| match err {
        rusqlite::Error::FromSqlConversionFailure(idx, _, source) => DatabaseError::CorruptRow {
            table,
            message: format!("column {idx}: {source}"),
        },
        other => other.into(),
    }
}

/// SQLite store for habits and their dependent records.
pub struct HabitStore {
    conn: Connection,
}

impl HabitStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database file at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path, busy_timeout: Duration) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(busy_timeout)?;
        let store = Self::init(conn)?;
        tracing::debug!(path = %path.display(), "opened habit store");
        Ok(store)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run `f` inside an immediate transaction, rolling back on error.
    fn in_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, DatabaseError> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err.into())
            }
        }
    }

    /// Look up a category id by label, creating the category on first use.
    fn ensure_category(conn: &Connection, label: &str) -> Result<i64, rusqlite::Error> {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM habit_category WHERE type = ?1",
                params![label],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        conn.execute(
            "INSERT INTO habit_category (type, polarity) VALUES (?1, ?2)",
            params![label, "positive"],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // === Habit CRUD ===

    /// Insert a habit with its performance record (and description, if any).
    ///
    /// `new` is expected to be validated already.
    pub fn insert_habit(
        &self,
        new: &NewHabit,
        start_date: NaiveDate,
    ) -> Result<Habit, DatabaseError> {
        self.in_transaction(|conn| {
            let category_id = Self::ensure_category(conn, &new.category)?;
            conn.execute(
                "INSERT INTO habits (habit_name, cat_hab_id, is_active) VALUES (?1, ?2, 1)",
                params![new.name, category_id],
            )?;
            let id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO performance (habit_id, start_date, streak, last_checked_in)
                 VALUES (?1, ?2, 0, NULL)",
                params![id, format_date(start_date)],
            )?;
            if let Some(description) = &new.description {
                conn.execute(
                    "INSERT INTO habit_description (habit_id, description) VALUES (?1, ?2)",
                    params![id, description],
                )?;
            }
            Ok(Habit {
                id,
                name: new.name.clone(),
                category: new.category.clone(),
                active: true,
                start_date,
                streak: 0,
                last_checked_in: None,
            })
        })
    }

    /// Get a habit by ID.
    pub fn get_habit(&self, id: HabitId) -> Result<Option<Habit>, DatabaseError> {
        self.conn
            .query_row(&format!("{SELECT_HABIT} WHERE h.id = ?1"), params![id], row_to_habit)
            .optional()
            .map_err(decode_error("performance"))
    }

    /// List habits in insertion order.
    pub fn list_habits(&self, active_only: bool) -> Result<Vec<Habit>, DatabaseError> {
        let sql = if active_only {
            format!("{SELECT_HABIT} WHERE h.is_active = 1 ORDER BY h.id")
        } else {
            format!("{SELECT_HABIT} ORDER BY h.id")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let habits = stmt
            .query_map([], row_to_habit)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(decode_error("performance"));
        habits
    }

    /// Get the stored description of a habit, if one was recorded.
    pub fn get_description(&self, id: HabitId) -> Result<Option<String>, DatabaseError> {
        let description = self
            .conn
            .query_row(
                "SELECT description FROM habit_description WHERE habit_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(description)
    }

    /// Record a check-in for `day`.
    ///
    /// Increments the streak, stamps `last_checked_in` and appends a history
    /// row as one unit. Only applies to an active habit not yet checked in
    /// on `day`; returns `false` when nothing was written.
    pub fn record_check_in(&self, id: HabitId, day: NaiveDate) -> Result<bool, DatabaseError> {
        let day = format_date(day);
        self.in_transaction(|conn| {
            let updated = conn.execute(
                "UPDATE performance
                 SET streak = streak + 1, last_checked_in = ?2
                 WHERE habit_id = ?1
                   AND (last_checked_in IS NULL OR last_checked_in <> ?2)
                   AND EXISTS (SELECT 1 FROM habits WHERE id = ?1 AND is_active = 1)",
                params![id, day],
            )?;
            if updated == 0 {
                return Ok(false);
            }
            conn.execute(
                "INSERT OR IGNORE INTO check_in (habit_id, checked_on) VALUES (?1, ?2)",
                params![id, day],
            )?;
            Ok(true)
        })
    }

    /// Set the active flag. Returns `false` if the habit does not exist.
    pub fn set_active(&self, id: HabitId, active: bool) -> Result<bool, DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE habits SET is_active = ?2 WHERE id = ?1",
            params![id, if active { 1 } else { 0 }],
        )?;
        Ok(updated > 0)
    }

    /// Delete a habit and every dependent record in a single transaction.
    ///
    /// Returns `false` if the habit did not exist.
    pub fn delete_habit(&self, id: HabitId) -> Result<bool, DatabaseError> {
        self.in_transaction(|conn| {
            conn.execute("DELETE FROM performance WHERE habit_id = ?1", params![id])?;
            conn.execute("DELETE FROM habit_description WHERE habit_id = ?1", params![id])?;
            conn.execute("DELETE FROM check_in WHERE habit_id = ?1", params![id])?;
            let removed = conn.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
    }

    /// Check-in dates of a habit, oldest first.
    pub fn check_in_history(&self, id: HabitId) -> Result<Vec<NaiveDate>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT checked_on FROM check_in WHERE habit_id = ?1 ORDER BY checked_on")?;
        let dates = stmt
            .query_map(params![id], |row| {
                let raw: String = row.get(0)?;
                parse_date(0, &raw)
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(decode_error("check_in"));
        dates
    }

    /// Count rows referencing a habit across all dependent tables.
    pub fn dependent_row_count(&self, id: HabitId) -> Result<i64, DatabaseError> {
        let count = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM performance WHERE habit_id = ?1)
                  + (SELECT COUNT(*) FROM habit_description WHERE habit_id = ?1)
                  + (SELECT COUNT(*) FROM check_in WHERE habit_id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
