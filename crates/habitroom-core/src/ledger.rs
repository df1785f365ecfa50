//! The habit ledger: the only component allowed to mutate habit state.
//!
//! ## Transitions
//!
//! ```text
//! create      -> Active, NotCheckedInToday
//! check_in    -> NotCheckedInToday => CheckedInToday   (Active only)
//! toggle      -> Active <=> Inactive                    (check-in state untouched)
//! delete      -> removed, with every dependent record
//! ```
//!
//! A check-in on a day that already has one is a no-op, so `streak` counts
//! at most one check-in per calendar day. It never decreases.

use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, Result, ValidationError};
use crate::habit::{Habit, HabitId, NewHabit, DEFAULT_CATEGORY};
use crate::storage::{Config, HabitStore};

pub struct HabitLedger {
    store: HabitStore,
    clock: Box<dyn Clock>,
    default_category: String,
}

impl HabitLedger {
    /// Create a ledger over `store` using the local wall clock.
    pub fn new(store: HabitStore) -> Self {
        Self::with_clock(store, SystemClock)
    }

    pub fn with_clock(store: HabitStore, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            clock: Box::new(clock),
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Open the configured database with the local wall clock.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.database_path()?;
        let store = HabitStore::open_at(
            &path,
            std::time::Duration::from_millis(config.storage.busy_timeout_ms),
        )?;
        Ok(Self::new(store).with_default_category(config.habits.default_category.clone()))
    }

    /// Category assigned when `create` receives a blank one.
    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    pub fn store(&self) -> &HabitStore {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Create an active habit with a zero streak, started today.
    ///
    /// # Errors
    /// `Validation` if the name is blank; `Database` if the insert fails, in
    /// which case nothing is written.
    pub fn create(&self, name: &str, category: &str) -> Result<Habit> {
        self.create_habit(NewHabit::new(name, category))
    }

    /// Like [`create`](Self::create), also storing a description record.
    pub fn create_with_description(
        &self,
        name: &str,
        category: &str,
        description: &str,
    ) -> Result<Habit> {
        self.create_habit(NewHabit::new(name, category).with_description(description))
    }

    fn create_habit(&self, new: NewHabit) -> Result<Habit> {
        let new = self.normalize(new)?;
        let habit = self.store.insert_habit(&new, self.today())?;
        tracing::info!(
            id = habit.id,
            name = %habit.name,
            category = %habit.category,
            "habit created"
        );
        Ok(habit)
    }

    fn normalize(&self, new: NewHabit) -> Result<NewHabit> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty {
                field: "name".to_string(),
            }
            .into());
        }
        let category = match new.category.trim() {
            "" => self.default_category.clone(),
            c => c.to_string(),
        };
        let description = new
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(NewHabit {
            name: name.to_string(),
            category,
            description,
        })
    }

    /// Fetch a single habit.
    pub fn get(&self, id: HabitId) -> Result<Habit> {
        self.store
            .get_habit(id)?
            .ok_or(CoreError::NotFound { id })
    }

    /// Check a habit in for today.
    ///
    /// Returns the unchanged habit if it was already checked in today.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `InvalidState` for an inactive habit.
    pub fn check_in(&self, id: HabitId) -> Result<Habit> {
        let habit = self.get(id)?;
        if !habit.active {
            tracing::warn!(id, "check-in rejected: habit is inactive");
            return Err(CoreError::InvalidState {
                id,
                message: "check-in is only allowed for active habits".to_string(),
            });
        }

        let today = self.today();
        if habit.is_checked_in_on(today) {
            tracing::debug!(id, %today, "already checked in today");
            return Ok(habit);
        }

        if !self.store.record_check_in(id, today)? {
            // Lost a race with another writer; report what is stored now.
            let current = self.get(id)?;
            if !current.active {
                return Err(CoreError::InvalidState {
                    id,
                    message: "check-in is only allowed for active habits".to_string(),
                });
            }
            return Ok(current);
        }

        let updated = self.get(id)?;
        tracing::debug!(id, streak = updated.streak, %today, "checked in");
        Ok(updated)
    }

    /// Set the active flag to `active`. Setting the current value is a no-op.
    pub fn toggle_active(&self, id: HabitId, active: bool) -> Result<Habit> {
        if !self.store.set_active(id, active)? {
            return Err(CoreError::NotFound { id });
        }
        tracing::debug!(id, active, "active flag set");
        self.get(id)
    }

    /// Permanently delete a habit together with its performance record,
    /// description and check-in history.
    pub fn delete(&self, id: HabitId) -> Result<()> {
        if !self.store.delete_habit(id)? {
            return Err(CoreError::NotFound { id });
        }
        tracing::info!(id, "habit deleted");
        Ok(())
    }

    /// Habits in insertion order, optionally only the active ones.
    pub fn list(&self, active_only: bool) -> Result<Vec<Habit>> {
        Ok(self.store.list_habits(active_only)?)
    }

    /// Days on which the habit was checked in, oldest first.
    pub fn history(&self, id: HabitId) -> Result<Vec<NaiveDate>> {
        self.get(id)?;
        Ok(self.store.check_in_history(id)?)
    }

    pub fn description(&self, id: HabitId) -> Result<Option<String>> {
        self.get(id)?;
        Ok(self.store.get_description(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn ledger() -> (HabitLedger, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(day(10)));
        let ledger = HabitLedger::with_clock(HabitStore::open_memory().unwrap(), clock.clone());
        (ledger, clock)
    }

    #[test]
    fn create_starts_active_with_zero_streak() {
        let (ledger, _) = ledger();
        let habit = ledger.create("  Morning Run ", "fitness").unwrap();
        assert_eq!(habit.name, "Morning Run");
        assert_eq!(habit.streak, 0);
        assert!(habit.active);
        assert!(habit.last_checked_in.is_none());
        assert_eq!(habit.start_date, day(10));
    }

    #[test]
    fn create_rejects_blank_names() {
        let (ledger, _) = ledger();
        let err = ledger.create("   ", "fitness").unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Empty { .. })));
        assert!(ledger.list(false).unwrap().is_empty());
    }

    #[test]
    fn blank_category_uses_default() {
        let (ledger, _) = ledger();
        let ledger = ledger.with_default_category("wellness");
        assert_eq!(ledger.create("Meditate", " ").unwrap().category, "wellness");
    }

    #[test]
    fn check_in_twice_same_day_counts_once() {
        let (ledger, _) = ledger();
        let id = ledger.create("Read", "learning").unwrap().id;

        let first = ledger.check_in(id).unwrap();
        assert_eq!(first.streak, 1);
        assert_eq!(first.last_checked_in, Some(day(10)));

        let second = ledger.check_in(id).unwrap();
        assert_eq!(second, first);
        assert_eq!(ledger.history(id).unwrap(), vec![day(10)]);
    }

    #[test]
    fn day_boundary_allows_another_check_in() {
        let (ledger, clock) = ledger();
        let id = ledger.create("Read", "learning").unwrap().id;
        ledger.check_in(id).unwrap();
        clock.advance_days(1);
        let habit = ledger.check_in(id).unwrap();
        assert_eq!(habit.streak, 2);
        assert_eq!(habit.last_checked_in, Some(day(11)));
    }

    #[test]
    fn missed_days_do_not_reset_streak() {
        let (ledger, clock) = ledger();
        let id = ledger.create("Read", "learning").unwrap().id;
        ledger.check_in(id).unwrap();
        clock.advance_days(5);
        assert_eq!(ledger.check_in(id).unwrap().streak, 2);
    }

    #[test]
    fn check_in_on_inactive_fails_without_changes() {
        let (ledger, _) = ledger();
        let id = ledger.create("Read", "learning").unwrap().id;
        ledger.toggle_active(id, false).unwrap();

        let err = ledger.check_in(id).unwrap_err();
        assert!(err.is_invalid_state());
        let habit = ledger.get(id).unwrap();
        assert_eq!(habit.streak, 0);
        assert!(habit.last_checked_in.is_none());
    }

    #[test]
    fn toggle_is_idempotent_and_keeps_check_in_state() {
        let (ledger, _) = ledger();
        let id = ledger.create("Read", "learning").unwrap().id;
        ledger.check_in(id).unwrap();

        let off = ledger.toggle_active(id, false).unwrap();
        let off_again = ledger.toggle_active(id, false).unwrap();
        assert_eq!(off, off_again);
        assert!(!off.active);
        assert_eq!(off.streak, 1);

        let on = ledger.toggle_active(id, true).unwrap();
        assert!(on.active);
        assert_eq!(on.last_checked_in, Some(day(10)));
    }

    #[test]
    fn unknown_ids_report_not_found() {
        let (ledger, _) = ledger();
        assert!(ledger.get(99).unwrap_err().is_not_found());
        assert!(ledger.check_in(99).unwrap_err().is_not_found());
        assert!(ledger.toggle_active(99, true).unwrap_err().is_not_found());
        assert!(ledger.delete(99).unwrap_err().is_not_found());
        assert!(ledger.history(99).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_is_permanent() {
        let (ledger, _) = ledger();
        let id = ledger
            .create_with_description("Read", "learning", "20 pages")
            .unwrap()
            .id;
        ledger.check_in(id).unwrap();

        ledger.delete(id).unwrap();
        assert!(ledger.list(false).unwrap().iter().all(|h| h.id != id));
        assert_eq!(ledger.store().dependent_row_count(id).unwrap(), 0);
        assert!(ledger.delete(id).unwrap_err().is_not_found());
        assert!(ledger.check_in(id).unwrap_err().is_not_found());
    }

    #[test]
    fn list_respects_active_filter() {
        let (ledger, _) = ledger();
        let a = ledger.create("A", "work").unwrap().id;
        let b = ledger.create("B", "work").unwrap().id;
        ledger.toggle_active(a, false).unwrap();

        let active: Vec<_> = ledger.list(true).unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(active, vec![b]);
        assert_eq!(ledger.list(false).unwrap().len(), 2);
    }

    #[test]
    fn blank_description_is_dropped() {
        let (ledger, _) = ledger();
        let id = ledger.create_with_description("Read", "learning", "  ").unwrap().id;
        assert!(ledger.description(id).unwrap().is_none());
    }
}
