//! Integration tests for the habit ledger.
//!
//! Walks a habit through its whole lifecycle against both an in-memory and
//! an on-disk store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use habitroom_core::{stats, CoreError, FixedClock, HabitLedger, HabitStore};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

#[test]
fn test_morning_run_lifecycle() {
    let clock = Arc::new(FixedClock::new(today()));
    let ledger = HabitLedger::with_clock(HabitStore::open_memory().unwrap(), clock.clone());

    let habit = ledger.create("Morning Run", "fitness").unwrap();
    assert_eq!(habit.streak, 0);
    assert!(habit.active);
    assert!(habit.last_checked_in.is_none());

    let checked = ledger.check_in(habit.id).unwrap();
    assert_eq!(checked.streak, 1);
    assert_eq!(checked.last_checked_in, Some(today()));

    let again = ledger.check_in(habit.id).unwrap();
    assert_eq!(again.streak, 1);

    let inactive = ledger.toggle_active(habit.id, false).unwrap();
    assert!(!inactive.active);

    match ledger.check_in(habit.id) {
        Err(CoreError::InvalidState { id, .. }) => assert_eq!(id, habit.id),
        other => panic!("expected InvalidState, got {other:?}"),
    }

    ledger.delete(habit.id).unwrap();
    assert!(ledger.list(false).unwrap().iter().all(|h| h.id != habit.id));
    assert!(ledger.list(true).unwrap().iter().all(|h| h.id != habit.id));
    assert!(matches!(
        ledger.toggle_active(habit.id, true),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn test_week_of_check_ins_feeds_stats() {
    let start = today();
    let clock = Arc::new(FixedClock::new(start));
    let ledger = HabitLedger::with_clock(HabitStore::open_memory().unwrap(), clock.clone());

    let run = ledger.create("Run", "fitness").unwrap().id;
    let read = ledger.create("Read", "learning").unwrap().id;

    // Run every other day for a week, read only on the last day
    for offset in 0..7 {
        if offset % 2 == 0 {
            ledger.check_in(run).unwrap();
        }
        if offset < 6 {
            clock.advance_days(1);
        }
    }
    ledger.check_in(read).unwrap();

    let habits = ledger.list(false).unwrap();
    let run_habit = habits.iter().find(|h| h.id == run).unwrap();
    assert_eq!(run_habit.streak, 4);
    assert_eq!(ledger.history(run).unwrap().len(), 4);

    let run_stats = stats::habit_stats(run_habit, ledger.today());
    assert_eq!(run_stats.days_since_start, 7);
    assert_eq!(run_stats.consistency_percent, 57);

    let summary = stats::summarize(&habits, ledger.today());
    assert_eq!(summary.combined_streak, 5);
    assert_eq!(summary.completed_today, 2);
    assert_eq!(summary.completion_percent, 100);
}

#[test]
fn test_on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitroom.db");
    let timeout = Duration::from_millis(250);

    let id = {
        let ledger = HabitLedger::with_clock(
            HabitStore::open_at(&path, timeout).unwrap(),
            FixedClock::new(today()),
        );
        let id = ledger
            .create_with_description("Journal", "wellness", "one page")
            .unwrap()
            .id;
        ledger.check_in(id).unwrap();
        id
    };

    let ledger = HabitLedger::with_clock(
        HabitStore::open_at(&path, timeout).unwrap(),
        FixedClock::new(today()),
    );
    let habit = ledger.get(id).unwrap();
    assert_eq!(habit.streak, 1);
    assert_eq!(ledger.description(id).unwrap().as_deref(), Some("one page"));

    // Same calendar day after reopening is still a no-op
    assert_eq!(ledger.check_in(id).unwrap().streak, 1);
}

#[test]
fn test_two_connections_share_one_check_in_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitroom.db");
    let timeout = Duration::from_millis(500);

    let first = HabitLedger::with_clock(
        HabitStore::open_at(&path, timeout).unwrap(),
        FixedClock::new(today()),
    );
    let second = HabitLedger::with_clock(
        HabitStore::open_at(&path, timeout).unwrap(),
        FixedClock::new(today()),
    );

    let id = first.create("Run", "fitness").unwrap().id;
    assert_eq!(first.check_in(id).unwrap().streak, 1);
    assert_eq!(second.check_in(id).unwrap().streak, 1);
    assert_eq!(first.history(id).unwrap(), vec![today()]);
}
