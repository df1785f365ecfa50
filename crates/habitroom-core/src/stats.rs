//! Derived habit statistics.
//!
//! Everything here is a pure function of the stored habits and the current
//! date. Nothing is persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::habit::{Habit, HabitId};

/// Per-habit consistency figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub id: HabitId,
    /// Days since the habit was started, counting the start day itself.
    pub days_since_start: i64,
    /// `streak / days_since_start * 100`
    pub consistency_rate: f64,
    /// `consistency_rate` rounded for display.
    pub consistency_percent: i64,
    pub checked_in_today: bool,
}

/// Aggregate figures over a set of habits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_habits: usize,
    pub active_habits: usize,
    /// Sum of every listed habit's streak.
    pub combined_streak: u64,
    /// Active habits checked in today.
    pub completed_today: usize,
    /// `completed_today / active_habits * 100`, or 0 with no active habits.
    pub completion_rate: f64,
    pub completion_percent: i64,
}

pub fn days_since_start(habit: &Habit, today: NaiveDate) -> i64 {
    ((today - habit.start_date).num_days() + 1).max(1)
}

pub fn habit_stats(habit: &Habit, today: NaiveDate) -> HabitStats {
    let days = days_since_start(habit, today);
    let consistency_rate = f64::from(habit.streak) / days as f64 * 100.0;
    HabitStats {
        id: habit.id,
        days_since_start: days,
        consistency_rate,
        consistency_percent: consistency_rate.round() as i64,
        checked_in_today: habit.is_checked_in_on(today),
    }
}

pub fn summarize(habits: &[Habit], today: NaiveDate) -> Summary {
    let active_habits = habits.iter().filter(|h| h.active).count();
    let completed_today = habits
        .iter()
        .filter(|h| h.active && h.is_checked_in_on(today))
        .count();
    let completion_rate = if active_habits > 0 {
        completed_today as f64 / active_habits as f64 * 100.0
    } else {
        0.0
    };

    Summary {
        total_habits: habits.len(),
        active_habits,
        combined_streak: habits.iter().map(|h| u64::from(h.streak)).sum(),
        completed_today,
        completion_rate,
        completion_percent: completion_rate.round() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn habit(id: HabitId, active: bool, streak: u32, last: Option<NaiveDate>) -> Habit {
        Habit {
            id,
            name: format!("habit {id}"),
            category: "health".to_string(),
            active,
            start_date: day(1),
            streak,
            last_checked_in: last,
        }
    }

    #[test]
    fn start_day_counts_as_day_one() {
        let h = habit(1, true, 1, Some(day(1)));
        let stats = habit_stats(&h, day(1));
        assert_eq!(stats.days_since_start, 1);
        assert_eq!(stats.consistency_percent, 100);
        assert!(stats.checked_in_today);
    }

    #[test]
    fn consistency_rounds_for_display() {
        let h = habit(1, true, 2, Some(day(2)));
        let stats = habit_stats(&h, day(3));
        assert_eq!(stats.days_since_start, 3);
        assert!((stats.consistency_rate - 66.666).abs() < 0.01);
        assert_eq!(stats.consistency_percent, 67);
        assert!(!stats.checked_in_today);
    }

    #[test]
    fn clock_behind_start_date_clamps_to_one_day() {
        let mut h = habit(1, true, 0, None);
        h.start_date = day(10);
        assert_eq!(days_since_start(&h, day(5)), 1);
    }

    #[test]
    fn summary_over_mixed_habits() {
        let habits = vec![
            habit(1, true, 3, Some(day(5))),
            habit(2, true, 1, Some(day(4))),
            habit(3, false, 4, None),
        ];
        let summary = summarize(&habits, day(5));
        assert_eq!(summary.total_habits, 3);
        assert_eq!(summary.active_habits, 2);
        assert_eq!(summary.combined_streak, 8);
        assert_eq!(summary.completed_today, 1);
        assert_eq!(summary.completion_percent, 50);
    }

    #[test]
    fn inactive_check_ins_do_not_count_toward_completion() {
        let habits = vec![
            habit(1, true, 2, Some(day(5))),
            habit(2, false, 3, Some(day(5))),
        ];
        let summary = summarize(&habits, day(5));
        assert_eq!(summary.active_habits, 1);
        assert_eq!(summary.completed_today, 1);
        assert_eq!(summary.completion_percent, 100);
        assert!(summary.completion_rate <= 100.0);
        assert_eq!(summary.combined_streak, 5);
    }

    #[test]
    fn summary_without_active_habits_is_zero() {
        let summary = summarize(&[habit(1, false, 2, None)], day(5));
        assert_eq!(summary.completion_rate, 0.0);
        assert_eq!(summarize(&[], day(5)), Summary::default());
    }
}
