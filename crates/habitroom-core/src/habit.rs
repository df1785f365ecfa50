//! The habit entity and its derived per-day state.
//!
//! A habit carries two independent dimensions of state:
//!
//! ```text
//! {Active, Inactive} x {CheckedInToday, NotCheckedInToday}
//! ```
//!
//! Only the first is stored. Whether a habit is checked in today is a
//! function of `last_checked_in` and the current calendar date, so crossing
//! midnight moves every habit back to `NotCheckedInToday` without a write.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store at creation.
pub type HabitId = i64;

/// Category used when a caller supplies none.
pub const DEFAULT_CATEGORY: &str = "health";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub category: String,
    pub active: bool,
    pub start_date: NaiveDate,
    /// Number of check-ins recorded. Never decreases.
    pub streak: u32,
    pub last_checked_in: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    CheckedInToday,
    NotCheckedInToday,
}

impl Habit {
    pub fn is_checked_in_on(&self, day: NaiveDate) -> bool {
        self.last_checked_in == Some(day)
    }

    pub fn check_in_status(&self, today: NaiveDate) -> CheckInStatus {
        if self.is_checked_in_on(today) {
            CheckInStatus::CheckedInToday
        } else {
            CheckInStatus::NotCheckedInToday
        }
    }
}

/// Validated input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHabit {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewHabit {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn habit(last: Option<NaiveDate>) -> Habit {
        Habit {
            id: 1,
            name: "Read".to_string(),
            category: "learning".to_string(),
            active: true,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            streak: 0,
            last_checked_in: last,
        }
    }

    #[test]
    fn status_follows_the_calendar_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let h = habit(Some(day));
        assert_eq!(h.check_in_status(day), CheckInStatus::CheckedInToday);
        assert_eq!(
            h.check_in_status(day.succ_opt().unwrap()),
            CheckInStatus::NotCheckedInToday
        );
        assert_eq!(habit(None).check_in_status(day), CheckInStatus::NotCheckedInToday);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(habit(None)).unwrap();
        assert_eq!(json["startDate"], "2024-03-01");
        assert!(json["lastCheckedIn"].is_null());
        assert_eq!(json["streak"], 0);
    }
}
