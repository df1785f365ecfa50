//! Source of the current calendar date.
//!
//! Check-in rules are defined per calendar day, so the ledger never reads
//! the wall clock directly.

use chrono::{Datelike, Local, NaiveDate};
use std::sync::atomic::{AtomicI32, Ordering};

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local-time wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a given day that can be advanced by hand.
#[derive(Debug)]
pub struct FixedClock {
    days_from_ce: AtomicI32,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            days_from_ce: AtomicI32::new(day.num_days_from_ce()),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        self.days_from_ce
            .store(day.num_days_from_ce(), Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i32) {
        self.days_from_ce.fetch_add(days, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        let days = self.days_from_ce.load(Ordering::SeqCst);
        NaiveDate::from_num_days_from_ce_opt(days).unwrap_or(NaiveDate::MIN)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
