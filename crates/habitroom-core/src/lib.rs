//! # Habitroom Core Library
//!
//! This library provides the core logic for Habitroom, a personal habit
//! tracker. All operations are available through the `habitroom` CLI, which
//! also serves the same operations over a small JSON HTTP API.
//!
//! ## Architecture
//!
//! - **Ledger**: owns habit state and enforces the legal transitions
//!   (create, check-in, toggle-active, delete)
//! - **Storage**: SQLite-based habit store and TOML-based configuration
//! - **Stats**: consistency and completion figures derived at read time
//!
//! ## Key Components
//!
//! - [`HabitLedger`]: the habit state machine
//! - [`HabitStore`]: persistence of habits and their dependent records
//! - [`Config`]: application configuration management
//! - [`Clock`]: source of the current calendar day

pub mod clock;
pub mod error;
pub mod habit;
pub mod ledger;
pub mod stats;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use habit::{CheckInStatus, Habit, HabitId, NewHabit, DEFAULT_CATEGORY};
pub use ledger::HabitLedger;
pub use stats::{HabitStats, Summary};
pub use storage::{Config, HabitStore};
