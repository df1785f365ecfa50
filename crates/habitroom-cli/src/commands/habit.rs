//! Habit management commands for CLI.

use clap::Subcommand;
use habitroom_core::{stats, Config, HabitId, HabitLedger};
use serde_json::json;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Add {
        /// Habit name
        name: String,
        /// Category label (default from config: habits.default_category)
        #[arg(long, default_value = "")]
        category: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
    /// List habits
    List {
        /// Include inactive habits
        #[arg(long)]
        all: bool,
    },
    /// Show a habit with its check-in history and consistency
    Show {
        /// Habit ID
        id: HabitId,
    },
    /// Check a habit in for today
    CheckIn {
        /// Habit ID
        id: HabitId,
    },
    /// Activate or deactivate a habit
    Toggle {
        /// Habit ID
        id: HabitId,
        /// Desired state; flips the current state when omitted
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a habit and all of its records
    Delete {
        /// Habit ID
        id: HabitId,
    },
}

pub fn run(action: HabitAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = HabitLedger::open(config)?;

    match action {
        HabitAction::Add {
            name,
            category,
            description,
        } => {
            let habit = match description {
                Some(description) => {
                    ledger.create_with_description(&name, &category, &description)?
                }
                None => ledger.create(&name, &category)?,
            };
            eprintln!("Habit created: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { all } => {
            let habits = ledger.list(!all && config.habits.list_active_only)?;
            println!("{}", serde_json::to_string_pretty(&habits)?);
        }
        HabitAction::Show { id } => {
            let habit = ledger.get(id)?;
            let today = ledger.today();
            let out = json!({
                "habit": habit,
                "description": ledger.description(id)?,
                "status": habit.check_in_status(today),
                "stats": stats::habit_stats(&habit, today),
                "history": ledger.history(id)?,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        HabitAction::CheckIn { id } => {
            let before = ledger.get(id)?;
            let habit = ledger.check_in(id)?;
            if habit.streak == before.streak {
                eprintln!("Already checked in today");
            }
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Toggle { id, active } => {
            let desired = match active {
                Some(desired) => desired,
                None => !ledger.get(id)?.active,
            };
            let habit = ledger.toggle_active(id, desired)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Delete { id } => {
            ledger.delete(id)?;
            println!("Habit deleted: {id}");
        }
    }
    Ok(())
}
