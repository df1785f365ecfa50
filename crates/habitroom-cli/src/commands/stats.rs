use clap::Subcommand;
use habitroom_core::{stats, Config, HabitId, HabitLedger};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, combined streak and today's completion rate
    Summary {
        /// Include inactive habits
        #[arg(long)]
        all: bool,
    },
    /// Consistency figures for one habit
    Habit {
        /// Habit ID
        id: HabitId,
    },
}

pub fn run(action: StatsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = HabitLedger::open(config)?;
    let today = ledger.today();

    match action {
        StatsAction::Summary { all } => {
            let habits = ledger.list(!all && config.habits.list_active_only)?;
            let summary = stats::summarize(&habits, today);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        StatsAction::Habit { id } => {
            let habit = ledger.get(id)?;
            println!("{}", serde_json::to_string_pretty(&stats::habit_stats(&habit, today))?);
        }
    }
    Ok(())
}
