use chrono::NaiveDate;
use clap::Subcommand;
use focustimer_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Stats for the ISO week containing a date (default: this week)
    Week {
        /// Any day of the week, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// All-time stats including streaks
    All,
    /// Summary text suitable for sharing
    Share,
    /// Delete all recorded sessions
    Reset {
        /// Required to actually delete
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = Database::today();

    match action {
        StatsAction::Today => {
            let stats = db.daily_stats(today)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Week { date } => {
            let stats = db.weekly_stats(date.unwrap_or(today))?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::All => {
            let stats = db.all_time_stats(today)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Share => {
            println!("{}", db.share_text(today)?);
        }
        StatsAction::Reset { yes } => {
            if !yes {
                return Err("refusing to delete statistics without --yes".into());
            }
            let removed = db.reset_stats()?;
            println!("removed {removed} session records");
        }
    }
    Ok(())
}
