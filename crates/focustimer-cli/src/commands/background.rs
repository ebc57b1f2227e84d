use focustimer_core::{check_background_completion, BackgroundCheck, Database, SystemClock};

use crate::devices::TerminalNotifier;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let notifier = TerminalNotifier::new();

    match check_background_completion(&db, &notifier, &SystemClock)? {
        BackgroundCheck::NoSnapshot => println!("no background session"),
        BackgroundCheck::NotRunning => println!("background session is not running"),
        BackgroundCheck::Pending { remaining_secs } => {
            println!("background session running, {remaining_secs}s left");
        }
        BackgroundCheck::Completed { notice } => {
            println!("{} finished while in the background", notice.kind);
        }
    }
    Ok(())
}
