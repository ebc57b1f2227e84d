//! Best-effort completion check for a timer whose process went away.
//!
//! Runs detached from any live [`TimerController`](crate::TimerController):
//! it only reads the background-recovery snapshot and, when that session has
//! run out, delivers an immediate completion alert. It never writes timer
//! state; the next foreground return (or cold start) owns that.

use tracing::{debug, info};

use crate::clock::Clock;
use crate::collaborators::{CompletionNotice, KeyValueStore, NotificationScheduler};
use crate::error::Result;
use crate::lifecycle::elapsed_secs;
use crate::storage::snapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundCheck {
    NoSnapshot,
    NotRunning,
    Pending { remaining_secs: u64 },
    Completed { notice: CompletionNotice },
}

pub fn check_background_completion(
    store: &dyn KeyValueStore,
    notifier: &dyn NotificationScheduler,
    clock: &dyn Clock,
) -> Result<BackgroundCheck> {
    let Some(recovery) = snapshot::load_recovery(store)? else {
        debug!("no background snapshot");
        return Ok(BackgroundCheck::NoSnapshot);
    };
    if !recovery.state.is_running {
        return Ok(BackgroundCheck::NotRunning);
    }

    let elapsed = elapsed_secs(recovery.background_timestamp, clock.now_ms());
    let remaining = u64::from(recovery.state.remaining_time);
    if elapsed < remaining {
        return Ok(BackgroundCheck::Pending {
            remaining_secs: remaining - elapsed,
        });
    }

    let notice = CompletionNotice::for_session(
        recovery.state.current_session,
        0,
        &recovery.state.settings,
    );
    if recovery.state.settings.notifications_enabled {
        notifier.schedule_completion(&notice)?;
        info!(session = %notice.kind, elapsed, "background session finished; alert sent");
    } else {
        info!(session = %notice.kind, elapsed, "background session finished; alerts disabled");
    }
    Ok(BackgroundCheck::Completed { notice })
}
