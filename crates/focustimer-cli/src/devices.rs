//! Terminal stand-ins for the platform notification and sound services.

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use focustimer_core::{CompletionNotice, CoreError, NotificationScheduler, Result, SoundPlayer};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Prints completion alerts to stderr, delayed ones from a tokio task.
pub struct TerminalNotifier {
    handle: Option<Handle>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl TerminalNotifier {
    /// Uses the ambient tokio runtime for delayed alerts when there is one.
    pub fn new() -> Self {
        Self {
            handle: Handle::try_current().ok(),
            pending: Mutex::new(Vec::new()),
        }
    }
}

fn announce(notice: &CompletionNotice) {
    let bell = if notice.sound { "\x07" } else { "" };
    eprintln!("{bell}[{}] {}", notice.title, notice.body);
}

impl NotificationScheduler for TerminalNotifier {
    fn schedule_completion(&self, notice: &CompletionNotice) -> Result<()> {
        if notice.delay_secs == 0 {
            announce(notice);
            return Ok(());
        }
        let Some(handle) = &self.handle else {
            warn!(
                delay = notice.delay_secs,
                "no async runtime; delayed alert not scheduled"
            );
            return Ok(());
        };

        let notice = notice.clone();
        let task = handle.spawn(async move {
            tokio::time::sleep(Duration::from_secs(notice.delay_secs)).await;
            announce(&notice);
        });
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| CoreError::Notification("pending alerts lock poisoned".into()))?;
        pending.retain(|t| !t.is_finished());
        pending.push(task);
        Ok(())
    }

    fn cancel_all_scheduled(&self) -> Result<()> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| CoreError::Notification("pending alerts lock poisoned".into()))?;
        let count = pending.len();
        for task in pending.drain(..) {
            task.abort();
        }
        debug!(count, "cancelled pending alerts");
        Ok(())
    }
}

/// Rings the terminal bell.
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play_completion_sound(&self) -> Result<()> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}
