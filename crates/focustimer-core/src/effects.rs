//! Side effects requested by the controller and the worker that performs them.
//!
//! The controller never calls a collaborator itself. It returns [`Effect`]
//! values; the runtime hands them to an [`EffectWorker`], which runs them in
//! order on its own task. A failed effect is logged and dropped, so state
//! transitions never wait on, or roll back because of, the outside world.

use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};
use tracing::{debug, warn};

use crate::collaborators::{Collaborators, CompletionNotice};
use crate::error::Result;
use crate::storage::snapshot::{self, ConfigRecord, RecoverySnapshot};
use crate::timer::{SessionKind, TimerSettings};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RecordSessionStart(SessionKind),
    RecordSessionComplete { kind: SessionKind, duration_minutes: u32 },
    PlayCompletionSound,
    ScheduleNotification(CompletionNotice),
    CancelNotifications,
    PersistConfig(ConfigRecord),
    PersistSettings(TimerSettings),
    PersistRecovery(RecoverySnapshot),
    ClearRecovery,
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::RecordSessionStart(_) => "record_session_start",
            Effect::RecordSessionComplete { .. } => "record_session_complete",
            Effect::PlayCompletionSound => "play_completion_sound",
            Effect::ScheduleNotification(_) => "schedule_notification",
            Effect::CancelNotifications => "cancel_notifications",
            Effect::PersistConfig(_) => "persist_config",
            Effect::PersistSettings(_) => "persist_settings",
            Effect::PersistRecovery(_) => "persist_recovery",
            Effect::ClearRecovery => "clear_recovery",
        }
    }
}

fn perform(collaborators: &Collaborators, effect: &Effect) -> Result<()> {
    match effect {
        Effect::RecordSessionStart(kind) => collaborators.stats.record_session_start(*kind),
        Effect::RecordSessionComplete { kind, duration_minutes } => collaborators
            .stats
            .record_session_complete(*kind, *duration_minutes),
        Effect::PlayCompletionSound => collaborators.sound.play_completion_sound(),
        Effect::ScheduleNotification(notice) => collaborators.notifier.schedule_completion(notice),
        Effect::CancelNotifications => collaborators.notifier.cancel_all_scheduled(),
        Effect::PersistConfig(record) => snapshot::save_config(collaborators.store.as_ref(), record),
        Effect::PersistSettings(settings) => {
            snapshot::save_settings(collaborators.store.as_ref(), settings)
        }
        Effect::PersistRecovery(recovery) => {
            snapshot::save_recovery(collaborators.store.as_ref(), recovery)
        }
        Effect::ClearRecovery => snapshot::clear_recovery(collaborators.store.as_ref()),
    }
}

/// Run one effect, containing any failure.
pub fn execute(collaborators: &Collaborators, effect: &Effect) {
    debug!(effect = effect.name(), "executing effect");
    if let Err(err) = perform(collaborators, effect) {
        warn!(effect = effect.name(), error = %err, "effect failed; continuing");
    }
}

enum Job {
    Run(Effect),
    Flush(oneshot::Sender<()>),
}

/// Sequential executor for effects, fed from the runtime.
#[derive(Clone)]
pub struct EffectWorker {
    jobs: mpsc::UnboundedSender<Job>,
}

impl EffectWorker {
    /// Spawn the worker task on the current tokio runtime.
    pub fn spawn(collaborators: Collaborators) -> (Self, JoinHandle<()>) {
        let (jobs, mut inbox) = mpsc::unbounded_channel::<Job>();
        let handle = tokio::spawn(async move {
            while let Some(job) = inbox.recv().await {
                match job {
                    Job::Run(effect) => {
                        // Collaborators do blocking IO (SQLite, audio).
                        let collaborators = collaborators.clone();
                        let task = task::spawn_blocking(move || execute(&collaborators, &effect));
                        if let Err(err) = task.await {
                            warn!(error = %err, "effect task failed");
                        }
                    }
                    Job::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("effect worker shutting down");
        });
        (Self { jobs }, handle)
    }

    pub fn submit(&self, effect: Effect) {
        if self.jobs.send(Job::Run(effect)).is_err() {
            warn!("effect worker is gone; dropping effect");
        }
    }

    /// Resolves once every effect submitted before this call has run.
    pub fn flush(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if let Err(mpsc::error::SendError(Job::Flush(tx))) = self.jobs.send(Job::Flush(tx)) {
            let _ = tx.send(());
        }
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{KeyValueStore, MemoryStore, Silent, SoundPlayer};
    use crate::error::CoreError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc as std_mpsc, Arc, Mutex};
    use std::time::Duration;

    struct BrokenSpeaker;

    impl SoundPlayer for BrokenSpeaker {
        fn play_completion_sound(&self) -> Result<()> {
            Err(CoreError::Sound("no audio device".into()))
        }
    }

    #[test]
    fn failures_are_contained() {
        let mut collaborators = Collaborators::detached();
        collaborators.sound = Arc::new(BrokenSpeaker);
        execute(&collaborators, &Effect::PlayCompletionSound);
    }

    #[tokio::test]
    async fn worker_runs_effects_in_order() {
        let store = Arc::new(MemoryStore::new());
        let collaborators = Collaborators {
            stats: Arc::new(Silent),
            notifier: Arc::new(Silent),
            sound: Arc::new(Silent),
            store: store.clone(),
        };
        let (worker, _handle) = EffectWorker::spawn(collaborators);
        worker.submit(Effect::PersistSettings(TimerSettings::default()));
        worker.submit(Effect::PersistSettings(TimerSettings {
            sound_enabled: false,
            ..TimerSettings::default()
        }));
        worker.flush().await.unwrap();

        let raw = store.get(snapshot::SETTINGS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"soundEnabled\":false"));
    }

    struct GatedSpeaker {
        gate: Mutex<std_mpsc::Receiver<()>>,
        opened: AtomicBool,
    }

    impl SoundPlayer for GatedSpeaker {
        fn play_completion_sound(&self) -> Result<()> {
            let gate = self.gate.lock().unwrap();
            if gate.recv_timeout(Duration::from_secs(2)).is_ok() {
                self.opened.store(true, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn blocking_effects_do_not_stall_the_runtime() {
        let (open, gate) = std_mpsc::channel();
        let speaker = Arc::new(GatedSpeaker {
            gate: Mutex::new(gate),
            opened: AtomicBool::new(false),
        });
        let mut collaborators = Collaborators::detached();
        collaborators.sound = speaker.clone();
        let (worker, _handle) = EffectWorker::spawn(collaborators);

        worker.submit(Effect::PlayCompletionSound);
        // Only reachable while the effect is blocked if it is off this thread.
        tokio::time::sleep(Duration::from_millis(20)).await;
        open.send(()).unwrap();
        worker.flush().await.unwrap();

        assert!(speaker.opened.load(Ordering::SeqCst));
    }
}
