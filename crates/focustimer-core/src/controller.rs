//! Synchronous timer controller.
//!
//! Owns the [`TimerState`] together with the lifecycle reconciler and the
//! completion coordinator. Every command applies one or more state-machine
//! actions and returns an [`Outcome`]: the side effects to run and the events
//! to publish. Nothing in here blocks or talks to a collaborator, so the
//! controller can be driven directly in tests or from the async runtime.

use tracing::{debug, info, warn};

use crate::collaborators::{CompletionNotice, KeyValueStore};
use crate::completion::{Completion, CompletionCoordinator};
use crate::effects::Effect;
use crate::events::{timestamp, Event};
use crate::lifecycle::{AppLifecycle, LifecycleEdge, LifecycleReconciler, Reconciliation};
use crate::storage::snapshot::{self, ConfigRecord, RecoverySnapshot};
use crate::timer::{apply, Action, SessionKind, SettingsPatch, StatePatch, TimerState};

/// What a command produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub effects: Vec<Effect>,
    pub events: Vec<Event>,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.events.is_empty()
    }

    fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    fn event(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[derive(Debug, Clone)]
pub struct TimerController {
    state: TimerState,
    reconciler: LifecycleReconciler,
    coordinator: CompletionCoordinator,
}

impl TimerController {
    pub fn new(state: TimerState, app: AppLifecycle) -> Self {
        Self {
            state,
            reconciler: LifecycleReconciler::new(app),
            coordinator: CompletionCoordinator::new(),
        }
    }

    /// Cold start from the persisted records.
    ///
    /// The timer always comes up idle. A background-recovery snapshot left
    /// behind by a process that never returned to the foreground is dropped;
    /// alerting for it is the background check's job.
    pub fn restore(store: &dyn KeyValueStore, app: AppLifecycle) -> Self {
        Self::restore_over(TimerState::default(), store, app)
    }

    /// [`restore`](Self::restore) with `base` supplying defaults, typically
    /// from the configuration file.
    pub fn restore_over(base: TimerState, store: &dyn KeyValueStore, app: AppLifecycle) -> Self {
        let state = snapshot::load_timer_state_over(base, store);
        match snapshot::load_recovery(store) {
            Ok(Some(stale)) => {
                info!(
                    session = %stale.state.current_session,
                    remaining = stale.state.remaining_time,
                    "discarding recovery snapshot from a previous run"
                );
                if let Err(err) = snapshot::clear_recovery(store) {
                    warn!(error = %err, "failed to clear recovery snapshot");
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "discarding unreadable recovery snapshot");
                if let Err(err) = snapshot::clear_recovery(store) {
                    warn!(error = %err, "failed to clear recovery snapshot");
                }
            }
        }
        info!(
            session_count = state.session_count,
            focus = state.focus_duration,
            "timer restored"
        );
        Self::new(state, app)
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn lifecycle(&self) -> AppLifecycle {
        self.reconciler.current()
    }

    pub fn completions_fired(&self) -> u64 {
        self.coordinator.fired_count()
    }

    /// The tick driver runs only while a session is running in the foreground.
    pub fn wants_ticks(&self) -> bool {
        self.state.is_running && self.reconciler.is_foreground()
    }

    pub fn snapshot_event(&self, now_ms: u64) -> Event {
        Event::snapshot(&self.state, timestamp(now_ms))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        let from_idle = !self.state.is_running && !self.state.is_paused;
        if self.state.is_running {
            debug!("start ignored; already running");
            return out;
        }
        self.dispatch(Action::Start, &mut out);
        if from_idle {
            out.effect(Effect::RecordSessionStart(self.state.current_session));
        }
        out.event(Event::TimerStarted {
            session: self.state.current_session,
            remaining_secs: self.state.remaining_time,
            at: timestamp(now_ms),
        });
        if !self.reconciler.is_foreground() {
            self.suspend_running(now_ms, &mut out);
        }
        self.settle(now_ms, &mut out);
        out
    }

    pub fn pause(&mut self, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        self.catch_up(now_ms, &mut out);
        if !self.state.is_running {
            return out;
        }
        self.dispatch(Action::Pause, &mut out);
        self.leave_running(&mut out);
        out.event(Event::TimerPaused {
            remaining_secs: self.state.remaining_time,
            at: timestamp(now_ms),
        });
        out
    }

    pub fn resume(&mut self, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        if !self.state.is_paused {
            return out;
        }
        self.dispatch(Action::Resume, &mut out);
        out.event(Event::TimerResumed {
            remaining_secs: self.state.remaining_time,
            at: timestamp(now_ms),
        });
        if !self.reconciler.is_foreground() {
            self.suspend_running(now_ms, &mut out);
        }
        self.settle(now_ms, &mut out);
        out
    }

    pub fn stop(&mut self, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        self.catch_up(now_ms, &mut out);
        self.dispatch(Action::Stop, &mut out);
        self.leave_running(&mut out);
        out.event(Event::TimerStopped {
            remaining_secs: self.state.remaining_time,
            at: timestamp(now_ms),
        });
        out
    }

    pub fn reset(&mut self, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        self.dispatch(Action::Reset, &mut out);
        self.leave_running(&mut out);
        out.event(Event::TimerReset {
            session: self.state.current_session,
            remaining_secs: self.state.remaining_time,
            at: timestamp(now_ms),
        });
        out
    }

    pub fn switch_session(&mut self, kind: SessionKind, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        let from = self.state.current_session;
        self.dispatch(Action::SwitchSession(kind), &mut out);
        self.leave_running(&mut out);
        out.event(Event::SessionSwitched {
            from,
            to: kind,
            remaining_secs: self.state.remaining_time,
            at: timestamp(now_ms),
        });
        out
    }

    pub fn update_settings(&mut self, patch: SettingsPatch, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        if patch.is_empty() {
            return out;
        }
        let notifications_were_on = self.state.settings.notifications_enabled;
        self.dispatch(Action::UpdateSettings(patch), &mut out);
        if notifications_were_on && !self.state.settings.notifications_enabled {
            out.effect(Effect::CancelNotifications);
        }
        out.event(Event::SettingsUpdated {
            settings: self.state.settings,
            at: timestamp(now_ms),
        });
        out
    }

    /// `minutes` should already be clamped to the configured limits.
    pub fn set_duration(&mut self, kind: SessionKind, minutes: u32, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        self.dispatch(Action::SetDuration { kind, minutes }, &mut out);
        out.event(Event::DurationChanged {
            session: kind,
            minutes: crate::timer::duration_minutes(&self.state, kind),
            remaining_secs: self.state.remaining_time,
            at: timestamp(now_ms),
        });
        self.settle(now_ms, &mut out);
        out
    }

    /// One second elapsed on the tick driver.
    pub fn tick(&mut self, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        if !self.state.is_running {
            return out;
        }
        self.dispatch(Action::Tick, &mut out);
        self.settle(now_ms, &mut out);
        if out.events.is_empty() {
            out.event(self.snapshot_event(now_ms));
        }
        out
    }

    pub fn app_state_changed(&mut self, next: AppLifecycle, now_ms: u64) -> Outcome {
        let mut out = Outcome::default();
        match self.reconciler.transition(next) {
            Some(LifecycleEdge::EnteredBackground) => {
                debug!(?next, "entered background");
                if self.state.is_running {
                    self.suspend_running(now_ms, &mut out);
                }
            }
            Some(LifecycleEdge::EnteredForeground) => {
                debug!("entered foreground");
                out.effect(Effect::CancelNotifications);
                let tracked = self.reconciler.background_since_ms().is_some();
                self.reconcile(now_ms, &mut out);
                if tracked {
                    out.effect(Effect::ClearRecovery);
                }
            }
            None => {}
        }
        out
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Apply one action and queue persistence for any durable field it changed.
    fn dispatch(&mut self, action: Action, out: &mut Outcome) {
        let before = ConfigRecord::from_state(&self.state);
        let settings_before = self.state.settings;
        debug!(?action, "apply");
        self.state = apply(&self.state, &action);

        let after = ConfigRecord::from_state(&self.state);
        if after != before {
            out.effect(Effect::PersistConfig(after));
        }
        if self.state.settings != settings_before {
            out.effect(Effect::PersistSettings(self.state.settings));
        }
    }

    /// Fire the coordinator if the last transition reached zero.
    fn settle(&mut self, now_ms: u64, out: &mut Outcome) {
        if let Some(completion) = self.coordinator.observe(&self.state) {
            self.complete(completion, now_ms, out);
        }
    }

    fn complete(&mut self, completion: Completion, now_ms: u64, out: &mut Outcome) {
        info!(
            session = %completion.kind,
            minutes = completion.duration_minutes,
            "session complete"
        );
        if self.state.settings.sound_enabled {
            out.effect(Effect::PlayCompletionSound);
        }
        out.effect(Effect::RecordSessionComplete {
            kind: completion.kind,
            duration_minutes: completion.duration_minutes,
        });
        out.effect(Effect::CancelNotifications);

        self.reconciler.clear();
        self.dispatch(Action::CompleteSession, out);
        // Re-arm for the session that just started.
        self.coordinator.observe(&self.state);

        out.event(Event::SessionCompleted {
            completed: completion.kind,
            duration_min: completion.duration_minutes,
            next: self.state.current_session,
            session_count: self.state.session_count,
            at: timestamp(now_ms),
        });
    }

    /// A running session is now out of the foreground: remember when, save a
    /// recovery copy and schedule the completion alert.
    fn suspend_running(&mut self, now_ms: u64, out: &mut Outcome) {
        self.reconciler.mark_background(now_ms);
        out.effect(Effect::PersistRecovery(RecoverySnapshot {
            state: self.state.clone(),
            background_timestamp: now_ms,
        }));
        out.effect(Effect::CancelNotifications);
        if self.state.settings.notifications_enabled {
            out.effect(Effect::ScheduleNotification(CompletionNotice::for_session(
                self.state.current_session,
                u64::from(self.state.remaining_time),
                &self.state.settings,
            )));
        }
    }

    /// The session stopped running; drop anything tied to it.
    fn leave_running(&mut self, out: &mut Outcome) {
        out.effect(Effect::CancelNotifications);
        if self.reconciler.background_since_ms().is_some() {
            self.reconciler.clear();
            out.effect(Effect::ClearRecovery);
        }
    }

    /// Bring the remaining time up to date before a command that keeps it,
    /// when the session has been running out of the foreground.
    fn catch_up(&mut self, now_ms: u64, out: &mut Outcome) {
        if self.reconciler.is_foreground() || !self.state.is_running {
            return;
        }
        let tracked = self.reconciler.background_since_ms().is_some();
        self.reconcile(now_ms, out);
        if self.state.is_running {
            self.reconciler.mark_background(now_ms);
        } else if tracked {
            // Completed while suspended; the recovery copy is spent.
            out.effect(Effect::ClearRecovery);
        }
    }

    fn reconcile(&mut self, now_ms: u64, out: &mut Outcome) {
        if !self.state.is_running {
            self.reconciler.clear();
            return;
        }
        match self.reconciler.reconcile(self.state.remaining_time, now_ms) {
            Reconciliation::Unchanged => {}
            Reconciliation::Adjusted {
                elapsed_secs,
                remaining_secs,
            } => {
                info!(elapsed_secs, remaining_secs, "remaining time reconciled");
                self.dispatch(Action::LoadState(StatePatch::remaining(remaining_secs)), out);
                out.event(Event::Reconciled {
                    elapsed_secs,
                    remaining_secs,
                    at: timestamp(now_ms),
                });
            }
            Reconciliation::Completed { elapsed_secs } => {
                info!(elapsed_secs, "session ran out while suspended");
                out.event(Event::Reconciled {
                    elapsed_secs,
                    remaining_secs: 0,
                    at: timestamp(now_ms),
                });
                if let Some(completion) = self.coordinator.fire(&self.state) {
                    self.complete(completion, now_ms, out);
                }
            }
        }
    }
}

impl Default for TimerController {
    fn default() -> Self {
        Self::new(TimerState::default(), AppLifecycle::Active)
    }
}
