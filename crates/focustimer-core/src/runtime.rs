//! Actor runtime.
//!
//! One tokio task owns the [`TimerController`]. User commands, lifecycle
//! signals and driver ticks all arrive through a single inbox and are handled
//! one at a time, so state is never mutated concurrently. Effects go to the
//! effect worker; events go out on a broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::collaborators::Collaborators;
use crate::controller::{Outcome, TimerController};
use crate::driver::{TickDriver, TICK_PERIOD};
use crate::effects::EffectWorker;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::lifecycle::AppLifecycle;
use crate::timer::{SessionKind, SettingsPatch, TimerState};

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub tick_period: Duration,
    pub inbox_capacity: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_period: TICK_PERIOD,
            inbox_capacity: 64,
            event_capacity: 256,
        }
    }
}

#[derive(Debug)]
enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    Switch(SessionKind),
    UpdateSettings(SettingsPatch),
    SetDuration { kind: SessionKind, minutes: u32 },
    AppState(AppLifecycle),
    Tick { generation: u64 },
    Snapshot(oneshot::Sender<TimerState>),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a running timer.
#[derive(Clone)]
pub struct TimerHandle {
    inbox: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl TimerHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.inbox
            .send(command)
            .await
            .map_err(|_| CoreError::RuntimeClosed)
    }

    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(Command::Resume).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    pub async fn switch_session(&self, kind: SessionKind) -> Result<()> {
        self.send(Command::Switch(kind)).await
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<()> {
        self.send(Command::UpdateSettings(patch)).await
    }

    pub async fn set_duration(&self, kind: SessionKind, minutes: u32) -> Result<()> {
        self.send(Command::SetDuration { kind, minutes }).await
    }

    pub async fn app_state_changed(&self, state: AppLifecycle) -> Result<()> {
        self.send(Command::AppState(state)).await
    }

    /// Current timer state, after every command sent before this call.
    pub async fn snapshot(&self) -> Result<TimerState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Wait until every command sent before this call has been handled and
    /// the effects it produced have run.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Flush(tx)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    /// Stop the actor after draining pending effects.
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }
}

pub struct TimerRuntime;

impl TimerRuntime {
    /// Spawn the actor and its effect worker on the current tokio runtime.
    pub fn spawn(
        controller: TimerController,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
        options: RuntimeOptions,
    ) -> (TimerHandle, JoinHandle<()>) {
        let (inbox_tx, inbox_rx) = mpsc::channel(options.inbox_capacity.max(1));
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        let (worker, worker_handle) = EffectWorker::spawn(collaborators);
        let driver = TickDriver::new(
            &inbox_tx,
            |generation| Command::Tick { generation },
            options.tick_period,
        );

        let actor = Actor {
            controller,
            driver,
            worker,
            events: events.clone(),
            clock,
        };
        let handle = tokio::spawn(actor.run(inbox_rx, worker_handle));
        (
            TimerHandle {
                inbox: inbox_tx,
                events,
            },
            handle,
        )
    }
}

struct Actor {
    controller: TimerController,
    driver: TickDriver<Command>,
    worker: EffectWorker,
    events: broadcast::Sender<Event>,
    clock: Arc<dyn Clock>,
}

impl Actor {
    async fn run(mut self, mut inbox: mpsc::Receiver<Command>, worker_handle: JoinHandle<()>) {
        info!(state = ?self.controller.state().phase(), "timer runtime started");
        self.driver.sync(self.controller.wants_ticks());

        while let Some(command) = inbox.recv().await {
            match command {
                Command::Snapshot(reply) => {
                    let _ = reply.send(self.controller.state().clone());
                }
                Command::Flush(reply) => {
                    let _ = self.worker.flush().await;
                    let _ = reply.send(());
                }
                Command::Shutdown(reply) => {
                    self.driver.disarm();
                    let _ = self.worker.flush().await;
                    let _ = reply.send(());
                    break;
                }
                command => {
                    let outcome = self.handle(command);
                    self.publish(outcome);
                    self.driver.sync(self.controller.wants_ticks());
                }
            }
        }

        self.driver.disarm();
        drop(self.worker);
        let _ = worker_handle.await;
        info!("timer runtime stopped");
    }

    fn handle(&mut self, command: Command) -> Outcome {
        let now = self.clock.now_ms();
        let c = &mut self.controller;
        match command {
            Command::Start => c.start(now),
            Command::Pause => c.pause(now),
            Command::Resume => c.resume(now),
            Command::Stop => c.stop(now),
            Command::Reset => c.reset(now),
            Command::Switch(kind) => c.switch_session(kind, now),
            Command::UpdateSettings(patch) => c.update_settings(patch, now),
            Command::SetDuration { kind, minutes } => c.set_duration(kind, minutes, now),
            Command::AppState(next) => c.app_state_changed(next, now),
            Command::Tick { generation } => {
                if !self.driver.is_current(generation) || !c.wants_ticks() {
                    trace!(generation, "dropping stale tick");
                    return Outcome::default();
                }
                c.tick(now)
            }
            Command::Snapshot(_) | Command::Flush(_) | Command::Shutdown(_) => {
                Outcome::default()
            }
        }
    }

    fn publish(&self, outcome: Outcome) {
        for effect in outcome.effects {
            self.worker.submit(effect);
        }
        for event in outcome.events {
            // No subscribers is fine.
            if self.events.send(event).is_err() {
                debug!("event dropped; no subscribers");
            }
        }
    }
}
