//! One-second tick driver.
//!
//! A single tokio interval task that posts a message into the runtime inbox
//! once per period. Arming and disarming are idempotent, and every arming
//! gets a fresh generation number so a tick already sitting in the inbox when
//! the driver was disarmed can be recognised and dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct TickDriver<T: Send + 'static> {
    inbox: mpsc::WeakSender<T>,
    make: fn(u64) -> T,
    period: Duration,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> TickDriver<T> {
    /// `make` wraps a generation number into the inbox message type. The
    /// driver does not keep the inbox open on its own.
    pub fn new(inbox: &mpsc::Sender<T>, make: fn(u64) -> T, period: Duration) -> Self {
        Self {
            inbox: inbox.downgrade(),
            make,
            period,
            generation: 0,
            ticker: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.ticker.is_some()
    }

    /// Generation of the current (or most recent) arming.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when a tick carrying `generation` comes from the live ticker.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_armed() && generation == self.generation
    }

    /// Arm or disarm so the driver matches `wanted`.
    pub fn sync(&mut self, wanted: bool) {
        if wanted {
            self.arm();
        } else {
            self.disarm();
        }
    }

    pub fn arm(&mut self) {
        if self.is_armed() {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        let inbox = self.inbox.clone();
        let make = self.make;
        let period = self.period;

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                trace!(generation, "tick");
                let Some(inbox) = inbox.upgrade() else {
                    break;
                };
                if inbox.send(make(generation)).await.is_err() {
                    break;
                }
            }
        }));
        debug!(generation, "tick driver armed");
    }

    pub fn disarm(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            debug!(generation = self.generation, "tick driver disarmed");
        }
    }
}

impl<T: Send + 'static> Drop for TickDriver<T> {
    fn drop(&mut self) {
        self.disarm();
    }
}
