//! Foreground/background tracking and wall-clock reconciliation.
//!
//! While the app is suspended the tick driver is off, so missed ticks are
//! never replayed. Instead the reconciler remembers when the app left the
//! foreground and, on return, measures the gap against the session's
//! remaining time.

use serde::{Deserialize, Serialize};

/// App lifecycle signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycle {
    Active,
    Inactive,
    Background,
}

impl AppLifecycle {
    /// Only `Active` counts as foreground; `Inactive` is treated like background.
    pub fn is_foreground(self) -> bool {
        matches!(self, AppLifecycle::Active)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" | "foreground" | "fg" => Some(AppLifecycle::Active),
            "inactive" => Some(AppLifecycle::Inactive),
            "background" | "bg" => Some(AppLifecycle::Background),
            _ => None,
        }
    }
}

impl Default for AppLifecycle {
    fn default() -> Self {
        AppLifecycle::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEdge {
    EnteredBackground,
    EnteredForeground,
}

/// Result of reconciling a foreground return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// No background timestamp was recorded; nothing to correct.
    Unchanged,
    /// Time passed but the session is still going.
    Adjusted { elapsed_secs: u64, remaining_secs: u32 },
    /// The session ran out while the app was away.
    Completed { elapsed_secs: u64 },
}

#[derive(Debug, Clone)]
pub struct LifecycleReconciler {
    current: AppLifecycle,
    background_since_ms: Option<u64>,
}

impl LifecycleReconciler {
    pub fn new(initial: AppLifecycle) -> Self {
        Self {
            current: initial,
            background_since_ms: None,
        }
    }

    pub fn current(&self) -> AppLifecycle {
        self.current
    }

    pub fn is_foreground(&self) -> bool {
        self.current.is_foreground()
    }

    pub fn background_since_ms(&self) -> Option<u64> {
        self.background_since_ms
    }

    /// Record the new lifecycle state and report whether the foreground
    /// boundary was crossed. Moving between `Inactive` and `Background` is
    /// not an edge.
    pub fn transition(&mut self, next: AppLifecycle) -> Option<LifecycleEdge> {
        let was_foreground = self.current.is_foreground();
        self.current = next;
        match (was_foreground, next.is_foreground()) {
            (true, false) => Some(LifecycleEdge::EnteredBackground),
            (false, true) => Some(LifecycleEdge::EnteredForeground),
            _ => None,
        }
    }

    /// Remember when a running session went to the background.
    pub fn mark_background(&mut self, now_ms: u64) {
        self.background_since_ms = Some(now_ms);
    }

    /// Forget any recorded background timestamp.
    pub fn clear(&mut self) {
        self.background_since_ms = None;
    }

    /// Consume the background timestamp and measure it against
    /// `remaining_secs`.
    pub fn reconcile(&mut self, remaining_secs: u32, now_ms: u64) -> Reconciliation {
        let Some(since) = self.background_since_ms.take() else {
            return Reconciliation::Unchanged;
        };
        let elapsed_secs = elapsed_secs(since, now_ms);
        if elapsed_secs >= u64::from(remaining_secs) {
            Reconciliation::Completed { elapsed_secs }
        } else {
            Reconciliation::Adjusted {
                elapsed_secs,
                remaining_secs: remaining_secs - elapsed_secs as u32,
            }
        }
    }
}

impl Default for LifecycleReconciler {
    fn default() -> Self {
        Self::new(AppLifecycle::Active)
    }
}

/// Whole seconds between two epoch-millisecond timestamps, floored. A clock
/// that went backwards counts as zero.
pub fn elapsed_secs(since_ms: u64, now_ms: u64) -> u64 {
    now_ms.saturating_sub(since_ms) / 1000
}
