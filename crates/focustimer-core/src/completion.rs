//! Session completion coordination.
//!
//! A session can be found finished by two paths: a tick taking the
//! remaining time to zero, or the lifecycle reconciler discovering that the
//! session ran out while the app was suspended. The coordinator is the single
//! gate both paths go through, and it fires at most once per zero-crossing.

use tracing::debug;

use crate::timer::{duration_minutes, SessionKind, TimerState};

/// What finished, captured before the state machine advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub kind: SessionKind,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct CompletionCoordinator {
    /// Cleared when a completion fires, set again once a session with time
    /// left is observed.
    armed: bool,
    fired: u64,
}

impl CompletionCoordinator {
    pub fn new() -> Self {
        Self { armed: true, fired: 0 }
    }

    /// Inspect the state after a transition. Fires when the remaining time
    /// sits at zero on an unpaused timer.
    pub fn observe(&mut self, state: &TimerState) -> Option<Completion> {
        if state.remaining_time > 0 {
            self.armed = true;
            return None;
        }
        if state.is_paused {
            return None;
        }
        self.fire(state)
    }

    /// Fire for the current session regardless of its remaining time. Used
    /// by the reconciler, which knows the session is over before the state
    /// says so.
    pub fn fire(&mut self, state: &TimerState) -> Option<Completion> {
        if !self.armed {
            debug!(session = %state.current_session, "completion already fired for this session");
            return None;
        }
        self.armed = false;
        self.fired += 1;
        Some(Completion {
            kind: state.current_session,
            duration_minutes: duration_minutes(state, state.current_session),
        })
    }

    /// Total completions fired by this coordinator.
    pub fn fired_count(&self) -> u64 {
        self.fired
    }
}

impl Default for CompletionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_zero() -> TimerState {
        TimerState {
            remaining_time: 0,
            ..TimerState::default()
        }
    }

    #[test]
    fn fires_once_at_zero() {
        let mut c = CompletionCoordinator::new();
        let done = c.observe(&at_zero()).expect("should fire");
        assert_eq!(done.kind, SessionKind::Focus);
        assert_eq!(done.duration_minutes, 25);
        assert!(c.observe(&at_zero()).is_none());
        assert_eq!(c.fired_count(), 1);
    }

    #[test]
    fn rearms_after_time_is_restored() {
        let mut c = CompletionCoordinator::new();
        assert!(c.observe(&at_zero()).is_some());
        assert!(c.observe(&TimerState::default()).is_none());
        assert!(c.observe(&at_zero()).is_some());
        assert_eq!(c.fired_count(), 2);
    }

    #[test]
    fn paused_at_zero_does_not_fire() {
        let mut c = CompletionCoordinator::new();
        let paused = TimerState {
            is_paused: true,
            ..at_zero()
        };
        assert!(c.observe(&paused).is_none());
    }

    #[test]
    fn direct_fire_suppresses_tick_path() {
        let mut c = CompletionCoordinator::new();
        let running = TimerState {
            is_running: true,
            remaining_time: 30,
            ..TimerState::default()
        };
        c.observe(&running);
        assert!(c.fire(&running).is_some());
        assert!(c.observe(&at_zero()).is_none());
        assert_eq!(c.fired_count(), 1);
    }
}
