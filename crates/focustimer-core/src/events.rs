use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionKind, TimerPhase, TimerSettings, TimerState};

/// Every state change in the timer produces an Event.
/// Front ends subscribe to them; none of them feed back into the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session: SessionKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerStopped {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        session: SessionKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionSwitched {
        from: SessionKind,
        to: SessionKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        completed: SessionKind,
        duration_min: u32,
        next: SessionKind,
        session_count: u32,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        settings: TimerSettings,
        at: DateTime<Utc>,
    },
    DurationChanged {
        session: SessionKind,
        minutes: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Remaining time was corrected after the app returned from the background.
    Reconciled {
        elapsed_secs: u64,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        session: SessionKind,
        session_label: String,
        remaining_secs: u32,
        total_secs: u32,
        formatted_time: String,
        progress: f64,
        session_count: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Build a full state snapshot event.
    pub fn snapshot(state: &TimerState, at: DateTime<Utc>) -> Self {
        Event::StateSnapshot {
            phase: state.phase(),
            session: state.current_session,
            session_label: state.current_session.display_text().to_string(),
            remaining_secs: state.remaining_time,
            total_secs: state.total_secs(),
            formatted_time: state.formatted_time(),
            progress: state.progress(),
            session_count: state.session_count,
            at,
        }
    }
}

/// Convert epoch milliseconds into an event timestamp.
pub fn timestamp(now_ms: u64) -> DateTime<Utc> {
    i64::try_from(now_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
