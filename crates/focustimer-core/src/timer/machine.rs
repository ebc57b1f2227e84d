//! Timer state machine.
//!
//! A pure, total transition function over [`TimerState`]. Every action
//! yields a defined next state; an action whose precondition does not hold
//! leaves the state as it was instead of failing.
//!
//! ```text
//! Idle --Start--> Running --Pause--> Paused --Resume--> Running
//!   ^                |  \--Tick (remaining <= 1)--> Idle (remaining 0)
//!   +--Stop/Reset----+
//! ```

use super::policy::{duration_secs, next_session};
use super::session::SessionKind;
use super::state::{SettingsPatch, StatePatch, TimerState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    Tick,
    CompleteSession,
    SwitchSession(SessionKind),
    UpdateSettings(SettingsPatch),
    /// Minutes are expected to be clamped by the caller; zero is raised to one.
    SetDuration { kind: SessionKind, minutes: u32 },
    /// Trusted merge used at startup and by background reconciliation.
    LoadState(StatePatch),
}

/// Apply `action` to `state`, returning the next state.
pub fn apply(state: &TimerState, action: &Action) -> TimerState {
    let mut next = state.clone();
    match action {
        Action::Start => {
            next.is_running = true;
            next.is_paused = false;
        }
        Action::Pause => {
            if state.is_running {
                next.is_running = false;
                next.is_paused = true;
            }
        }
        Action::Resume => {
            if state.is_paused {
                next.is_running = true;
                next.is_paused = false;
            }
        }
        Action::Stop => {
            next.is_running = false;
            next.is_paused = false;
        }
        Action::Reset => {
            next.is_running = false;
            next.is_paused = false;
            next.remaining_time = duration_secs(state, state.current_session);
        }
        Action::Tick => {
            if state.remaining_time == 0 {
                return next;
            }
            if state.remaining_time <= 1 {
                next.remaining_time = 0;
                next.is_running = false;
            } else {
                next.remaining_time -= 1;
            }
        }
        Action::CompleteSession => {
            let session_count = if state.current_session == SessionKind::Focus {
                state.session_count.saturating_add(1)
            } else {
                state.session_count
            };
            let upcoming = next_session(state.current_session, session_count, state.long_break_interval);
            next.current_session = upcoming;
            next.session_count = session_count;
            next.remaining_time = duration_secs(state, upcoming);
            next.is_running = false;
            next.is_paused = false;
        }
        Action::SwitchSession(kind) => {
            next.current_session = *kind;
            next.remaining_time = duration_secs(state, *kind);
            next.is_running = false;
            next.is_paused = false;
        }
        Action::UpdateSettings(patch) => {
            next.settings = patch.merge_into(state.settings);
        }
        Action::SetDuration { kind, minutes } => {
            let minutes = (*minutes).max(1);
            match kind {
                SessionKind::Focus => next.focus_duration = minutes,
                SessionKind::Break => next.break_duration = minutes,
                SessionKind::LongBreak => next.long_break_duration = minutes,
            }
            if state.current_session == *kind && !state.is_running {
                next.remaining_time = minutes.saturating_mul(60);
            }
        }
        Action::LoadState(patch) => {
            next = patch.merge_into(state);
        }
    }
    next
}
