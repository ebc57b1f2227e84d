//! Duration policy and session cadence.
//!
//! Pure lookups over [`TimerState`]; nothing here mutates.

use super::session::SessionKind;
use super::state::TimerState;

/// Configured duration in minutes for `kind`.
pub fn duration_minutes(state: &TimerState, kind: SessionKind) -> u32 {
    match kind {
        SessionKind::Focus => state.focus_duration,
        SessionKind::Break => state.break_duration,
        SessionKind::LongBreak => state.long_break_duration,
    }
}

/// Configured duration in seconds for `kind`.
pub fn duration_secs(state: &TimerState, kind: SessionKind) -> u32 {
    duration_minutes(state, kind).saturating_mul(60)
}

/// Session that follows `current`.
///
/// `completed_focus` is the focus count *after* counting the session that
/// just finished. Breaks never chain and focus never follows itself.
pub fn next_session(current: SessionKind, completed_focus: u32, long_break_interval: u32) -> SessionKind {
    match current {
        SessionKind::Focus => {
            // An interval of zero can only come from a trusted LoadState; treat it as 1.
            if completed_focus % long_break_interval.max(1) == 0 {
                SessionKind::LongBreak
            } else {
                SessionKind::Break
            }
        }
        SessionKind::Break | SessionKind::LongBreak => SessionKind::Focus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_follow_state() {
        let state = TimerState {
            focus_duration: 50,
            break_duration: 10,
            long_break_duration: 30,
            ..TimerState::default()
        };
        assert_eq!(duration_minutes(&state, SessionKind::Focus), 50);
        assert_eq!(duration_minutes(&state, SessionKind::Break), 10);
        assert_eq!(duration_secs(&state, SessionKind::LongBreak), 1800);
    }

    #[test]
    fn every_fourth_focus_earns_long_break() {
        assert_eq!(next_session(SessionKind::Focus, 1, 4), SessionKind::Break);
        assert_eq!(next_session(SessionKind::Focus, 3, 4), SessionKind::Break);
        assert_eq!(next_session(SessionKind::Focus, 4, 4), SessionKind::LongBreak);
        assert_eq!(next_session(SessionKind::Focus, 8, 4), SessionKind::LongBreak);
    }

    #[test]
    fn breaks_return_to_focus() {
        assert_eq!(next_session(SessionKind::Break, 3, 4), SessionKind::Focus);
        assert_eq!(next_session(SessionKind::LongBreak, 4, 4), SessionKind::Focus);
    }

    #[test]
    fn zero_interval_does_not_panic() {
        assert_eq!(next_session(SessionKind::Focus, 2, 0), SessionKind::LongBreak);
    }
}
