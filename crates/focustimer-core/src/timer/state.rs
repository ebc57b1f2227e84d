use serde::{Deserialize, Serialize};

use super::policy;
use super::session::SessionKind;

pub const DEFAULT_FOCUS_MIN: u32 = 25;
pub const DEFAULT_BREAK_MIN: u32 = 5;
pub const DEFAULT_LONG_BREAK_MIN: u32 = 15;
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

/// User-facing toggles for completion side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            sound_enabled: true,
            vibration_enabled: true,
        }
    }
}

/// Partial settings update. Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn merge_into(&self, settings: TimerSettings) -> TimerSettings {
        TimerSettings {
            notifications_enabled: self
                .notifications_enabled
                .unwrap_or(settings.notifications_enabled),
            sound_enabled: self.sound_enabled.unwrap_or(settings.sound_enabled),
            vibration_enabled: self.vibration_enabled.unwrap_or(settings.vibration_enabled),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notifications_enabled.is_none()
            && self.sound_enabled.is_none()
            && self.vibration_enabled.is_none()
    }
}

/// Coarse phase derived from the running/paused flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
}

/// The timer's only mutable entity.
///
/// Mutated exclusively through [`super::apply`]. `is_running` and
/// `is_paused` are never both true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_running: bool,
    pub is_paused: bool,
    pub current_session: SessionKind,
    /// Seconds left in the current session.
    pub remaining_time: u32,
    /// Completed focus sessions; drives the long-break cadence.
    pub session_count: u32,
    /// Minutes.
    pub focus_duration: u32,
    /// Minutes.
    pub break_duration: u32,
    /// Minutes.
    pub long_break_duration: u32,
    pub long_break_interval: u32,
    pub settings: TimerSettings,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            is_running: false,
            is_paused: false,
            current_session: SessionKind::Focus,
            remaining_time: DEFAULT_FOCUS_MIN * 60,
            session_count: 0,
            focus_duration: DEFAULT_FOCUS_MIN,
            break_duration: DEFAULT_BREAK_MIN,
            long_break_duration: DEFAULT_LONG_BREAK_MIN,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            settings: TimerSettings::default(),
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TimerPhase {
        if self.is_running {
            TimerPhase::Running
        } else if self.is_paused {
            TimerPhase::Paused
        } else {
            TimerPhase::Idle
        }
    }

    /// Full length of the current session in seconds.
    pub fn total_secs(&self) -> u32 {
        policy::duration_secs(self, self.current_session)
    }

    /// Remaining fraction of the current session, 1.0 at the start and 0.0 at the end.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        (self.remaining_time as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn formatted_time(&self) -> String {
        format_clock(self.remaining_time)
    }
}

/// Partial state used by `LoadState`. Fields are merged verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_running: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_session: Option<SessionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<TimerSettings>,
}

impl StatePatch {
    pub fn remaining(remaining_time: u32) -> Self {
        Self {
            remaining_time: Some(remaining_time),
            ..Self::default()
        }
    }

    pub fn merge_into(&self, state: &TimerState) -> TimerState {
        TimerState {
            is_running: self.is_running.unwrap_or(state.is_running),
            is_paused: self.is_paused.unwrap_or(state.is_paused),
            current_session: self.current_session.unwrap_or(state.current_session),
            remaining_time: self.remaining_time.unwrap_or(state.remaining_time),
            session_count: self.session_count.unwrap_or(state.session_count),
            focus_duration: self.focus_duration.unwrap_or(state.focus_duration),
            break_duration: self.break_duration.unwrap_or(state.break_duration),
            long_break_duration: self.long_break_duration.unwrap_or(state.long_break_duration),
            long_break_interval: self.long_break_interval.unwrap_or(state.long_break_interval),
            settings: self.settings.unwrap_or(state.settings),
        }
    }
}

/// Render seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
