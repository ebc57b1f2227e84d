mod machine;
mod policy;
mod session;
mod state;

pub use machine::{apply, Action};
pub use policy::{duration_minutes, duration_secs, next_session};
pub use session::SessionKind;
pub use state::{
    format_clock, SettingsPatch, StatePatch, TimerPhase, TimerSettings, TimerState,
    DEFAULT_BREAK_MIN, DEFAULT_FOCUS_MIN, DEFAULT_LONG_BREAK_INTERVAL, DEFAULT_LONG_BREAK_MIN,
};
