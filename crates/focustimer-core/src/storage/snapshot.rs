//! Persisted timer records.
//!
//! Three records live in the key-value store:
//! - `timer:state`: session count, the three durations and the long-break interval
//! - `timer:settings`: the notification/sound/vibration toggles
//! - `timer:background`: a full copy of a running timer plus the moment it
//!   went to the background, written only on that edge
//!
//! A record that cannot be decoded is discarded and the compiled-in defaults
//! stand for the fields it would have carried.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collaborators::KeyValueStore;
use crate::error::{Result, StorageError};
use crate::timer::{apply, Action, SettingsPatch, StatePatch, TimerSettings, TimerState};

pub const STATE_KEY: &str = "timer:state";
pub const SETTINGS_KEY: &str = "timer:settings";
pub const BACKGROUND_KEY: &str = "timer:background";

/// Durable configuration carried across cold starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    pub session_count: u32,
    pub focus_duration: u32,
    pub break_duration: u32,
    pub long_break_duration: u32,
    pub long_break_interval: u32,
}

impl ConfigRecord {
    pub fn from_state(state: &TimerState) -> Self {
        Self {
            session_count: state.session_count,
            focus_duration: state.focus_duration,
            break_duration: state.break_duration,
            long_break_duration: state.long_break_duration,
            long_break_interval: state.long_break_interval,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.focus_duration == 0 || self.break_duration == 0 || self.long_break_duration == 0 {
            return Err("durations must be positive".into());
        }
        if self.long_break_interval == 0 {
            return Err("long break interval must be positive".into());
        }
        Ok(())
    }

    fn into_patch(self) -> StatePatch {
        StatePatch {
            session_count: Some(self.session_count),
            focus_duration: Some(self.focus_duration),
            break_duration: Some(self.break_duration),
            long_break_duration: Some(self.long_break_duration),
            long_break_interval: Some(self.long_break_interval),
            ..StatePatch::default()
        }
    }
}

/// Copy of a running timer taken as the app leaves the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySnapshot {
    #[serde(flatten)]
    pub state: TimerState,
    /// Epoch milliseconds.
    pub background_timestamp: u64,
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|err| {
        StorageError::MalformedSnapshot {
            key: key.to_string(),
            message: err.to_string(),
        }
        .into()
    })
}

/// Read and decode `key`, logging and discarding anything unusable.
fn read_or_discard<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "failed to read persisted record");
            return None;
        }
    };
    match decode(key, &raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "discarding malformed record");
            None
        }
    }
}

/// Build the cold-start timer state from the persisted records.
///
/// Running/paused flags and remaining time are never restored: the timer
/// comes up idle on the current focus session with the restored durations.
pub fn load_timer_state(store: &dyn KeyValueStore) -> TimerState {
    load_timer_state_over(TimerState::default(), store)
}

/// Like [`load_timer_state`], with `base` standing in for whatever the
/// store does not provide.
pub fn load_timer_state_over(base: TimerState, store: &dyn KeyValueStore) -> TimerState {
    let mut patch = StatePatch::default();

    if let Some(record) = read_or_discard::<ConfigRecord>(store, STATE_KEY) {
        match record.validate() {
            Ok(()) => patch = record.into_patch(),
            Err(reason) => warn!(key = STATE_KEY, %reason, "discarding invalid record"),
        }
    }

    if let Some(settings) = read_or_discard::<SettingsPatch>(store, SETTINGS_KEY) {
        patch.settings = Some(settings.merge_into(base.settings));
    }

    let loaded = apply(&base, &Action::LoadState(patch));
    apply(&loaded, &Action::Reset)
}

pub fn save_config(store: &dyn KeyValueStore, record: &ConfigRecord) -> Result<()> {
    store.set(STATE_KEY, &serde_json::to_string(record)?)
}

pub fn save_settings(store: &dyn KeyValueStore, settings: &TimerSettings) -> Result<()> {
    store.set(SETTINGS_KEY, &serde_json::to_string(settings)?)
}

pub fn save_recovery(store: &dyn KeyValueStore, snapshot: &RecoverySnapshot) -> Result<()> {
    store.set(BACKGROUND_KEY, &serde_json::to_string(snapshot)?)
}

/// Read the background-recovery snapshot, if one was written.
pub fn load_recovery(store: &dyn KeyValueStore) -> Result<Option<RecoverySnapshot>> {
    match store.get(BACKGROUND_KEY)? {
        Some(raw) => decode(BACKGROUND_KEY, &raw).map(Some),
        None => Ok(None),
    }
}

pub fn clear_recovery(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(&[BACKGROUND_KEY])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MemoryStore;
    use crate::timer::SessionKind;

    #[test]
    fn empty_store_yields_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_timer_state(&store), TimerState::default());
    }

    #[test]
    fn restores_durations_and_count_but_not_running_state() {
        let store = MemoryStore::new();
        let record = ConfigRecord {
            session_count: 6,
            focus_duration: 50,
            break_duration: 10,
            long_break_duration: 30,
            long_break_interval: 3,
        };
        save_config(&store, &record).unwrap();

        let state = load_timer_state(&store);
        assert_eq!(state.session_count, 6);
        assert_eq!(state.focus_duration, 50);
        assert_eq!(state.long_break_interval, 3);
        assert_eq!(state.current_session, SessionKind::Focus);
        assert_eq!(state.remaining_time, 50 * 60);
        assert!(!state.is_running && !state.is_paused);
    }

    #[test]
    fn settings_merge_over_defaults() {
        let store = MemoryStore::new();
        store.set(SETTINGS_KEY, r#"{"soundEnabled":false}"#).unwrap();
        let state = load_timer_state(&store);
        assert!(!state.settings.sound_enabled);
        assert!(state.settings.notifications_enabled);
    }

    #[test]
    fn malformed_records_are_discarded() {
        let store = MemoryStore::new();
        store.set(STATE_KEY, "{not json").unwrap();
        store.set(SETTINGS_KEY, "\"loud\"").unwrap();
        assert_eq!(load_timer_state(&store), TimerState::default());
    }

    #[test]
    fn base_fills_what_the_store_lacks() {
        let store = MemoryStore::new();
        store.set(SETTINGS_KEY, r#"{"vibrationEnabled":false}"#).unwrap();
        let base = TimerState {
            focus_duration: 40,
            settings: TimerSettings {
                sound_enabled: false,
                ..TimerSettings::default()
            },
            ..TimerState::default()
        };
        let state = load_timer_state_over(base, &store);
        assert_eq!(state.remaining_time, 40 * 60);
        assert!(!state.settings.sound_enabled);
        assert!(!state.settings.vibration_enabled);
    }

    #[test]
    fn record_missing_fields_is_discarded() {
        let store = MemoryStore::new();
        store.set(STATE_KEY, r#"{"sessionCount":3}"#).unwrap();
        assert_eq!(load_timer_state(&store).session_count, 0);
    }

    #[test]
    fn zero_durations_are_rejected() {
        let store = MemoryStore::new();
        store
            .set(
                STATE_KEY,
                r#"{"sessionCount":2,"focusDuration":0,"breakDuration":5,"longBreakDuration":15,"longBreakInterval":4}"#,
            )
            .unwrap();
        assert_eq!(load_timer_state(&store), TimerState::default());
    }

    #[test]
    fn recovery_snapshot_flattens_state() {
        let store = MemoryStore::new();
        let snapshot = RecoverySnapshot {
            state: TimerState {
                is_running: true,
                remaining_time: 600,
                ..TimerState::default()
            },
            background_timestamp: 1_700_000_000_000,
        };
        save_recovery(&store, &snapshot).unwrap();

        let raw = store.get(BACKGROUND_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["remainingTime"], 600);
        assert_eq!(json["backgroundTimestamp"], 1_700_000_000_000u64);

        assert_eq!(load_recovery(&store).unwrap(), Some(snapshot));
        clear_recovery(&store).unwrap();
        assert_eq!(load_recovery(&store).unwrap(), None);
    }

    #[test]
    fn malformed_recovery_is_an_error() {
        let store = MemoryStore::new();
        store.set(BACKGROUND_KEY, "{}").unwrap();
        assert!(load_recovery(&store).is_err());
    }
}
