//! Interfaces to the outside world.
//!
//! Statistics, notifications, sound and durable storage are reached only
//! through these traits. Every call returns a `Result` so the effect boundary
//! can log a failure; nothing that goes wrong here feeds back into the timer
//! state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{CoreError, Result};
use crate::timer::{SessionKind, TimerSettings};

pub trait StatisticsRecorder: Send + Sync {
    fn record_session_start(&self, kind: SessionKind) -> Result<()>;
    fn record_session_complete(&self, kind: SessionKind, duration_minutes: u32) -> Result<()>;
}

pub trait NotificationScheduler: Send + Sync {
    /// Schedule a completion alert. Callers cancel any earlier alert first.
    fn schedule_completion(&self, notice: &CompletionNotice) -> Result<()>;
    /// Cancel every pending alert. Cancelling nothing is not an error.
    fn cancel_all_scheduled(&self) -> Result<()>;
}

pub trait SoundPlayer: Send + Sync {
    fn play_completion_sound(&self) -> Result<()>;
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// A local notification announcing that a session has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    pub kind: SessionKind,
    /// Seconds from now; zero means deliver immediately.
    pub delay_secs: u64,
    pub sound: bool,
    pub vibration: bool,
    pub title: String,
    pub body: String,
}

impl CompletionNotice {
    pub fn for_session(kind: SessionKind, delay_secs: u64, settings: &TimerSettings) -> Self {
        Self {
            kind,
            delay_secs,
            sound: settings.sound_enabled,
            vibration: settings.vibration_enabled,
            title: kind.completion_title(),
            body: kind.completion_body().to_string(),
        }
    }
}

/// The full set of collaborators the runtime drives.
#[derive(Clone)]
pub struct Collaborators {
    pub stats: Arc<dyn StatisticsRecorder>,
    pub notifier: Arc<dyn NotificationScheduler>,
    pub sound: Arc<dyn SoundPlayer>,
    pub store: Arc<dyn KeyValueStore>,
}

impl Collaborators {
    /// Collaborators that do nothing, backed by an in-memory store.
    pub fn detached() -> Self {
        Self {
            stats: Arc::new(Silent),
            notifier: Arc::new(Silent),
            sound: Arc::new(Silent),
            store: Arc::new(MemoryStore::new()),
        }
    }
}

/// No-op statistics, notifications and sound.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl StatisticsRecorder for Silent {
    fn record_session_start(&self, _kind: SessionKind) -> Result<()> {
        Ok(())
    }

    fn record_session_complete(&self, _kind: SessionKind, _duration_minutes: u32) -> Result<()> {
        Ok(())
    }
}

impl NotificationScheduler for Silent {
    fn schedule_completion(&self, _notice: &CompletionNotice) -> Result<()> {
        Ok(())
    }

    fn cancel_all_scheduled(&self) -> Result<()> {
        Ok(())
    }
}

impl SoundPlayer for Silent {
    fn play_completion_sound(&self) -> Result<()> {
        Ok(())
    }
}

/// Process-local key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Custom("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert!(store.get("a").unwrap().is_none());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove(&["a", "missing"]).unwrap();
        assert!(store.get("a").unwrap().is_none());
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn notice_respects_settings() {
        let settings = TimerSettings {
            sound_enabled: false,
            ..TimerSettings::default()
        };
        let notice = CompletionNotice::for_session(SessionKind::Break, 90, &settings);
        assert_eq!(notice.delay_secs, 90);
        assert!(!notice.sound);
        assert!(notice.vibration);
        assert_eq!(notice.title, "Break Complete!");
        assert_eq!(notice.body, "Focus time!");
    }
}
