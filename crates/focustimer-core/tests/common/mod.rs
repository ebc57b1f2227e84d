//! Recording and failing collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use focustimer_core::{
    Collaborators, CompletionNotice, CoreError, KeyValueStore, MemoryStore,
    NotificationScheduler, Result, SessionKind, SoundPlayer, StatisticsRecorder,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatCall {
    Start(SessionKind),
    Complete(SessionKind, u32),
}

#[derive(Default)]
pub struct RecordingStats {
    pub calls: Mutex<Vec<StatCall>>,
}

impl RecordingStats {
    pub fn completions(&self) -> Vec<(SessionKind, u32)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                StatCall::Complete(kind, minutes) => Some((*kind, *minutes)),
                StatCall::Start(_) => None,
            })
            .collect()
    }

    pub fn starts(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, StatCall::Start(_)))
            .count()
    }
}

impl StatisticsRecorder for RecordingStats {
    fn record_session_start(&self, kind: SessionKind) -> Result<()> {
        self.calls.lock().unwrap().push(StatCall::Start(kind));
        Ok(())
    }

    fn record_session_complete(&self, kind: SessionKind, duration_minutes: u32) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(StatCall::Complete(kind, duration_minutes));
        Ok(())
    }
}

/// Keeps at most one pending notice, like a device scheduler with a
/// cancel-before-schedule caller.
#[derive(Default)]
pub struct RecordingNotifier {
    pub pending: Mutex<Vec<CompletionNotice>>,
    pub scheduled: Mutex<Vec<CompletionNotice>>,
    pub cancels: Mutex<usize>,
}

impl RecordingNotifier {
    pub fn scheduled_delays(&self) -> Vec<u64> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.delay_secs)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

impl NotificationScheduler for RecordingNotifier {
    fn schedule_completion(&self, notice: &CompletionNotice) -> Result<()> {
        self.pending.lock().unwrap().push(notice.clone());
        self.scheduled.lock().unwrap().push(notice.clone());
        Ok(())
    }

    fn cancel_all_scheduled(&self) -> Result<()> {
        self.pending.lock().unwrap().clear();
        *self.cancels.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSound {
    pub plays: Mutex<usize>,
}

impl RecordingSound {
    pub fn plays(&self) -> usize {
        *self.plays.lock().unwrap()
    }
}

impl SoundPlayer for RecordingSound {
    fn play_completion_sound(&self) -> Result<()> {
        *self.plays.lock().unwrap() += 1;
        Ok(())
    }
}

/// Every call fails.
pub struct Broken;

impl StatisticsRecorder for Broken {
    fn record_session_start(&self, _kind: SessionKind) -> Result<()> {
        Err(CoreError::Custom("stats offline".into()))
    }

    fn record_session_complete(&self, _kind: SessionKind, _minutes: u32) -> Result<()> {
        Err(CoreError::Custom("stats offline".into()))
    }
}

impl NotificationScheduler for Broken {
    fn schedule_completion(&self, _notice: &CompletionNotice) -> Result<()> {
        Err(CoreError::Notification("permission denied".into()))
    }

    fn cancel_all_scheduled(&self) -> Result<()> {
        Err(CoreError::Notification("permission denied".into()))
    }
}

impl SoundPlayer for Broken {
    fn play_completion_sound(&self) -> Result<()> {
        Err(CoreError::Sound("asset missing".into()))
    }
}

impl KeyValueStore for Broken {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(CoreError::Custom("disk unavailable".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(CoreError::Custom("disk unavailable".into()))
    }

    fn remove(&self, _keys: &[&str]) -> Result<()> {
        Err(CoreError::Custom("disk unavailable".into()))
    }
}

pub struct Fakes {
    pub stats: Arc<RecordingStats>,
    pub notifier: Arc<RecordingNotifier>,
    pub sound: Arc<RecordingSound>,
    pub store: Arc<MemoryStore>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            stats: Arc::default(),
            notifier: Arc::default(),
            sound: Arc::default(),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            stats: self.stats.clone(),
            notifier: self.notifier.clone(),
            sound: self.sound.clone(),
            store: self.store.clone(),
        }
    }
}

pub fn broken() -> Collaborators {
    let broken = Arc::new(Broken);
    Collaborators {
        stats: broken.clone(),
        notifier: broken.clone(),
        sound: broken.clone(),
        store: broken,
    }
}
