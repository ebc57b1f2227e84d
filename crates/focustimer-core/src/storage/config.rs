//! TOML-based application configuration.
//!
//! Stores:
//! - Default timer durations and the long-break cadence
//! - Notification, sound and vibration preferences
//! - Clamp bounds for duration adjustments
//!
//! Configuration is stored at `~/.config/focustimer/config.toml`. Values
//! saved by the running timer (see [`snapshot`](super::snapshot)) take
//! precedence over the `[timer]` and `[notifications]` defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::timer::{
    apply, Action, SessionKind, StatePatch, TimerSettings, TimerState, DEFAULT_BREAK_MIN,
    DEFAULT_FOCUS_MIN, DEFAULT_LONG_BREAK_INTERVAL, DEFAULT_LONG_BREAK_MIN,
};

/// Default session lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_break_duration")]
    pub break_duration: u32,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration: u32,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
}

/// Bounds applied to duration changes before they reach the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationLimits {
    #[serde(default = "default_focus_min")]
    pub focus_min: u32,
    #[serde(default = "default_focus_max")]
    pub focus_max: u32,
    #[serde(default = "default_break_min")]
    pub break_min: u32,
    #[serde(default = "default_break_max")]
    pub break_max: u32,
    #[serde(default = "default_long_break_min")]
    pub long_break_min: u32,
    #[serde(default = "default_long_break_max")]
    pub long_break_max: u32,
    #[serde(default = "default_step")]
    pub step: u32,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub limits: DurationLimits,
}

// Default value functions
fn default_focus_duration() -> u32 {
    DEFAULT_FOCUS_MIN
}
fn default_break_duration() -> u32 {
    DEFAULT_BREAK_MIN
}
fn default_long_break_duration() -> u32 {
    DEFAULT_LONG_BREAK_MIN
}
fn default_long_break_interval() -> u32 {
    DEFAULT_LONG_BREAK_INTERVAL
}
fn default_true() -> bool {
    true
}
fn default_focus_min() -> u32 {
    5
}
fn default_focus_max() -> u32 {
    60
}
fn default_break_min() -> u32 {
    5
}
fn default_break_max() -> u32 {
    30
}
fn default_long_break_min() -> u32 {
    10
}
fn default_long_break_max() -> u32 {
    60
}
fn default_step() -> u32 {
    5
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            break_duration: default_break_duration(),
            long_break_duration: default_long_break_duration(),
            long_break_interval: default_long_break_interval(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            vibration: true,
        }
    }
}

impl Default for DurationLimits {
    fn default() -> Self {
        Self {
            focus_min: default_focus_min(),
            focus_max: default_focus_max(),
            break_min: default_break_min(),
            break_max: default_break_max(),
            long_break_min: default_long_break_min(),
            long_break_max: default_long_break_max(),
            step: default_step(),
        }
    }
}

impl DurationLimits {
    /// Inclusive `(min, max)` minutes for `kind`.
    pub fn bounds(&self, kind: SessionKind) -> (u32, u32) {
        let (lo, hi) = match kind {
            SessionKind::Focus => (self.focus_min, self.focus_max),
            SessionKind::Break => (self.break_min, self.break_max),
            SessionKind::LongBreak => (self.long_break_min, self.long_break_max),
        };
        let lo = lo.max(1);
        (lo, hi.max(lo))
    }

    pub fn clamp(&self, kind: SessionKind, minutes: u32) -> u32 {
        let (lo, hi) = self.bounds(kind);
        minutes.clamp(lo, hi)
    }

    /// One stepper press up or down from `current`, kept within bounds.
    pub fn step(&self, kind: SessionKind, current: u32, increase: bool) -> u32 {
        let step = self.step.max(1);
        let next = if increase {
            current.saturating_add(step)
        } else {
            current.saturating_sub(step)
        };
        self.clamp(kind, next)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u32>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(format!("{}: {e}", path.display())))?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| -> CoreError {
            ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message,
            }
            .into()
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }

    /// Keys accepted by [`Config::get`] and [`Config::set`].
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Ok(serde_json::Value::Object(sections)) = serde_json::to_value(self) {
            for (section, fields) in sections {
                if let serde_json::Value::Object(fields) = fields {
                    out.extend(fields.keys().map(|f| format!("{section}.{f}")));
                }
            }
        }
        out.sort();
        out
    }

    /// Timer state built from the configured defaults, durations clamped to
    /// the limits.
    pub fn initial_state(&self) -> TimerState {
        let limits = &self.limits;
        let patch = StatePatch {
            focus_duration: Some(limits.clamp(SessionKind::Focus, self.timer.focus_duration)),
            break_duration: Some(limits.clamp(SessionKind::Break, self.timer.break_duration)),
            long_break_duration: Some(
                limits.clamp(SessionKind::LongBreak, self.timer.long_break_duration),
            ),
            long_break_interval: Some(self.timer.long_break_interval.max(1)),
            settings: Some(TimerSettings {
                notifications_enabled: self.notifications.enabled,
                sound_enabled: self.notifications.sound,
                vibration_enabled: self.notifications.vibration,
            }),
            ..StatePatch::default()
        };
        let loaded = apply(&TimerState::default(), &Action::LoadState(patch));
        apply(&loaded, &Action::Reset)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\nfocus_duration = 50\n").unwrap();
        assert_eq!(parsed.timer.focus_duration, 50);
        assert_eq!(parsed.timer.break_duration, 5);
        assert!(parsed.notifications.sound);
        assert_eq!(parsed.limits.step, 5);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.focus_duration").as_deref(), Some("25"));
        assert_eq!(cfg.get("notifications.sound").as_deref(), Some("true"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("timer").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("notifications.vibration", "false").unwrap();
        cfg.set("timer.long_break_interval", "3").unwrap();
        assert!(!cfg.notifications.vibration);
        assert_eq!(cfg.timer.long_break_interval, 3);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(matches!(
            cfg.set("notifications.enabled", "maybe"),
            Err(CoreError::Config(ConfigError::InvalidValue { .. }))
        ));
        assert!(cfg.set("timer.focus_duration", "-3").is_err());
        assert!(cfg.set("limits", "1").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn keys_lists_every_leaf() {
        let keys = Config::default().keys();
        assert!(keys.contains(&"timer.focus_duration".to_string()));
        assert!(keys.contains(&"limits.step".to_string()));
        assert_eq!(keys.len(), 14);
    }

    #[test]
    fn limits_clamp_and_step() {
        let limits = DurationLimits::default();
        assert_eq!(limits.clamp(SessionKind::Focus, 2), 5);
        assert_eq!(limits.clamp(SessionKind::Focus, 90), 60);
        assert_eq!(limits.clamp(SessionKind::Break, 45), 30);
        assert_eq!(limits.clamp(SessionKind::LongBreak, 5), 10);
        assert_eq!(limits.step(SessionKind::Focus, 25, true), 30);
        assert_eq!(limits.step(SessionKind::Focus, 60, true), 60);
        assert_eq!(limits.step(SessionKind::Break, 5, false), 5);
        assert_eq!(limits.step(SessionKind::LongBreak, 15, false), 10);
    }

    #[test]
    fn inverted_limits_do_not_panic() {
        let limits = DurationLimits {
            focus_min: 40,
            focus_max: 10,
            ..DurationLimits::default()
        };
        assert_eq!(limits.clamp(SessionKind::Focus, 25), 40);
    }

    #[test]
    fn initial_state_follows_config() {
        let mut cfg = Config::default();
        cfg.timer.focus_duration = 45;
        cfg.timer.break_duration = 99;
        cfg.notifications.sound = false;
        let state = cfg.initial_state();
        assert_eq!(state.focus_duration, 45);
        assert_eq!(state.break_duration, 30);
        assert_eq!(state.remaining_time, 45 * 60);
        assert!(!state.settings.sound_enabled);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("limits.focus_max", "90").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().limits.focus_max, 90);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CoreError::Config(ConfigError::ParseFailed(_)))
        ));
    }
}
