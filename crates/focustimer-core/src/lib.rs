//! # FocusTimer Core Library
//!
//! This library provides the core logic of the FocusTimer Pomodoro timer:
//! session transitions (focus, break, long break), elapsed-time accounting
//! across foreground/background transitions, and the coordination between
//! ticks, statistics and notifications. Front ends (the `focustimer` CLI)
//! are thin layers over it.
//!
//! ## Architecture
//!
//! - **Timer**: a pure transition function `apply(state, action)` plus the
//!   duration policy that picks each session's length
//! - **Controller**: the single owner of the state, combining the lifecycle
//!   reconciler and the completion coordinator; returns effects and events
//!   instead of performing them
//! - **Runtime**: a tokio actor with one inbox, a one-second tick driver and a
//!   fire-and-forget effect worker
//! - **Storage**: SQLite-backed key-value records and session statistics, and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerState`] / [`apply`]: state machine
//! - [`TimerController`]: lifecycle reconciliation and completion
//! - [`TimerRuntime`] / [`TimerHandle`]: async actor
//! - [`Database`]: statistics and persisted records
//! - [`Config`]: application configuration management

pub mod background;
pub mod clock;
pub mod collaborators;
pub mod completion;
pub mod controller;
pub mod driver;
pub mod effects;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod runtime;
pub mod stats;
pub mod storage;
pub mod timer;

pub use background::{check_background_completion, BackgroundCheck};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{
    Collaborators, CompletionNotice, KeyValueStore, MemoryStore, NotificationScheduler, Silent,
    SoundPlayer, StatisticsRecorder,
};
pub use completion::{Completion, CompletionCoordinator};
pub use controller::{Outcome, TimerController};
pub use effects::Effect;
pub use error::{ConfigError, CoreError, Result, StorageError};
pub use events::Event;
pub use lifecycle::{AppLifecycle, LifecycleReconciler, Reconciliation};
pub use runtime::{RuntimeOptions, TimerHandle, TimerRuntime};
pub use stats::{AllTimeStats, DailyStats, WeeklyStats};
pub use storage::{Config, Database, DurationLimits};
pub use timer::{
    apply, format_clock, Action, SessionKind, SettingsPatch, StatePatch, TimerPhase,
    TimerSettings, TimerState,
};
