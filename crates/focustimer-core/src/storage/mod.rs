mod config;
pub mod database;
pub mod migrations;
pub mod snapshot;

pub use config::{Config, DurationLimits, NotificationsConfig, TimerConfig};
pub use database::Database;
pub use snapshot::{ConfigRecord, RecoverySnapshot};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/focustimer[-dev]/` based on FOCUSTIMER_ENV.
///
/// Set FOCUSTIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focustimer-dev")
    } else {
        base_dir.join("focustimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
