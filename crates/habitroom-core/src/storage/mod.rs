mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, HabitsConfig, LoggingConfig, ServerConfig, StorageConfig};
pub use database::HabitStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the Habitroom data directory, creating it if needed.
///
/// `HABITROOM_DATA_DIR` takes precedence. Otherwise `~/.config/habitroom/`,
/// or `~/.config/habitroom-dev/` when HABITROOM_ENV=dev.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HABITROOM_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("HABITROOM_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("habitroom-dev")
            } else {
                base_dir.join("habitroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
