mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, HistoryConfig, TimerConfig};
pub use database::{SessionRecord, SessionStore, DEFAULT_HISTORY_LIMIT};

use std::path::{Path, PathBuf};

use crate::error::DatabaseError;

/// Overrides the data directory entirely when set.
pub const DATA_DIR_ENV: &str = "PMO_DATA_DIR";

/// Returns `<config dir>/pmo[-dev]/`, creating it if needed.
///
/// Set PMO_ENV=dev to use the development data directory, or PMO_DATA_DIR
/// to point somewhere else altogether.
///
/// # Errors
/// Returns [`DatabaseError::DataDirUnavailable`] if the directory cannot be
/// created. Callers treat this as a fatal startup error.
pub fn data_dir() -> Result<PathBuf, DatabaseError> {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::config_dir().unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            });

            let env = std::env::var("PMO_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pmo-dev")
            } else {
                base_dir.join("pmo")
            }
        }
    };

    ensure_dir(&dir)?;
    Ok(dir)
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<(), DatabaseError> {
    std::fs::create_dir_all(dir).map_err(|source| DatabaseError::DataDirUnavailable {
        path: dir.to_path_buf(),
        source,
    })
}
