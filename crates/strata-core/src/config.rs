//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use strata_session::SessionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Search engine URL template
    pub search_engine: String,
    /// Homepage URL
    pub homepage: String,
    /// How long an unvisited tab survives, in minutes
    pub retention_minutes: i64,
    /// How many content surfaces stay preloaded
    pub preload_capacity: usize,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let defaults = SessionConfig::default();

        Self {
            database_path: data_dir.join("strata.db"),
            search_engine: defaults.search_template,
            homepage: "about:blank".to_string(),
            retention_minutes: defaults.retention_minutes,
            preload_capacity: defaults.preload_capacity,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Strata"))
            .unwrap_or_else(|| PathBuf::from(".strata"))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            retention_minutes: self.retention_minutes,
            preload_capacity: self.preload_capacity,
            search_template: self.search_engine.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

// Simple dirs implementation for common directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
