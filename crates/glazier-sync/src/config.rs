//! # Sync Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GLAZIER_POLL_INTERVAL_MS=2000                                      │
//! │     GLAZIER_DB_PATH=/srv/glazier/glazier.db                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/glazier/sync.toml (Linux)                                │
//! │     ~/Library/Application Support/com.glazier.glazier/sync.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     5 second interval, every collection tracked                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [sync]
//! poll_interval_ms = 5000
//! tracked = ["customers", "bills", "quotations", "dailySales"]
//!
//! [store]
//! database_path = "/srv/glazier/glazier.db"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use glazier_core::DataType;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

/// Default staleness bound between two views of the same data.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

// =============================================================================
// Sync Settings
// =============================================================================

/// Poll loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Milliseconds between two scans of the store.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Collections the poll loop watches, scanned in this order.
    #[serde(default = "default_tracked")]
    pub tracked: Vec<DataType>,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_tracked() -> Vec<DataType> {
    DataType::ALL.to_vec()
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            poll_interval_ms: default_poll_interval(),
            tracked: default_tracked(),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Where the shared key-value store lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file shared by every process of this shop.
    /// Falls back to the platform data directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Poll loop settings.
    #[serde(default)]
    pub sync: SyncSettings,

    /// Store location.
    #[serde(default)]
    pub store: StoreSettings,
}

impl SyncConfig {
    /// Creates a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.sync.poll_interval_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }

        if self.sync.tracked.is_empty() {
            return Err(SyncError::InvalidConfig(
                "tracked must name at least one collection".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(interval) = std::env::var("GLAZIER_POLL_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(ms) => {
                    debug!(poll_interval_ms = ms, "Overriding poll interval from environment");
                    self.sync.poll_interval_ms = ms;
                }
                Err(_) => warn!(value = %interval, "Ignoring non-numeric GLAZIER_POLL_INTERVAL_MS"),
            }
        }

        if let Ok(path) = std::env::var("GLAZIER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "glazier", "glazier")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Interval between two scans.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync.poll_interval_ms)
    }

    /// Collections the poll loop watches.
    pub fn tracked(&self) -> &[DataType] {
        &self.sync.tracked
    }

    /// Database file to open: the configured one, else `glazier.db` in the
    /// platform data directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        self.store.database_path.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("glazier.db"))
                .unwrap_or_else(|| PathBuf::from("glazier.db"))
        })
    }
}
