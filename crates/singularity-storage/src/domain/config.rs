//! # Configuration
//!
//! Storage and replication settings. All values have defaults matching a
//! native 36-slot container; `from_env()` overrides them from `SS_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Capacity increments granted by upgrade items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeTier {
    Basic,
    Advanced,
    Quantum,
}

/// Configuration for the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Slots granted to a freshly created unit (default: 36).
    pub default_capacity: u32,

    /// Items per page when a caller passes a page size of 0 (default: 36).
    pub page_size: usize,

    /// Capacity added by `UpgradeTier::Basic` (default: 36).
    pub basic_upgrade: u32,

    /// Capacity added by `UpgradeTier::Advanced` (default: 100).
    pub advanced_upgrade: u32,

    /// Capacity added by `UpgradeTier::Quantum` (default: 999).
    pub quantum_upgrade: u32,

    /// Directory holding one file per unit.
    pub data_dir: PathBuf,

    /// File name prefix of unit files.
    pub file_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_capacity: 36,
            page_size: 36,
            basic_upgrade: 36,
            advanced_upgrade: 100,
            quantum_upgrade: 999,
            data_dir: PathBuf::from("SaveData"),
            file_prefix: "SingularityInventory_".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from the environment.
    ///
    /// - `SS_DEFAULT_CAPACITY`
    /// - `SS_PAGE_SIZE`
    /// - `SS_DATA_DIR`
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_capacity: env_parse("SS_DEFAULT_CAPACITY").unwrap_or(defaults.default_capacity),
            page_size: env_parse::<usize>("SS_PAGE_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
            data_dir: std::env::var("SS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir.clone()),
            ..defaults
        }
    }

    pub fn with_default_capacity(mut self, capacity: u32) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Set the fallback page size. Zero is ignored.
    pub fn with_page_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.page_size = size;
        }
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Capacity increment of an upgrade tier.
    pub fn upgrade_increment(&self, tier: UpgradeTier) -> u32 {
        match tier {
            UpgradeTier::Basic => self.basic_upgrade,
            UpgradeTier::Advanced => self.advanced_upgrade,
            UpgradeTier::Quantum => self.quantum_upgrade,
        }
    }
}

/// Peer-side request timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// How long a view request may stay unanswered before it is re-sent.
    pub response_timeout: Duration,

    /// Re-sends allowed before the session gives up and returns to idle.
    pub max_retries: u32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_millis(2_000),
            max_retries: 3,
        }
    }
}

impl ReplicationConfig {
    /// Load overrides from `SS_RESPONSE_TIMEOUT_MS` and `SS_MAX_RETRIES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            response_timeout: env_parse("SS_RESPONSE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.response_timeout),
            max_retries: env_parse("SS_MAX_RETRIES").unwrap_or(defaults.max_retries),
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub(crate) fn timeout_millis(&self) -> u64 {
        u64::try_from(self.response_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
