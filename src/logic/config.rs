//! Scan Configuration
//!
//! Gathers the tunables from `constants` into one value handed to the
//! session controller.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::classify::ClassifierConfig;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownTier(String),
    DuplicateTier(String),
    /// Standard is the implicit fallback and cannot be ordered
    StandardInTierOrder,
    EmptyTierOrder,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownTier(name) => write!(f, "Config Error: unknown tier '{}'", name),
            ConfigError::DuplicateTier(name) => write!(f, "Config Error: tier '{}' listed twice", name),
            ConfigError::StandardInTierOrder => {
                write!(f, "Config Error: 'standard' is the fallback and cannot be ordered")
            }
            ConfigError::EmptyTierOrder => write!(f, "Config Error: tier order is empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// SCAN CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Signal samples kept per BSSID
    pub signal_window: usize,
    /// How long a probed SSID stays correlatable
    pub probe_retention: Duration,
    /// Frames buffered between capture and processing
    pub queue_capacity: usize,
    /// Periodic classification interval; zero disables it
    pub classify_interval: Duration,
    /// Networks unseen for this long are reported stale
    pub stale_after: Duration,
    /// Upper bound on `stop()` waiting for the processing loop
    pub drain_timeout: Duration,
    pub output_dir: PathBuf,
    /// Optional `manuf`-format OUI table replacing the built-in one
    pub oui_file: Option<PathBuf>,
    pub classifier: ClassifierConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            signal_window: constants::DEFAULT_SIGNAL_WINDOW,
            probe_retention: Duration::from_secs(constants::DEFAULT_PROBE_RETENTION_SECS),
            queue_capacity: constants::DEFAULT_QUEUE_CAPACITY,
            classify_interval: Duration::from_secs(constants::DEFAULT_CLASSIFY_INTERVAL_SECS),
            stale_after: Duration::from_secs(constants::DEFAULT_STALE_SECS),
            drain_timeout: Duration::from_secs(constants::DEFAULT_DRAIN_TIMEOUT_SECS),
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            oui_file: None,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Read every setting from the environment, falling back to defaults.
    /// An invalid tier order is an error rather than a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            signal_window: constants::get_signal_window(),
            probe_retention: Duration::from_secs(constants::get_probe_retention_secs()),
            queue_capacity: constants::get_queue_capacity(),
            classify_interval: Duration::from_secs(constants::get_classify_interval_secs()),
            stale_after: Duration::from_secs(constants::get_stale_secs()),
            drain_timeout: Duration::from_secs(constants::get_drain_timeout_secs()),
            output_dir: PathBuf::from(constants::get_output_dir()),
            oui_file: constants::get_oui_file().map(PathBuf::from),
            classifier: ClassifierConfig::from_env()?,
        })
    }
}
