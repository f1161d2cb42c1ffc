//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every default can be overridden from the environment.

/// Signal samples retained per BSSID
pub const DEFAULT_SIGNAL_WINDOW: usize = 64;

/// How long a client's probed SSID stays correlatable (seconds)
pub const DEFAULT_PROBE_RETENTION_SECS: u64 = 5;

/// Upper bound on clients tracked by the hidden-SSID resolver
pub const MAX_TRACKED_CLIENTS: usize = 4096;

/// Frames buffered between capture and processing
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Periodic classification interval (seconds)
pub const DEFAULT_CLASSIFY_INTERVAL_SECS: u64 = 10;

/// Networks unseen for this long are reported as stale (seconds)
pub const DEFAULT_STALE_SECS: u64 = 60;

/// Upper bound on the drain performed by `stop()` (seconds)
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 5;

/// Tier order used when none is configured
pub const DEFAULT_TIER_ORDER: &str = "official,mobile,iot,isp,enterprise,public";

/// Directory receiving scan reports
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "WifiObserver";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Get signal window capacity from environment or use default
pub fn get_signal_window() -> usize {
    env_parse("WIFI_OBSERVER_SIGNAL_WINDOW", DEFAULT_SIGNAL_WINDOW).max(1)
}

/// Get probe retention window from environment or use default
pub fn get_probe_retention_secs() -> u64 {
    env_parse("WIFI_OBSERVER_PROBE_RETENTION_SECS", DEFAULT_PROBE_RETENTION_SECS)
}

/// Get frame queue capacity from environment or use default
pub fn get_queue_capacity() -> usize {
    env_parse("WIFI_OBSERVER_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY).max(1)
}

/// Get periodic classification interval from environment or use default
pub fn get_classify_interval_secs() -> u64 {
    env_parse("WIFI_OBSERVER_CLASSIFY_INTERVAL_SECS", DEFAULT_CLASSIFY_INTERVAL_SECS)
}

/// Get staleness threshold from environment or use default
pub fn get_stale_secs() -> u64 {
    env_parse("WIFI_OBSERVER_STALE_SECS", DEFAULT_STALE_SECS)
}

/// Get classification tier order from environment or use default
pub fn get_tier_order() -> String {
    std::env::var("WIFI_OBSERVER_TIER_ORDER")
        .unwrap_or_else(|_| DEFAULT_TIER_ORDER.to_string())
}

/// Get report output directory from environment or use default
pub fn get_output_dir() -> String {
    std::env::var("WIFI_OBSERVER_OUTPUT_DIR")
        .unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string())
}

/// Get capture source (pcap file or interface) from environment
pub fn get_source() -> Option<String> {
    std::env::var("WIFI_OBSERVER_SOURCE").ok().filter(|s| !s.trim().is_empty())
}

/// Get stop() drain bound from environment or use default
pub fn get_drain_timeout_secs() -> u64 {
    env_parse("WIFI_OBSERVER_DRAIN_TIMEOUT_SECS", DEFAULT_DRAIN_TIMEOUT_SECS)
}

/// Get optional manuf-format OUI file from environment
pub fn get_oui_file() -> Option<String> {
    std::env::var("WIFI_OBSERVER_OUI_FILE").ok().filter(|s| !s.trim().is_empty())
}
