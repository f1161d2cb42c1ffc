//! Signal Types
//!
//! Summary and bucketing types. No sampling logic here.

use serde::{Deserialize, Serialize};

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Samples needed before a trend is reported
pub const TREND_MIN_SAMPLES: usize = 10;

/// Half-window mean difference (dB) that counts as a trend
pub const TREND_THRESHOLD_DB: f64 = 3.0;

/// Samples needed before stability is reported
pub const STABILITY_MIN_SAMPLES: usize = 3;

// ============================================================================
// TREND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Degrading,
    Stable,
    InsufficientData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Degrading => "degrading",
            Trend::Stable => "stable",
            Trend::InsufficientData => "insufficient_data",
        }
    }
}

// ============================================================================
// STABILITY
// ============================================================================

/// Bucket of the windowed standard deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    VeryStable,
    Stable,
    ModeratelyStable,
    Unstable,
    Unknown,
}

impl Stability {
    pub fn from_stddev(stddev: f64, samples: usize) -> Self {
        if samples < STABILITY_MIN_SAMPLES {
            Stability::Unknown
        } else if stddev < 2.0 {
            Stability::VeryStable
        } else if stddev < 5.0 {
            Stability::Stable
        } else if stddev < 10.0 {
            Stability::ModeratelyStable
        } else {
            Stability::Unstable
        }
    }

    pub fn is_steady(&self) -> bool {
        matches!(self, Stability::VeryStable | Stability::Stable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stability::VeryStable => "very_stable",
            Stability::Stable => "stable",
            Stability::ModeratelyStable => "moderately_stable",
            Stability::Unstable => "unstable",
            Stability::Unknown => "unknown",
        }
    }
}

// ============================================================================
// QUALITY
// ============================================================================

/// Fixed dBm quality buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Weak,
    Poor,
    VeryPoor,
}

impl SignalQuality {
    pub fn from_dbm(dbm: f64) -> Self {
        if dbm >= -50.0 {
            SignalQuality::Excellent
        } else if dbm >= -60.0 {
            SignalQuality::Good
        } else if dbm >= -70.0 {
            SignalQuality::Fair
        } else if dbm >= -80.0 {
            SignalQuality::Weak
        } else if dbm >= -90.0 {
            SignalQuality::Poor
        } else {
            SignalQuality::VeryPoor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalQuality::Excellent => "Excellent",
            SignalQuality::Good => "Good",
            SignalQuality::Fair => "Fair",
            SignalQuality::Weak => "Weak",
            SignalQuality::Poor => "Poor",
            SignalQuality::VeryPoor => "Very poor",
        }
    }

    /// Weak or worse
    pub fn is_weak(&self) -> bool {
        matches!(self, SignalQuality::Weak | SignalQuality::Poor | SignalQuality::VeryPoor)
    }

    /// Four-level bar indicator for console output
    pub fn bars(&self) -> &'static str {
        match self {
            SignalQuality::Excellent => "▂▄▆█",
            SignalQuality::Good => "▂▄▆_",
            SignalQuality::Fair => "▂▄__",
            SignalQuality::Weak | SignalQuality::Poor => "▂___",
            SignalQuality::VeryPoor => "____",
        }
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Point-in-time statistics for one BSSID's signal window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub mean: f64,
    pub min: i8,
    pub max: i8,
    /// Population standard deviation over the window
    pub stddev: f64,
    pub median: f64,
    pub range: i16,
    pub sample_count: usize,
    pub latest: i8,
    pub trend: Trend,
    pub stability: Stability,
    pub quality: SignalQuality,
    /// Samples ever seen, including evicted ones
    pub lifetime_count: u64,
    pub lifetime_mean: f64,
    pub lifetime_stddev: f64,
}
