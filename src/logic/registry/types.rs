//! Registry Types
//!
//! NetworkRecord and the registry's result/error types.

use serde::{Deserialize, Serialize};

use crate::logic::classify::Classification;
use crate::logic::frame::{Capabilities, CaptureTime, FrameKind, MacAddr, Security, Ssid};
use crate::logic::resolver::RevealEvidence;

// ============================================================================
// NETWORK RECORD
// ============================================================================

/// One discovered access point, keyed by BSSID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub bssid: MacAddr,
    /// Known name; set at most once from hidden, never cleared
    pub ssid: Option<Ssid>,
    pub hidden: bool,
    pub channel: Option<u8>,
    /// Derived from the latest capabilities
    pub security: Security,
    pub capabilities: Capabilities,
    pub vendor: Option<String>,
    /// Locally administered BSSID
    pub randomized_bssid: bool,
    pub first_seen: CaptureTime,
    pub last_seen: CaptureTime,
    pub beacon_count: u64,
    pub probe_response_count: u64,
    /// How a hidden SSID was recovered
    pub revealed_by: Option<RevealEvidence>,
    /// Frames whose SSID disagreed with the known one
    pub bssid_anomalies: u32,
    pub classification: Option<Classification>,
}

impl NetworkRecord {
    /// Empty hidden record first seen at `at`
    pub fn new(bssid: MacAddr, at: CaptureTime) -> Self {
        Self {
            bssid,
            ssid: None,
            hidden: true,
            channel: None,
            security: Security::Open,
            capabilities: Capabilities::default(),
            vendor: None,
            randomized_bssid: bssid.is_locally_administered(),
            first_seen: at,
            last_seen: at,
            beacon_count: 0,
            probe_response_count: 0,
            revealed_by: None,
            bssid_anomalies: 0,
            classification: None,
        }
    }

    /// SSID for display: the name, or a hidden marker
    pub fn display_ssid(&self) -> String {
        match &self.ssid {
            Some(ssid) => ssid.to_string(),
            None => "[Hidden Network]".to_string(),
        }
    }
}

// ============================================================================
// OBSERVATION RESULT
// ============================================================================

/// What one `observe` call did to the registry
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub bssid: MacAddr,
    pub created: bool,
    pub revealed: Option<RevealEvidence>,
    pub anomaly: Option<UnknownBssidReference>,
}

/// A structurally valid frame whose SSID disagrees with the one already
/// known for its BSSID. Logged and counted; the record is updated with
/// latest-wins semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBssidReference {
    pub bssid: MacAddr,
    pub known: Ssid,
    pub observed: Ssid,
    pub kind: FrameKind,
}

impl std::fmt::Display for UnknownBssidReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} from {} names '{}' but '{}' is known",
            self.kind.as_str(),
            self.bssid,
            self.observed,
            self.known
        )
    }
}

impl std::error::Error for UnknownBssidReference {}

// ============================================================================
// ERRORS
// ============================================================================

/// Frames the registry refuses; nothing is mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// Only Beacon and ProbeResponse frames describe access points
    NotFromAccessPoint(FrameKind),
    MissingBssid,
}

impl std::fmt::Display for ObserveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObserveError::NotFromAccessPoint(kind) => {
                write!(f, "Registry Error: {} frames cannot update records", kind.as_str())
            }
            ObserveError::MissingBssid => write!(f, "Registry Error: frame has no BSSID"),
        }
    }
}

impl std::error::Error for ObserveError {}
