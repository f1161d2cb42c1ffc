//! Session Types
//!
//! State machine, counters, the final outcome and the error/sink types the
//! controller exposes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::source::CaptureError;
use crate::logic::classify::Classification;
use crate::logic::frame::{FrameKind, MacAddr, MalformedFrame};
use crate::logic::registry::NetworkRecord;
use crate::logic::signal::SignalSummary;

// ============================================================================
// STATE
// ============================================================================

/// `Idle -> Running -> Stopped`; Stopped is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
        }
    }
}

/// Why a session stopped. The first reason recorded wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    Requested,
    DurationElapsed,
    EndOfStream,
    CaptureInterrupted(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stop requested"),
            StopReason::DurationElapsed => write!(f, "duration elapsed"),
            StopReason::EndOfStream => write!(f, "end of capture"),
            StopReason::CaptureInterrupted(why) => write!(f, "capture interrupted: {}", why),
        }
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub frames_captured: u64,
    pub frames_decoded: u64,
    /// Decode failures other than unsupported subtypes
    pub frames_malformed: u64,
    /// Non-management or other management subtypes
    pub frames_unsupported: u64,
    /// Evicted by drop-oldest while the queue was full
    pub queue_dropped: u64,
    /// Still queued when the session was stopped
    pub discarded_on_stop: u64,
    pub beacons: u64,
    pub probe_requests: u64,
    pub probe_responses: u64,
    pub networks: usize,
    pub hidden: usize,
    pub reveals: u64,
    pub correlated_reveals: u64,
    pub bssid_anomalies: u64,
    pub malformed_by_kind: BTreeMap<String, u64>,
}

impl SessionStats {
    pub fn record_malformed(&mut self, err: &MalformedFrame) {
        match err {
            MalformedFrame::UnsupportedFrame => self.frames_unsupported += 1,
            _ => self.frames_malformed += 1,
        }
        *self.malformed_by_kind.entry(err.kind().to_string()).or_insert(0) += 1;
    }

    pub fn record_kind(&mut self, kind: FrameKind) {
        match kind {
            FrameKind::Beacon => self.beacons += 1,
            FrameKind::ProbeRequest => self.probe_requests += 1,
            FrameKind::ProbeResponse => self.probe_responses += 1,
        }
    }

    /// Every captured frame that did not become a `Frame`
    pub fn frames_rejected(&self) -> u64 {
        self.frames_malformed + self.frames_unsupported
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// One record with its classification and signal summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedNetwork {
    pub record: NetworkRecord,
    pub classification: Classification,
    pub signal: Option<SignalSummary>,
}

/// Everything a finished session hands to report sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub session_id: Uuid,
    pub interface: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub stop_reason: StopReason,
    /// Discovery order
    pub networks: Vec<ClassifiedNetwork>,
    pub stats: SessionStats,
    /// BSSIDs unseen for the configured stale threshold at session end
    pub stale: Vec<MacAddr>,
}

impl ScanOutcome {
    pub fn duration_secs(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds()
    }

    pub fn classifications(&self) -> impl Iterator<Item = &Classification> {
        self.networks.iter().map(|n| &n.classification)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum SessionError {
    /// Operation not allowed in the current state
    InvalidState {
        state: SessionState,
        action: &'static str,
    },
    CaptureInterrupted(CaptureError),
    /// `stop()` gave up waiting for the processing loop. A frame already
    /// being applied still completes; the terminal classification is not
    /// written back to the registry.
    DrainTimeout,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidState { state, action } => {
                write!(f, "Session Error: cannot {} while {}", action, state.as_str())
            }
            SessionError::CaptureInterrupted(e) => write!(f, "Session Error: {}", e),
            SessionError::DrainTimeout => {
                write!(f, "Session Error: processing did not drain before the timeout")
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::CaptureInterrupted(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CaptureError> for SessionError {
    fn from(e: CaptureError) -> Self {
        SessionError::CaptureInterrupted(e)
    }
}

// ============================================================================
// REPORT SINKS
// ============================================================================

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "Report Error: {}", e),
            ReportError::Serialize(e) => write!(f, "Report Error: serialization failed: {}", e),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Io(e)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::Serialize(e)
    }
}

/// Consumer of finished sessions. Failures are logged by the controller,
/// never fatal.
pub trait ReportSink: Send {
    fn name(&self) -> &str;

    fn deliver(&mut self, outcome: &ScanOutcome) -> Result<(), ReportError>;
}
