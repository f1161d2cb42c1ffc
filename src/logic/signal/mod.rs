//! Signal Analyzer
//!
//! Per-BSSID rolling window of signal samples. Sample windows are the only
//! signal state; the registry never duplicates it.
//!
//! ## Structure
//! - `types`: SignalSummary, Trend, Stability, SignalQuality
//! - `window`: SignalWindow (ring buffer + aggregates), RunningStats

pub mod types;
pub mod window;

use std::collections::HashMap;

use crate::constants;
use crate::logic::frame::{CaptureTime, MacAddr};

pub use types::{SignalQuality, SignalSummary, Stability, Trend};
pub use window::{RunningStats, SignalWindow};

#[derive(Debug, Clone)]
pub struct SignalAnalyzer {
    capacity: usize,
    windows: HashMap<MacAddr, SignalWindow>,
}

impl Default for SignalAnalyzer {
    fn default() -> Self {
        Self::new(constants::DEFAULT_SIGNAL_WINDOW)
    }
}

impl SignalAnalyzer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: HashMap::new(),
        }
    }

    /// Append one sample for `bssid`
    pub fn sample(&mut self, bssid: MacAddr, dbm: i8, at: CaptureTime) {
        let capacity = self.capacity;
        self.windows
            .entry(bssid)
            .or_insert_with(|| SignalWindow::new(capacity))
            .push(dbm, at);
    }

    pub fn summary(&self, bssid: &MacAddr) -> Option<SignalSummary> {
        self.windows.get(bssid).and_then(SignalWindow::summary)
    }

    pub fn window(&self, bssid: &MacAddr) -> Option<&SignalWindow> {
        self.windows.get(bssid)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of BSSIDs with at least one sample
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}
