//! Classification Context
//!
//! Facts the rules need, derived once from a record snapshot and its
//! signal summary. Upper-casing and vendor bucketing happen here so the
//! rules only compare.

use super::rules::{vendor_category, VendorCategory};
use crate::logic::frame::Security;
use crate::logic::registry::NetworkRecord;
use crate::logic::signal::{SignalQuality, SignalSummary, Stability};

#[derive(Debug, Clone)]
pub struct NetworkContext {
    /// Upper-cased SSID; `None` while hidden
    pub ssid: Option<String>,
    pub vendor_category: Option<VendorCategory>,
    pub security: Security,
    pub channel: Option<u8>,
    pub randomized_bssid: bool,
    pub stability: Option<Stability>,
    pub quality: Option<SignalQuality>,
}

impl NetworkContext {
    pub fn new(record: &NetworkRecord, summary: Option<&SignalSummary>) -> Self {
        Self {
            ssid: record
                .ssid
                .as_ref()
                .filter(|s| !s.is_blank())
                .map(|s| s.to_upper_lossy()),
            vendor_category: record.vendor.as_deref().and_then(vendor_category),
            security: record.security,
            channel: record.channel,
            randomized_bssid: record.randomized_bssid,
            stability: summary.map(|s| s.stability),
            quality: summary.map(|s| s.quality),
        }
    }

    pub fn ssid_str(&self) -> &str {
        self.ssid.as_deref().unwrap_or("")
    }

    pub fn vendor_is(&self, category: VendorCategory) -> bool {
        self.vendor_category == Some(category)
    }

    /// Weak signal or visibly unstable - typical of a device on the move
    pub fn signal_is_transient(&self) -> bool {
        let weak = self.quality.map(|q| q.is_weak()).unwrap_or(false);
        let unstable = matches!(
            self.stability,
            Some(Stability::ModeratelyStable) | Some(Stability::Unstable)
        );
        weak || unstable
    }

    pub fn signal_is_steady(&self) -> bool {
        self.stability.map(|s| s.is_steady()).unwrap_or(false)
    }
}
