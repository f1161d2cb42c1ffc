//! Network Registry
//!
//! The table of discovered access points, keyed by BSSID. The only writer
//! of `NetworkRecord`s. Records are never removed during a session;
//! staleness is reported, not acted on.
//!
//! # Architecture
//! - `types.rs`: `NetworkRecord`, `Observation`, `ObserveError`,
//!   `UnknownBssidReference`
//!
//! # Update Rules
//! - first Beacon/ProbeResponse naming a BSSID creates its record
//! - security, capabilities and channel: latest frame wins
//! - hidden -> revealed happens once, decided by the resolver
//! - per-frame updates are all-or-nothing

pub mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::logic::classify::{Classification, StaticOuiTable, VendorLookup};
use crate::logic::frame::{CaptureTime, Frame, FrameKind, MacAddr};
use crate::logic::resolver::HiddenSsidResolver;

pub use types::{NetworkRecord, Observation, ObserveError, UnknownBssidReference};

// ============================================================================
// REGISTRY
// ============================================================================

pub struct NetworkRegistry {
    /// Discovery order
    records: Vec<NetworkRecord>,
    index: HashMap<MacAddr, usize>,
    vendors: Arc<dyn VendorLookup>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new(Arc::new(StaticOuiTable::builtin()))
    }
}

impl std::fmt::Debug for NetworkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkRegistry")
            .field("records", &self.records.len())
            .finish()
    }
}

impl NetworkRegistry {
    pub fn new(vendors: Arc<dyn VendorLookup>) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            vendors,
        }
    }

    /// Apply one Beacon or ProbeResponse.
    ///
    /// Reveal decisions are delegated to `resolver`; the registry performs
    /// the write.
    pub fn observe(
        &mut self,
        frame: &Frame,
        resolver: &mut HiddenSsidResolver,
    ) -> Result<Observation, ObserveError> {
        if !frame.kind.is_from_ap() {
            return Err(ObserveError::NotFromAccessPoint(frame.kind));
        }
        let bssid = frame.bssid.ok_or(ObserveError::MissingBssid)?;

        let Some(&idx) = self.index.get(&bssid) else {
            self.create(bssid, frame);
            return Ok(Observation {
                bssid,
                created: true,
                revealed: None,
                anomaly: None,
            });
        };

        let record = &mut self.records[idx];

        // Decide everything before touching the record
        let reveal = resolver.decide(frame, record.hidden);
        let anomaly = match (&record.ssid, frame.advertised_ssid()) {
            (Some(known), Some(observed)) if !record.hidden && known != observed => {
                Some(UnknownBssidReference {
                    bssid,
                    known: known.clone(),
                    observed: observed.clone(),
                    kind: frame.kind,
                })
            }
            _ => None,
        };

        record.capabilities = frame.capabilities;
        record.security = frame.security();
        if frame.channel.is_some() {
            record.channel = frame.channel;
        }
        record.first_seen = record.first_seen.min(frame.timestamp);
        record.last_seen = record.last_seen.max(frame.timestamp);
        count_frame(record, frame.kind);

        let revealed = reveal.map(|r| {
            log::info!("Revealed hidden SSID '{}' for {} ({:?})", r.ssid, bssid, r.evidence);
            record.ssid = Some(r.ssid);
            record.hidden = false;
            record.revealed_by = Some(r.evidence);
            r.evidence
        });

        if let Some(a) = &anomaly {
            log::warn!("SSID mismatch: {}", a);
            record.ssid = Some(a.observed.clone());
            record.bssid_anomalies += 1;
        }

        Ok(Observation {
            bssid,
            created: false,
            revealed,
            anomaly,
        })
    }

    fn create(&mut self, bssid: MacAddr, frame: &Frame) {
        let mut record = NetworkRecord::new(bssid, frame.timestamp);
        record.ssid = frame.advertised_ssid().cloned();
        record.hidden = record.ssid.is_none();
        record.channel = frame.channel;
        record.capabilities = frame.capabilities;
        record.security = frame.security();
        record.vendor = self.vendors.lookup_mac(&bssid);
        count_frame(&mut record, frame.kind);

        log::info!(
            "New network {} '{}' ch={} {} vendor={}",
            bssid,
            record.display_ssid(),
            record.channel.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()),
            record.security,
            record.vendor.as_deref().unwrap_or("unknown")
        );

        self.index.insert(bssid, self.records.len());
        self.records.push(record);
    }

    pub fn get(&self, bssid: &MacAddr) -> Option<&NetworkRecord> {
        self.index.get(bssid).map(|&idx| &self.records[idx])
    }

    /// Point-in-time copy in discovery order
    pub fn snapshot(&self) -> Vec<NetworkRecord> {
        self.records.clone()
    }

    /// Overwrite the current classification of a record
    pub fn set_classification(&mut self, bssid: &MacAddr, classification: Classification) -> bool {
        match self.index.get(bssid) {
            Some(&idx) => {
                self.records[idx].classification = Some(classification);
                true
            }
            None => false,
        }
    }

    /// BSSIDs not seen within `threshold` of `now`
    pub fn stale(&self, now: CaptureTime, threshold: Duration) -> Vec<MacAddr> {
        self.records
            .iter()
            .filter(|r| now.since(r.last_seen) > threshold)
            .map(|r| r.bssid)
            .collect()
    }

    pub fn hidden_count(&self) -> usize {
        self.records.iter().filter(|r| r.hidden).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn count_frame(record: &mut NetworkRecord, kind: FrameKind) {
    match kind {
        FrameKind::Beacon => record.beacon_count += 1,
        FrameKind::ProbeResponse => record.probe_response_count += 1,
        FrameKind::ProbeRequest => {}
    }
}
