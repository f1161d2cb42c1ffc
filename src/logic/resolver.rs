//! Hidden-SSID Resolver
//!
//! Decides when a hidden network's name may be revealed. A station probing
//! for a known network names it in a ProbeRequest; the AP answers with a
//! ProbeResponse carrying the same SSID from its BSSID. Probes are kept in a
//! short-lived client -> SSID map, swept lazily, so memory stays bounded.
//!
//! The resolver never writes records. It hands a `Reveal` to the registry.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::frame::{CaptureTime, Frame, FrameKind, MacAddr, Ssid};

// ============================================================================
// TYPES
// ============================================================================

/// What justified a reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevealEvidence {
    /// ProbeResponse carrying the SSID, no matching probe on record
    ProbeResponse,
    /// ProbeResponse whose SSID a client probed for within the retention window
    CorrelatedProbe { client: MacAddr },
    /// Beacon re-broadcast carrying the SSID
    Beacon,
}

/// Reveal decision handed to the registry
#[derive(Debug, Clone, PartialEq)]
pub struct Reveal {
    pub ssid: Ssid,
    pub evidence: RevealEvidence,
}

#[derive(Debug, Clone)]
struct ProbeEntry {
    ssid: Ssid,
    seen_at: CaptureTime,
}

/// Resolver counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverStats {
    pub probes_noted: u64,
    pub wildcard_probes: u64,
    pub reveals: u64,
    pub correlated_reveals: u64,
    pub evictions: u64,
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug)]
pub struct HiddenSsidResolver {
    probes: HashMap<MacAddr, ProbeEntry>,
    retention: Duration,
    max_clients: usize,
    last_sweep: CaptureTime,
    stats: ResolverStats,
}

impl Default for HiddenSsidResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(constants::DEFAULT_PROBE_RETENTION_SECS))
    }
}

impl HiddenSsidResolver {
    pub fn new(retention: Duration) -> Self {
        Self::with_capacity(retention, constants::MAX_TRACKED_CLIENTS)
    }

    pub fn with_capacity(retention: Duration, max_clients: usize) -> Self {
        Self {
            probes: HashMap::new(),
            retention,
            max_clients: max_clients.max(1),
            last_sweep: CaptureTime(0),
            stats: ResolverStats::default(),
        }
    }

    /// Remember the SSID a client probed for. Wildcard probes are ignored.
    pub fn note_probe(&mut self, frame: &Frame) {
        if frame.kind != FrameKind::ProbeRequest {
            return;
        }
        let Some(client) = frame.client_mac else { return };
        let Some(ssid) = frame.advertised_ssid() else {
            self.stats.wildcard_probes += 1;
            return;
        };

        self.sweep(frame.timestamp);

        if !self.probes.contains_key(&client) && self.probes.len() >= self.max_clients {
            self.evict_oldest();
        }
        self.probes.insert(
            client,
            ProbeEntry {
                ssid: ssid.clone(),
                seen_at: frame.timestamp,
            },
        );
        self.stats.probes_noted += 1;
    }

    /// Decide whether `frame` reveals the SSID of a record that is
    /// currently hidden. Returns `None` for records already known.
    pub fn decide(&mut self, frame: &Frame, currently_hidden: bool) -> Option<Reveal> {
        if !currently_hidden {
            return None;
        }
        let ssid = frame.advertised_ssid()?.clone();

        let evidence = match frame.kind {
            FrameKind::ProbeResponse => {
                self.sweep(frame.timestamp);
                match self.probing_client(&ssid, frame.timestamp) {
                    Some(client) => {
                        self.stats.correlated_reveals += 1;
                        RevealEvidence::CorrelatedProbe { client }
                    }
                    None => RevealEvidence::ProbeResponse,
                }
            }
            FrameKind::Beacon => RevealEvidence::Beacon,
            FrameKind::ProbeRequest => return None,
        };

        self.stats.reveals += 1;
        Some(Reveal { ssid, evidence })
    }

    /// Client that most recently probed for `ssid` within the window
    fn probing_client(&self, ssid: &Ssid, now: CaptureTime) -> Option<MacAddr> {
        self.probes
            .iter()
            .filter(|(_, e)| &e.ssid == ssid && now.since(e.seen_at) <= self.retention)
            .max_by_key(|(mac, e)| (e.seen_at, **mac))
            .map(|(mac, _)| *mac)
    }

    /// Drop expired entries, at most once per retention window
    fn sweep(&mut self, now: CaptureTime) {
        if now.since(self.last_sweep) < self.retention && !self.probes.is_empty() {
            return;
        }
        self.last_sweep = now;

        let retention = self.retention;
        let before = self.probes.len();
        self.probes.retain(|_, e| now.since(e.seen_at) <= retention);
        self.stats.evictions += (before - self.probes.len()) as u64;
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .probes
            .iter()
            .min_by_key(|(mac, e)| (e.seen_at, **mac))
            .map(|(mac, _)| *mac);
        if let Some(mac) = oldest {
            self.probes.remove(&mac);
            self.stats.evictions += 1;
        }
    }

    /// Clients currently tracked (including not-yet-swept expired ones)
    pub fn tracked_clients(&self) -> usize {
        self.probes.len()
    }

    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::fixtures::{beacon, probe_request, probe_response, AP_CORP, AP_HOME, CLIENT};

    fn resolver() -> HiddenSsidResolver {
        HiddenSsidResolver::new(Duration::from_secs(5))
    }

    #[test]
    fn test_correlated_probe_reveal() {
        let mut r = resolver();
        r.note_probe(&probe_request(CLIENT, "CorpWifi", 10));

        let reveal = r.decide(&probe_response(AP_CORP, "CorpWifi", 12), true).unwrap();
        assert_eq!(reveal.ssid, Ssid::from("CorpWifi"));
        assert_eq!(reveal.evidence, RevealEvidence::CorrelatedProbe { client: CLIENT });
        assert_eq!(r.stats().correlated_reveals, 1);
    }

    #[test]
    fn test_probe_outside_window_not_correlated() {
        let mut r = resolver();
        r.note_probe(&probe_request(CLIENT, "CorpWifi", 10));

        let reveal = r.decide(&probe_response(AP_CORP, "CorpWifi", 30), true).unwrap();
        assert_eq!(reveal.evidence, RevealEvidence::ProbeResponse);
        assert_eq!(r.tracked_clients(), 0);
        assert_eq!(r.stats().evictions, 1);
    }

    #[test]
    fn test_no_reveal_for_known_or_blank() {
        let mut r = resolver();
        assert!(r.decide(&probe_response(AP_HOME, "HomeNet", 1), false).is_none());
        assert!(r.decide(&probe_response(AP_HOME, "", 1), true).is_none());
        assert_eq!(r.stats().reveals, 0);
    }

    #[test]
    fn test_beacon_rebroadcast_reveals() {
        let mut r = resolver();
        let reveal = r.decide(&beacon(AP_HOME, "HomeNet", 1), true).unwrap();
        assert_eq!(reveal.evidence, RevealEvidence::Beacon);
    }

    #[test]
    fn test_wildcard_probe_ignored() {
        let mut r = resolver();
        r.note_probe(&probe_request(CLIENT, "", 1));
        assert_eq!(r.tracked_clients(), 0);
        assert_eq!(r.stats().wildcard_probes, 1);
    }

    #[test]
    fn test_client_cap_evicts_oldest() {
        let mut r = HiddenSsidResolver::with_capacity(Duration::from_secs(60), 2);
        let c1 = MacAddr([2, 0, 0, 0, 0, 1]);
        let c2 = MacAddr([2, 0, 0, 0, 0, 2]);
        let c3 = MacAddr([2, 0, 0, 0, 0, 3]);
        r.note_probe(&probe_request(c1, "One", 1));
        r.note_probe(&probe_request(c2, "Two", 2));
        r.note_probe(&probe_request(c3, "Three", 3));

        assert_eq!(r.tracked_clients(), 2);
        let reveal = r.decide(&probe_response(AP_HOME, "One", 4), true).unwrap();
        assert_eq!(reveal.evidence, RevealEvidence::ProbeResponse);
        let reveal = r.decide(&probe_response(AP_CORP, "Three", 4), true).unwrap();
        assert_eq!(reveal.evidence, RevealEvidence::CorrelatedProbe { client: c3 });
    }

    #[test]
    fn test_latest_probe_per_client_wins() {
        let mut r = resolver();
        r.note_probe(&probe_request(CLIENT, "First", 1));
        r.note_probe(&probe_request(CLIENT, "Second", 2));
        assert_eq!(r.tracked_clients(), 1);

        let reveal = r.decide(&probe_response(AP_HOME, "First", 3), true).unwrap();
        assert_eq!(reveal.evidence, RevealEvidence::ProbeResponse);
    }
}
