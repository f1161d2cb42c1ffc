//! Frame Types
//!
//! Value objects produced by the decoder. No parsing logic lives here.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// MAC ADDRESS
// ============================================================================

/// 48-bit IEEE 802 hardware address (BSSID or station address)
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create from a byte slice; `None` unless exactly 6 bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 6] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Parse `aa:bb:cc:dd:ee:ff` (case-insensitive, `-` also accepted)
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return None;
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 {
                return None;
            }
            bytes[i] = u8::from_str_radix(part, 16).ok()?;
        }
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Vendor prefix (first three octets)
    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    /// Locally administered bit - set on randomized addresses
    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Broadcast and all-zero addresses cannot identify a station
    pub fn is_station(&self) -> bool {
        self.0 != [0xFF; 6] && self.0 != [0; 6]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({self})")
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MacAddr::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid MAC address '{s}'")))
    }
}

// ============================================================================
// SSID
// ============================================================================

/// Maximum SSID length allowed by 802.11
pub const MAX_SSID_LEN: usize = 32;

/// Raw SSID octets. Not guaranteed to be UTF-8.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Ssid(Vec<u8>);

impl Ssid {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empty or NUL-filled: the AP is not advertising its name
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Case-folded text used by the classification rules
    pub fn to_upper_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).to_uppercase()
    }
}

impl From<&str> for Ssid {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl fmt::Display for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if !s.chars().any(char::is_control) => f.write_str(s),
            _ => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

impl fmt::Debug for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ssid({:?})", self.to_string())
    }
}

impl Serialize for Ssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ssid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Ssid::from(s.as_str()))
    }
}

// ============================================================================
// CAPTURE TIME
// ============================================================================

/// Monotonic capture time in microseconds, as supplied by the capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureTime(pub u64);

impl CaptureTime {
    pub fn from_duration(d: Duration) -> Self {
        Self(d.as_micros() as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    /// Elapsed time since `earlier`; zero if `earlier` is in the future
    pub fn since(&self, earlier: CaptureTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

// ============================================================================
// FRAME KIND
// ============================================================================

/// The management frame subtypes the core understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    Beacon,
    ProbeRequest,
    ProbeResponse,
}

impl FrameKind {
    /// Management subtype number in the frame control field
    pub fn from_subtype(subtype: u8) -> Option<Self> {
        match subtype {
            4 => Some(FrameKind::ProbeRequest),
            5 => Some(FrameKind::ProbeResponse),
            8 => Some(FrameKind::Beacon),
            _ => None,
        }
    }

    /// Frames sent by an access point (carry a BSSID)
    pub fn is_from_ap(&self) -> bool {
        matches!(self, FrameKind::Beacon | FrameKind::ProbeResponse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Beacon => "beacon",
            FrameKind::ProbeRequest => "probe_request",
            FrameKind::ProbeResponse => "probe_response",
        }
    }
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// Capability bitset merged from the capability-info field and security IEs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(pub u32);

impl Capabilities {
    pub const ESS: u32 = 1 << 0;
    pub const IBSS: u32 = 1 << 1;
    pub const PRIVACY: u32 = 1 << 2;
    pub const SHORT_PREAMBLE: u32 = 1 << 3;
    pub const QOS: u32 = 1 << 4;
    pub const SHORT_SLOT: u32 = 1 << 5;
    /// WPA vendor IE present
    pub const WPA: u32 = 1 << 8;
    /// RSN IE present (WPA2 or later)
    pub const RSN: u32 = 1 << 9;
    pub const PSK: u32 = 1 << 10;
    pub const IEEE8021X: u32 = 1 << 11;
    pub const SAE: u32 = 1 << 12;
    /// WPA3-Enterprise 192-bit (Suite-B) AKM
    pub const SUITE_B: u32 = 1 << 13;
    pub const CCMP: u32 = 1 << 14;
    pub const TKIP: u32 = 1 << 15;

    const NAMES: [(u32, &'static str); 14] = [
        (Self::ESS, "ess"),
        (Self::IBSS, "ibss"),
        (Self::PRIVACY, "privacy"),
        (Self::SHORT_PREAMBLE, "short_preamble"),
        (Self::QOS, "qos"),
        (Self::SHORT_SLOT, "short_slot"),
        (Self::WPA, "wpa"),
        (Self::RSN, "rsn"),
        (Self::PSK, "psk"),
        (Self::IEEE8021X, "802.1x"),
        (Self::SAE, "sae"),
        (Self::SUITE_B, "suite_b"),
        (Self::CCMP, "ccmp"),
        (Self::TKIP, "tkip"),
    ];

    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits == bits
    }

    pub fn insert(&mut self, bits: u32) {
        self.0 |= bits;
    }

    pub fn with(mut self, bits: u32) -> Self {
        self.insert(bits);
        self
    }

    /// Names of the set bits, for reports
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Derive the security posture. Strongest advertised mechanism wins.
    pub fn security(&self) -> Security {
        if self.contains(Self::SUITE_B) {
            Security::Wpa3Enterprise
        } else if self.contains(Self::SAE) {
            Security::Wpa3Personal
        } else if self.contains(Self::RSN) && self.contains(Self::IEEE8021X) {
            Security::Wpa2Enterprise
        } else if self.contains(Self::RSN) {
            Security::Wpa2Personal
        } else if self.contains(Self::WPA) {
            Security::Wpa
        } else if self.contains(Self::PRIVACY) {
            Security::Wep
        } else {
            Security::Open
        }
    }
}

// ============================================================================
// SECURITY
// ============================================================================

/// Security posture derived from the latest observed capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Security {
    Open,
    Wep,
    Wpa,
    Wpa2Personal,
    Wpa2Enterprise,
    Wpa3Personal,
    Wpa3Enterprise,
}

impl Security {
    pub fn as_str(&self) -> &'static str {
        match self {
            Security::Open => "Open",
            Security::Wep => "WEP",
            Security::Wpa => "WPA",
            Security::Wpa2Personal => "WPA2-Personal",
            Security::Wpa2Enterprise => "WPA2-Enterprise",
            Security::Wpa3Personal => "WPA3-Personal",
            Security::Wpa3Enterprise => "WPA3-Enterprise",
        }
    }

    /// 802.1X authentication (WPA2/WPA3-Enterprise)
    pub fn is_enterprise(&self) -> bool {
        matches!(self, Security::Wpa2Enterprise | Security::Wpa3Enterprise)
    }

    /// Open or WEP - what legacy IoT devices ship with
    pub fn is_weak(&self) -> bool {
        matches!(self, Security::Open | Security::Wep)
    }

    pub fn is_wpa3(&self) -> bool {
        matches!(self, Security::Wpa3Personal | Security::Wpa3Enterprise)
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RAW FRAME (capture collaborator input)
// ============================================================================

/// Link-layer framing of a captured packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// Radiotap header followed by an 802.11 frame (DLT 127)
    Radiotap,
    /// Bare 802.11 frame (DLT 105)
    Ieee80211,
}

impl LinkType {
    pub fn from_dlt(dlt: u32) -> Option<Self> {
        match dlt {
            127 => Some(LinkType::Radiotap),
            105 => Some(LinkType::Ieee80211),
            _ => None,
        }
    }
}

/// One packet as handed over by the capture source
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub timestamp: CaptureTime,
    pub link: LinkType,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, timestamp: CaptureTime, link: LinkType) -> Self {
        Self { data, timestamp, link }
    }
}

// ============================================================================
// DECODE ERRORS
// ============================================================================

/// Why a packet could not be turned into a `Frame`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedFrame {
    /// Packet or information element shorter than its declared length
    Truncated,
    /// Not a Beacon, ProbeRequest or ProbeResponse
    UnsupportedFrame,
    /// SSID element longer than 32 octets
    SsidTooLong(usize),
    InvalidRadiotap(String),
    /// Trailing FCS did not match, or the driver flagged it bad
    FcsMismatch,
    /// Frame lacks the address it must carry
    MissingAddress,
}

impl fmt::Display for MalformedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedFrame::Truncated => write!(f, "frame truncated"),
            MalformedFrame::UnsupportedFrame => write!(f, "unsupported frame type"),
            MalformedFrame::SsidTooLong(len) => write!(f, "SSID element too long ({len} bytes)"),
            MalformedFrame::InvalidRadiotap(why) => write!(f, "invalid radiotap header: {why}"),
            MalformedFrame::FcsMismatch => write!(f, "FCS mismatch"),
            MalformedFrame::MissingAddress => write!(f, "missing address"),
        }
    }
}

impl std::error::Error for MalformedFrame {}

impl MalformedFrame {
    /// Short label used as a counter key in session statistics
    pub fn kind(&self) -> &'static str {
        match self {
            MalformedFrame::Truncated => "truncated",
            MalformedFrame::UnsupportedFrame => "unsupported",
            MalformedFrame::SsidTooLong(_) => "ssid_too_long",
            MalformedFrame::InvalidRadiotap(_) => "invalid_radiotap",
            MalformedFrame::FcsMismatch => "fcs_mismatch",
            MalformedFrame::MissingAddress => "missing_address",
        }
    }
}

// ============================================================================
// FRAME (decoder output)
// ============================================================================

/// A decoded management frame. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub kind: FrameKind,
    /// Access point address (Beacon / ProbeResponse)
    pub bssid: Option<MacAddr>,
    /// Probing station (ProbeRequest)
    pub client_mac: Option<MacAddr>,
    /// `None` when no SSID element was present
    pub ssid: Option<Ssid>,
    /// 1-196, `None` when unknown
    pub channel: Option<u8>,
    pub capabilities: Capabilities,
    /// Antenna signal in dBm when the capture supplied it
    pub signal_dbm: Option<i8>,
    pub timestamp: CaptureTime,
}

impl Frame {
    /// The SSID if it actually names a network (absent, empty and
    /// NUL-filled all count as hidden)
    pub fn advertised_ssid(&self) -> Option<&Ssid> {
        self.ssid.as_ref().filter(|s| !s.is_blank())
    }

    pub fn security(&self) -> Security {
        self.capabilities.security()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_and_display() {
        let mac = MacAddr::parse("aa:bb:cc:dd:ee:01").unwrap();
        assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:01");
        assert_eq!(MacAddr::parse("AA-BB-CC-DD-EE-01"), Some(mac));
        assert!(MacAddr::parse("aa:bb:cc").is_none());
        assert!(MacAddr::parse("zz:bb:cc:dd:ee:ff").is_none());
        assert!(MacAddr::parse("").is_none());
    }

    #[test]
    fn test_mac_flags() {
        let random = MacAddr([0x92, 0, 0, 0, 0, 1]);
        assert!(random.is_locally_administered());
        let vendor = MacAddr([0x00, 0x17, 0xF2, 0, 0, 1]);
        assert!(!vendor.is_locally_administered());
        assert_eq!(vendor.oui(), [0x00, 0x17, 0xF2]);
    }

    #[test]
    fn test_ssid_blank_and_display() {
        assert!(Ssid::new(vec![]).is_blank());
        assert!(Ssid::new(vec![0, 0, 0]).is_blank());
        assert!(!Ssid::from("HomeNet").is_blank());
        assert_eq!(Ssid::from("HomeNet").to_string(), "HomeNet");
        assert_eq!(Ssid::new(vec![0xff, 0x01]).to_string(), "0xff01");
    }

    #[test]
    fn test_security_derivation() {
        assert_eq!(Capabilities::default().security(), Security::Open);
        assert_eq!(Capabilities(Capabilities::PRIVACY).security(), Security::Wep);
        let wpa = Capabilities(Capabilities::PRIVACY | Capabilities::WPA);
        assert_eq!(wpa.security(), Security::Wpa);
        let wpa2 = Capabilities(Capabilities::PRIVACY | Capabilities::RSN | Capabilities::PSK);
        assert_eq!(wpa2.security(), Security::Wpa2Personal);
        let ent = wpa2.with(Capabilities::IEEE8021X);
        assert_eq!(ent.security(), Security::Wpa2Enterprise);
        assert!(ent.security().is_enterprise());
        let sae = wpa2.with(Capabilities::SAE);
        assert_eq!(sae.security(), Security::Wpa3Personal);
        let suite_b = ent.with(Capabilities::SUITE_B);
        assert_eq!(suite_b.security(), Security::Wpa3Enterprise);
    }

    #[test]
    fn test_advertised_ssid_treats_blank_as_hidden() {
        let mut frame = Frame {
            kind: FrameKind::Beacon,
            bssid: Some(MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01])),
            client_mac: None,
            ssid: None,
            channel: Some(6),
            capabilities: Capabilities::default(),
            signal_dbm: Some(-55),
            timestamp: CaptureTime(0),
        };
        assert!(frame.advertised_ssid().is_none());
        frame.ssid = Some(Ssid::new(vec![]));
        assert!(frame.advertised_ssid().is_none());
        frame.ssid = Some(Ssid::from("HomeNet"));
        assert_eq!(frame.advertised_ssid().unwrap().to_string(), "HomeNet");
    }

    #[test]
    fn test_capture_time_since_saturates() {
        let a = CaptureTime::from_secs(10);
        let b = CaptureTime::from_secs(12);
        assert_eq!(b.since(a), Duration::from_secs(2));
        assert_eq!(a.since(b), Duration::ZERO);
    }
}
