//! Test fixtures: raw radiotap/802.11 frame builder and decoded frame helpers

use super::frame::{Capabilities, CaptureTime, Frame, FrameKind, LinkType, MacAddr, RawFrame, Ssid};

pub const AP_HOME: MacAddr = MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01]);
pub const AP_CORP: MacAddr = MacAddr([0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]);
pub const CLIENT: MacAddr = MacAddr([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);

pub const WPA2_PSK: u32 = Capabilities::ESS | Capabilities::PRIVACY | Capabilities::RSN | Capabilities::PSK;

// ============================================================================
// DECODED FRAMES
// ============================================================================

pub fn frame(kind: FrameKind, mac: MacAddr, ssid: &str, secs: u64) -> Frame {
    let (bssid, client_mac) = match kind {
        FrameKind::ProbeRequest => (None, Some(mac)),
        _ => (Some(mac), None),
    };
    Frame {
        kind,
        bssid,
        client_mac,
        ssid: Some(Ssid::from(ssid)),
        channel: Some(6),
        capabilities: Capabilities(WPA2_PSK),
        signal_dbm: Some(-55),
        timestamp: CaptureTime::from_secs(secs),
    }
}

pub fn beacon(bssid: MacAddr, ssid: &str, secs: u64) -> Frame {
    frame(FrameKind::Beacon, bssid, ssid, secs)
}

pub fn probe_response(bssid: MacAddr, ssid: &str, secs: u64) -> Frame {
    frame(FrameKind::ProbeResponse, bssid, ssid, secs)
}

pub fn probe_request(client: MacAddr, ssid: &str, secs: u64) -> Frame {
    frame(FrameKind::ProbeRequest, client, ssid, secs)
}

// ============================================================================
// RAW FRAME BUILDER
// ============================================================================

/// Builds on-air bytes for the three management subtypes
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    subtype: u8,
    fc0: Option<u8>,
    addr2: MacAddr,
    addr3: MacAddr,
    ssid: Option<Vec<u8>>,
    ds_channel: Option<u8>,
    capability: u16,
    extra_ies: Vec<u8>,
    signal: Option<i8>,
    freq: Option<u16>,
    fcs: bool,
    corrupt_fcs: bool,
    timestamp: CaptureTime,
}

const BROADCAST: MacAddr = MacAddr([0xFF; 6]);

impl FrameBuilder {
    fn new(subtype: u8, addr2: MacAddr, addr3: MacAddr) -> Self {
        Self {
            subtype,
            fc0: None,
            addr2,
            addr3,
            ssid: None,
            ds_channel: None,
            capability: 0x0001,
            extra_ies: Vec::new(),
            signal: None,
            freq: None,
            fcs: false,
            corrupt_fcs: false,
            timestamp: CaptureTime(0),
        }
    }

    pub fn beacon(bssid: MacAddr) -> Self {
        Self::new(8, bssid, bssid)
    }

    pub fn probe_response(bssid: MacAddr) -> Self {
        Self::new(5, bssid, bssid)
    }

    pub fn probe_request(client: MacAddr) -> Self {
        Self::new(4, client, BROADCAST)
    }

    /// Arbitrary first frame-control byte, for negative tests
    pub fn frame_control(fc0: u8, addr: MacAddr) -> Self {
        let mut b = Self::new(fc0 >> 4, addr, addr);
        b.fc0 = Some(fc0);
        b
    }

    pub fn ssid(mut self, ssid: &str) -> Self {
        self.ssid = Some(ssid.as_bytes().to_vec());
        self
    }

    pub fn ssid_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.ssid = Some(bytes);
        self
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.ds_channel = Some(channel);
        self
    }

    pub fn privacy(mut self) -> Self {
        self.capability |= 0x0010;
        self
    }

    /// Append an RSN element advertising one AKM suite
    pub fn rsn(mut self, akm: u8) -> Self {
        let body = [
            0x01, 0x00, // version
            0x00, 0x0F, 0xAC, 0x04, // group CCMP
            0x01, 0x00, 0x00, 0x0F, 0xAC, 0x04, // pairwise CCMP
            0x01, 0x00, 0x00, 0x0F, 0xAC, akm,
        ];
        self.extra_ies.push(48);
        self.extra_ies.push(body.len() as u8);
        self.extra_ies.extend_from_slice(&body);
        self
    }

    /// Append a legacy WPA vendor element (PSK, TKIP)
    pub fn wpa(mut self) -> Self {
        let body = [
            0x00, 0x50, 0xF2, 0x01, // OUI + type
            0x01, 0x00, // version
            0x00, 0x50, 0xF2, 0x02, // group TKIP
            0x01, 0x00, 0x00, 0x50, 0xF2, 0x02,
            0x01, 0x00, 0x00, 0x50, 0xF2, 0x02, // AKM PSK
        ];
        self.extra_ies.push(221);
        self.extra_ies.push(body.len() as u8);
        self.extra_ies.extend_from_slice(&body);
        self
    }

    /// Append arbitrary element bytes verbatim
    pub fn raw_ie(mut self, bytes: &[u8]) -> Self {
        self.extra_ies.extend_from_slice(bytes);
        self
    }

    pub fn signal(mut self, dbm: i8) -> Self {
        self.signal = Some(dbm);
        self
    }

    pub fn freq(mut self, mhz: u16) -> Self {
        self.freq = Some(mhz);
        self
    }

    pub fn with_fcs(mut self) -> Self {
        self.fcs = true;
        self
    }

    pub fn corrupt_fcs(mut self) -> Self {
        self.fcs = true;
        self.corrupt_fcs = true;
        self
    }

    pub fn at(mut self, secs: u64) -> Self {
        self.timestamp = CaptureTime::from_secs(secs);
        self
    }

    /// 802.11 frame bytes (no radiotap)
    pub fn dot11(&self) -> Vec<u8> {
        let mut out = vec![self.fc0.unwrap_or(self.subtype << 4), 0x00, 0x00, 0x00];
        out.extend_from_slice(&BROADCAST.0);
        out.extend_from_slice(&self.addr2.0);
        out.extend_from_slice(&self.addr3.0);
        out.extend_from_slice(&[0x00, 0x00]); // sequence control

        if self.fc0.is_none() && (self.subtype == 8 || self.subtype == 5) {
            out.extend_from_slice(&[0u8; 8]); // TSF
            out.extend_from_slice(&100u16.to_le_bytes()); // beacon interval
            out.extend_from_slice(&self.capability.to_le_bytes());
        }

        if let Some(ssid) = &self.ssid {
            out.push(0);
            out.push(ssid.len() as u8);
            out.extend_from_slice(ssid);
        }
        if let Some(ch) = self.ds_channel {
            out.extend_from_slice(&[3, 1, ch]);
        }
        out.extend_from_slice(&self.extra_ies);

        if self.fcs {
            let mut crc = crc32fast::hash(&out);
            if self.corrupt_fcs {
                crc ^= 0xFFFF_FFFF;
            }
            out.extend_from_slice(&crc.to_le_bytes());
        }
        out
    }

    fn radiotap(&self) -> Vec<u8> {
        let mut present = 0u32;
        let mut fields = Vec::new();
        if self.fcs {
            present |= 1 << 1;
            fields.push(0x10);
        }
        if let Some(freq) = self.freq {
            present |= 1 << 3;
            // fields start at offset 8, channel aligns to 2
            if fields.len() % 2 == 1 {
                fields.push(0);
            }
            fields.extend_from_slice(&freq.to_le_bytes());
            fields.extend_from_slice(&0x00A0u16.to_le_bytes());
        }
        if let Some(dbm) = self.signal {
            present |= 1 << 5;
            fields.push(dbm as u8);
        }

        let len = (8 + fields.len()) as u16;
        let mut out = vec![0u8, 0];
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&present.to_le_bytes());
        out.extend_from_slice(&fields);
        out
    }

    /// Radiotap-framed capture record
    pub fn build(&self) -> RawFrame {
        let mut data = self.radiotap();
        data.extend_from_slice(&self.dot11());
        RawFrame::new(data, self.timestamp, LinkType::Radiotap)
    }

    /// Bare 802.11 capture record
    pub fn build_bare(&self) -> RawFrame {
        RawFrame::new(self.dot11(), self.timestamp, LinkType::Ieee80211)
    }
}
