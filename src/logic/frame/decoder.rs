//! 802.11 Management Frame Decoder
//!
//! Pure translation from a captured packet to a `Frame`. Keeps no state.

use super::radiotap;
use super::types::{
    Capabilities, Frame, FrameKind, LinkType, MacAddr, MalformedFrame, RawFrame, Ssid, MAX_SSID_LEN,
};

// ============================================================================
// CONSTANTS
// ============================================================================

const MGMT_HEADER_LEN: usize = 24;
/// Timestamp(8) + beacon interval(2) + capability info(2)
const FIXED_PARAMS_LEN: usize = 12;
const FCS_LEN: usize = 4;

/// Highest channel number an element may announce (5 GHz band)
const MAX_CHANNEL: u8 = 196;

mod ie {
    pub const SSID: u8 = 0;
    pub const DS_PARAMS: u8 = 3;
    pub const RSN: u8 = 48;
    pub const HT_OPERATION: u8 = 61;
    pub const VENDOR: u8 = 221;
}

/// Capability-information field bits
mod cap {
    pub const ESS: u16 = 0x0001;
    pub const IBSS: u16 = 0x0002;
    pub const PRIVACY: u16 = 0x0010;
    pub const SHORT_PREAMBLE: u16 = 0x0020;
    pub const QOS: u16 = 0x0200;
    pub const SHORT_SLOT: u16 = 0x0400;
}

const IEEE_OUI: [u8; 3] = [0x00, 0x0F, 0xAC];
const MICROSOFT_OUI: [u8; 3] = [0x00, 0x50, 0xF2];

// ============================================================================
// DECODE
// ============================================================================

/// Decode one captured packet
pub fn decode(raw: &RawFrame) -> Result<Frame, MalformedFrame> {
    let (dot11, signal_dbm, radio_channel) = match raw.link {
        LinkType::Radiotap => {
            let info = radiotap::parse(&raw.data)?;
            if info.bad_fcs() {
                return Err(MalformedFrame::FcsMismatch);
            }
            let body = &raw.data[info.length..];
            let body = if info.has_fcs() { strip_fcs(body)? } else { body };
            (body, info.signal_dbm, info.channel())
        }
        LinkType::Ieee80211 => (raw.data.as_slice(), None, None),
    };

    let mut frame = decode_dot11(dot11)?;
    frame.signal_dbm = signal_dbm;
    // the radio frequency is already band-checked; 6 GHz numbers run past MAX_CHANNEL
    frame.channel = frame
        .channel
        .filter(|c| (1..=MAX_CHANNEL).contains(c))
        .or(radio_channel);
    frame.timestamp = raw.timestamp;
    Ok(frame)
}

fn strip_fcs(data: &[u8]) -> Result<&[u8], MalformedFrame> {
    if data.len() < FCS_LEN {
        return Err(MalformedFrame::Truncated);
    }
    let (body, fcs) = data.split_at(data.len() - FCS_LEN);
    let expected = u32::from_le_bytes([fcs[0], fcs[1], fcs[2], fcs[3]]);
    if crc32fast::hash(body) != expected {
        return Err(MalformedFrame::FcsMismatch);
    }
    Ok(body)
}

/// Decode a bare 802.11 management frame (no FCS)
fn decode_dot11(data: &[u8]) -> Result<Frame, MalformedFrame> {
    if data.len() < 2 {
        return Err(MalformedFrame::Truncated);
    }

    let fc0 = data[0];
    let version = fc0 & 0x03;
    let frame_type = (fc0 >> 2) & 0x03;
    let subtype = fc0 >> 4;
    if version != 0 || frame_type != 0 {
        return Err(MalformedFrame::UnsupportedFrame);
    }
    let kind = FrameKind::from_subtype(subtype).ok_or(MalformedFrame::UnsupportedFrame)?;

    if data.len() < MGMT_HEADER_LEN {
        return Err(MalformedFrame::Truncated);
    }
    let addr2 = mac_at(data, 10)?;
    let addr3 = mac_at(data, 16)?;

    let mut capabilities = Capabilities::default();
    let (bssid, client_mac, ies) = if kind.is_from_ap() {
        if data.len() < MGMT_HEADER_LEN + FIXED_PARAMS_LEN {
            return Err(MalformedFrame::Truncated);
        }
        if !addr3.is_station() {
            return Err(MalformedFrame::MissingAddress);
        }
        let cap_at = MGMT_HEADER_LEN + 10;
        let info = u16::from_le_bytes([data[cap_at], data[cap_at + 1]]);
        capabilities = capability_bits(info);
        (Some(addr3), None, &data[MGMT_HEADER_LEN + FIXED_PARAMS_LEN..])
    } else {
        if !addr2.is_station() {
            return Err(MalformedFrame::MissingAddress);
        }
        (None, Some(addr2), &data[MGMT_HEADER_LEN..])
    };

    let elements = parse_elements(ies, &mut capabilities)?;

    Ok(Frame {
        kind,
        bssid,
        client_mac,
        ssid: elements.ssid,
        channel: elements.ds_channel.or(elements.ht_channel),
        capabilities,
        signal_dbm: None,
        timestamp: Default::default(),
    })
}

fn mac_at(data: &[u8], offset: usize) -> Result<MacAddr, MalformedFrame> {
    data.get(offset..offset + 6)
        .and_then(MacAddr::from_slice)
        .ok_or(MalformedFrame::Truncated)
}

fn capability_bits(info: u16) -> Capabilities {
    const MAP: [(u16, u32); 6] = [
        (cap::ESS, Capabilities::ESS),
        (cap::IBSS, Capabilities::IBSS),
        (cap::PRIVACY, Capabilities::PRIVACY),
        (cap::SHORT_PREAMBLE, Capabilities::SHORT_PREAMBLE),
        (cap::QOS, Capabilities::QOS),
        (cap::SHORT_SLOT, Capabilities::SHORT_SLOT),
    ];

    let mut caps = Capabilities::default();
    for (field_bit, cap_bit) in MAP {
        if info & field_bit != 0 {
            caps.insert(cap_bit);
        }
    }
    caps
}

// ============================================================================
// INFORMATION ELEMENTS
// ============================================================================

#[derive(Default)]
struct Elements {
    ssid: Option<Ssid>,
    ds_channel: Option<u8>,
    ht_channel: Option<u8>,
}

fn parse_elements(mut data: &[u8], caps: &mut Capabilities) -> Result<Elements, MalformedFrame> {
    let mut out = Elements::default();

    while !data.is_empty() {
        if data.len() < 2 {
            return Err(MalformedFrame::Truncated);
        }
        let id = data[0];
        let len = data[1] as usize;
        let body = data.get(2..2 + len).ok_or(MalformedFrame::Truncated)?;
        data = &data[2 + len..];

        match id {
            ie::SSID => {
                if len > MAX_SSID_LEN {
                    return Err(MalformedFrame::SsidTooLong(len));
                }
                // first SSID element wins
                if out.ssid.is_none() {
                    out.ssid = Some(Ssid::new(body));
                }
            }
            ie::DS_PARAMS => {
                if let Some(&ch) = body.first() {
                    out.ds_channel = Some(ch);
                }
            }
            ie::HT_OPERATION => {
                if let Some(&ch) = body.first() {
                    out.ht_channel = Some(ch);
                }
            }
            ie::RSN => {
                caps.insert(Capabilities::RSN);
                // RSN body starts with a 2-byte version
                if body.len() >= 2 {
                    parse_suites(&body[2..], IEEE_OUI, caps);
                }
            }
            ie::VENDOR if body.len() >= 4 && body[..3] == MICROSOFT_OUI => match body[3] {
                1 => {
                    caps.insert(Capabilities::WPA);
                    if body.len() >= 6 {
                        parse_suites(&body[6..], MICROSOFT_OUI, caps);
                    }
                }
                2 => caps.insert(Capabilities::QOS),
                _ => {}
            },
            _ => {}
        }
    }

    Ok(out)
}

/// Walk group cipher, pairwise list and AKM list. A short body just ends
/// the walk; the element length itself was already validated.
fn parse_suites(data: &[u8], oui: [u8; 3], caps: &mut Capabilities) {
    let mut pos = 0;

    let Some(group) = data.get(pos..pos + 4) else { return };
    cipher_bits(group, oui, caps);
    pos += 4;

    let Some(pairwise) = read_suite_list(data, &mut pos) else { return };
    for suite in pairwise.chunks_exact(4) {
        cipher_bits(suite, oui, caps);
    }

    let Some(akms) = read_suite_list(data, &mut pos) else { return };
    for suite in akms.chunks_exact(4) {
        if suite[..3] != oui {
            continue;
        }
        akm_bits(suite[3], oui == MICROSOFT_OUI, caps);
    }
}

fn read_suite_list<'a>(data: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let count = data.get(*pos..*pos + 2)?;
    let count = u16::from_le_bytes([count[0], count[1]]) as usize;
    *pos += 2;
    let list = data.get(*pos..*pos + count * 4)?;
    *pos += count * 4;
    Some(list)
}

fn cipher_bits(suite: &[u8], oui: [u8; 3], caps: &mut Capabilities) {
    if suite[..3] != oui {
        return;
    }
    match suite[3] {
        2 => caps.insert(Capabilities::TKIP),
        4 => caps.insert(Capabilities::CCMP),
        _ => {}
    }
}

fn akm_bits(akm: u8, legacy_wpa: bool, caps: &mut Capabilities) {
    if legacy_wpa {
        match akm {
            1 => caps.insert(Capabilities::IEEE8021X),
            2 => caps.insert(Capabilities::PSK),
            _ => {}
        }
        return;
    }

    match akm {
        1 | 3 | 5 => caps.insert(Capabilities::IEEE8021X),
        2 | 4 | 6 => caps.insert(Capabilities::PSK),
        8 | 9 => caps.insert(Capabilities::SAE),
        11 | 12 | 13 => caps.insert(Capabilities::SUITE_B | Capabilities::IEEE8021X),
        _ => {}
    }
}
