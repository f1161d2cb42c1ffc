//! Radiotap Header Parser
//!
//! Extracts the few fields the observer needs (flags, channel frequency,
//! antenna signal) and locates the start of the 802.11 frame.
//! Field alignment is relative to the start of the radiotap header.

use super::types::MalformedFrame;

/// Radiotap present bits
pub mod present {
    pub const TSFT: u32 = 1 << 0;
    pub const FLAGS: u32 = 1 << 1;
    pub const RATE: u32 = 1 << 2;
    pub const CHANNEL: u32 = 1 << 3;
    pub const FHSS: u32 = 1 << 4;
    pub const DBM_ANTSIGNAL: u32 = 1 << 5;
    pub const EXT: u32 = 1 << 31;
}

/// Bits of the FLAGS field
pub mod flags {
    /// Frame includes a trailing FCS
    pub const FCS_AT_END: u8 = 0x10;
    /// Driver reported a bad FCS
    pub const BAD_FCS: u8 = 0x40;
}

/// Fields extracted from a radiotap header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadiotapInfo {
    /// Total header length; the 802.11 frame starts here
    pub length: usize,
    pub flags: Option<u8>,
    pub channel_freq: Option<u16>,
    pub signal_dbm: Option<i8>,
}

impl RadiotapInfo {
    pub fn has_fcs(&self) -> bool {
        self.flags.map(|f| f & flags::FCS_AT_END != 0).unwrap_or(false)
    }

    pub fn bad_fcs(&self) -> bool {
        self.flags.map(|f| f & flags::BAD_FCS != 0).unwrap_or(false)
    }

    pub fn channel(&self) -> Option<u8> {
        self.channel_freq.and_then(freq_to_channel)
    }
}

/// Convert a centre frequency (MHz) to an 802.11 channel number
pub fn freq_to_channel(freq: u16) -> Option<u8> {
    let channel = match freq {
        2484 => 14,
        2412..=2472 => (freq - 2407) / 5,
        5160..=5885 => (freq - 5000) / 5,
        // 4.9 GHz public safety band
        4915..=4980 => (freq - 4000) / 5,
        // 6 GHz: channel 2 sits below the regular 20 MHz raster
        5935 => 2,
        5955..=7115 => (freq - 5950) / 5,
        _ => return None,
    };
    u8::try_from(channel).ok()
}

/// Parse a radiotap header at the start of `data`
pub fn parse(data: &[u8]) -> Result<RadiotapInfo, MalformedFrame> {
    if data.len() < 8 {
        return Err(MalformedFrame::Truncated);
    }
    if data[0] != 0 {
        return Err(MalformedFrame::InvalidRadiotap(format!("unsupported version {}", data[0])));
    }

    let length = u16::from_le_bytes([data[2], data[3]]) as usize;
    if length < 8 {
        return Err(MalformedFrame::InvalidRadiotap(format!("header length {length} too short")));
    }
    if length > data.len() {
        return Err(MalformedFrame::Truncated);
    }
    let header = &data[..length];

    // Present words chain through bit 31; only the first word's
    // standard fields are decoded, the rest are skipped over.
    let mut pos = 4;
    let mut words = Vec::with_capacity(1);
    loop {
        let word = read_u32(header, pos).ok_or_else(|| {
            MalformedFrame::InvalidRadiotap("present bitmap overruns header".to_string())
        })?;
        words.push(word);
        pos += 4;
        if word & present::EXT == 0 {
            break;
        }
    }
    let bits = words[0];

    let mut info = RadiotapInfo {
        length,
        ..Default::default()
    };

    if bits & present::TSFT != 0 {
        pos = field(header, pos, 8, 8)?;
    }
    if bits & present::FLAGS != 0 {
        let at = pos;
        pos = field(header, pos, 1, 1)?;
        info.flags = Some(header[at]);
    }
    if bits & present::RATE != 0 {
        pos = field(header, pos, 1, 1)?;
    }
    if bits & present::CHANNEL != 0 {
        let at = align(pos, 2);
        pos = field(header, pos, 4, 2)?;
        let freq = u16::from_le_bytes([header[at], header[at + 1]]);
        if freq != 0 {
            info.channel_freq = Some(freq);
        }
    }
    if bits & present::FHSS != 0 {
        pos = field(header, pos, 2, 1)?;
    }
    if bits & present::DBM_ANTSIGNAL != 0 {
        let at = pos;
        field(header, pos, 1, 1)?;
        info.signal_dbm = Some(header[at] as i8);
    }

    Ok(info)
}

fn align(pos: usize, to: usize) -> usize {
    (pos + to - 1) / to * to
}

/// Advance past a field, returning the position after it
fn field(header: &[u8], pos: usize, size: usize, alignment: usize) -> Result<usize, MalformedFrame> {
    let start = align(pos, alignment);
    let end = start + size;
    if end > header.len() {
        return Err(MalformedFrame::InvalidRadiotap(
            "field runs past header length".to_string(),
        ));
    }
    Ok(end)
}

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
