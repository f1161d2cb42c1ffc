//! Frame Module
//!
//! Turns captured packets into typed management frames.
//!
//! ## Structure
//! - `types`: Frame, MacAddr, Ssid, Capabilities, Security, MalformedFrame
//! - `radiotap`: radiotap header walk (flags, channel, antenna signal)
//! - `decoder`: 802.11 management header + information elements
//!
//! ## Usage
//! ```ignore
//! use crate::logic::frame::{decode, RawFrame};
//!
//! match decode(&raw) {
//!     Ok(frame) => registry.observe(&frame, &mut resolver),
//!     Err(e) => stats.record_malformed(&e),
//! }
//! ```

pub mod types;
pub mod radiotap;
pub mod decoder;

pub use types::{
    Capabilities,
    CaptureTime,
    Frame,
    FrameKind,
    LinkType,
    MacAddr,
    MalformedFrame,
    RawFrame,
    Security,
    Ssid,
    MAX_SSID_LEN,
};

pub use decoder::decode;
