//! Logic Module - Discovery Engines
//!
//! Everything between captured bytes and classified networks.
//!
//! ## Structure
//! - `frame/` - Frame decoding (radiotap + 802.11 management)
//! - `registry/` - Network registry (the only writer of records)
//! - `resolver.rs` - Hidden-SSID resolver (probe correlation)
//! - `signal/` - Per-BSSID signal windows and summaries
//! - `classify/` - Heuristic classification cascade
//! - `session/` - Capture sources, frame queue, session controller
//! - `config.rs` - ScanConfig gathered from `constants`
//!
//! ## Data flow
//! capture -> `frame::decode` -> registry / resolver / signal -> classify
//! -> report sinks

pub mod frame;
pub mod registry;
pub mod resolver;
pub mod signal;
pub mod classify;
pub mod session;
pub mod config;

#[cfg(test)]
pub(crate) mod fixtures;
