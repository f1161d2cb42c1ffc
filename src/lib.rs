//! WifiObserver - passive Wi-Fi discovery core
//!
//! Receive-only: decodes management frames, tracks access points, recovers
//! hidden SSIDs, summarises signal strength and attaches heuristic
//! categories. Nothing here transmits or joins a network.

pub mod api;
pub mod constants;
pub mod logic;
