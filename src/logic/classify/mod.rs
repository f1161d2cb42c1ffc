//! Classification Module
//!
//! Heuristic, observational categorisation of discovered networks.
//! Results are hints, never claims about who operates a network.
//!
//! ## Structure
//! - `types`: Category, Classification
//! - `context`: facts derived from a record snapshot
//! - `rules`: naming patterns, vendor lists, tier-order config
//! - `classifier`: the ordered rule cascade
//! - `vendor`: OUI -> vendor lookup
//!
//! ## Usage
//! ```ignore
//! use crate::logic::classify::{classify_with_config, ClassifierConfig};
//!
//! let result = classify_with_config(&record, summary.as_ref(), &ClassifierConfig::default());
//! println!("{} ({:.0}%)", result.category, result.confidence * 100.0);
//! ```

pub mod types;
pub mod context;
pub mod rules;
pub mod classifier;
pub mod vendor;

pub use types::{Category, Classification, Distribution, OFFICIAL_CAVEAT};

pub use context::NetworkContext;

pub use rules::{vendor_category, ClassifierConfig, VendorCategory};

pub use classifier::{classify, classify_with_config, distribution};

pub use vendor::{StaticOuiTable, VendorLookup};
