//! Classification Rules & Patterns
//!
//! Naming patterns, vendor lists and confidence constants.
//! No cascade logic here - only data and the tier-order config.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::Category;
use crate::constants;
use crate::logic::config::ConfigError;

// ============================================================================
// CONFIDENCE
// ============================================================================

/// Confidence of a tier with no supporting signals beyond its trigger
pub const BASE_CONFIDENCE: f32 = 0.3;

/// Share of confidence earned by matched signals
pub const SIGNAL_WEIGHT: f32 = 0.6;

/// Fixed confidence of the Standard fallback
pub const STANDARD_CONFIDENCE: f32 = 0.5;

/// Highest channel treated as "single digit" for portable devices
pub const MOBILE_MAX_CHANNEL: u8 = 9;

pub fn confidence(matched: usize, possible: usize) -> f32 {
    if possible == 0 {
        return BASE_CONFIDENCE;
    }
    let ratio = matched.min(possible) as f32 / possible as f32;
    BASE_CONFIDENCE + SIGNAL_WEIGHT * ratio
}

// ============================================================================
// SSID PATTERNS (case-insensitive, matched on upper-cased SSID)
// ============================================================================

/// Official naming conventions long enough for a plain substring match
pub const OFFICIAL_PATTERNS: &[&str] = &[
    "POLICE", "SECURE", "AGENCY", "OFFICIAL", "EMERGENCY", "EMERG", "SHERIFF", "FEDERAL",
];

/// Short official acronyms; matched as whole tokens
pub static OFFICIAL_ACRONYMS: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"(?:^|[^A-Z0-9])(FBI|GOV|FED|MIL|DOD|LEO|DHS|CIA|NSA)(?:[^A-Z0-9]|$)"));

pub const MOBILE_PATTERNS: &[&str] = &[
    "IPHONE", "ANDROID", "GALAXY", "MOBILE", "HOTSPOT", "MIFI", "PHONE", "POCKET", "PIXEL",
];

/// `<name>'s iPhone` style personal-device templates
pub static MOBILE_TEMPLATE: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(r"^[A-Z0-9 ._-]+['’`]S\s*(IPHONE|IPAD|PHONE|GALAXY|PIXEL|ANDROID|NOTE|REDMI|ONEPLUS|MOTO|S\d{1,2}|A\d{1,2})\b")
});

/// Distinctive IoT words matched anywhere
pub const IOT_PATTERNS: &[&str] = &[
    "CAMERA", "THERMOSTAT", "SENSOR", "DOORBELL", "SMARTPLUG", "SMARTLIFE",
];

/// Default IoT setup names: brand or device word, separator, suffix
/// (checked for a digit)
pub static IOT_TEMPLATE: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(r"^(RING|NEST|ROKU|WYZE|SONOS|ECOBEE|ARLO|BLINK|TUYA|SMART|CAM|BULB|TV|PLUG|DEVICE)[A-Z]*[-_ ]([A-Z0-9]{2,12})$")
});

/// ISP default names: provider + alphanumeric suffix (checked for a digit)
pub static ISP_TEMPLATE: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(r"^(XFINITY|COMCAST|SPECTRUMSETUP|SPECTRUM|MYCHARTER|VERIZON|FIOS|OPTIMUM|CENTURYLINK|FRONTIER|BTHUB|VIRGIN|NETGEAR|LINKSYS|TP-LINK|DLINK|D-LINK|BELKIN)[-_ ]?([A-Z0-9][A-Z0-9._-]{1,15})$")
});

/// Short provider names are ordinary word stems ("SKYLINE", "ATTIC"),
/// so their suffix must start with a digit
pub static ISP_SHORT_TEMPLATE: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(r"^(ATT|COX|SKY|ASUS)[-_ ]?([0-9][A-Z0-9._-]{1,15})$")
});

pub const PUBLIC_PATTERNS: &[&str] = &[
    "PUBLIC", "GUEST", "FREE", "AIRPORT", "HOTEL", "CAFE", "RESTAURANT", "LIBRARY", "STORE",
    "VISITOR", "HOTSPOT_", "STARBUCKS", "MARRIOTT", "HILTON",
];

pub const ENTERPRISE_NAMING: &[&str] = &[
    "CORP", "ENTERPRISE", "STAFF", "EMPLOYEE", "OFFICE", "BUSINESS", "COMPANY", "INC", "LLC", "LTD",
];

/// First pattern contained in `haystack`
pub fn contains_any(haystack: &str, patterns: &'static [&'static str]) -> Option<&'static str> {
    patterns.iter().find(|p| haystack.contains(**p)).copied()
}

/// Regex match; a pattern that failed to compile never matches
pub fn is_match(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    re.as_ref().map(|r| r.is_match(text)).unwrap_or(false)
}

/// Capture group `group` of the first match
pub fn capture<'t>(re: &Lazy<Option<Regex>>, text: &'t str, group: usize) -> Option<&'t str> {
    let caps = re.as_ref()?.captures(text)?;
    caps.get(group).map(|m| m.as_str())
}

/// Suffix captured by an IoT/ISP template, when the template matches
pub fn template_suffix<'t>(re: &Lazy<Option<Regex>>, text: &'t str) -> Option<&'t str> {
    capture(re, text, 2)
}

/// Suffix of an ISP default name, from either provider template
pub fn isp_suffix(text: &str) -> Option<&str> {
    template_suffix(&ISP_TEMPLATE, text).or_else(|| template_suffix(&ISP_SHORT_TEMPLATE, text))
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::error!("Invalid classification pattern {}: {}", pattern, e);
            None
        }
    }
}

// ============================================================================
// VENDOR CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorCategory {
    Government,
    Enterprise,
    Consumer,
    Mobile,
    Iot,
}

const VENDOR_CATEGORIES: &[(VendorCategory, &[&str])] = &[
    (
        VendorCategory::Government,
        &["HARRIS", "GENERAL DYNAMICS", "NORTHROP", "LOCKHEED", "RAYTHEON", "MOTOROLA SOLUTIONS"],
    ),
    (
        VendorCategory::Enterprise,
        &["CISCO", "ARUBA", "JUNIPER", "EXTREME", "FORTINET", "RUCKUS", "MERAKI"],
    ),
    (
        VendorCategory::Mobile,
        &["APPLE", "SAMSUNG", "GOOGLE", "HUAWEI", "XIAOMI", "MOTOROLA", "HTC", "ONEPLUS"],
    ),
    (
        VendorCategory::Iot,
        &["NEST", "RING", "ECOBEE", "WYZE", "SONOS", "ROKU", "AMAZON", "ESPRESSIF", "TUYA"],
    ),
    (
        VendorCategory::Consumer,
        &["NETGEAR", "LINKSYS", "TP-LINK", "D-LINK", "BELKIN", "ASUS"],
    ),
];

/// Category of a vendor name. Single-word patterns match whole words
/// so that e.g. "ENGINEERING" does not count as "RING".
pub fn vendor_category(vendor: &str) -> Option<VendorCategory> {
    let upper = vendor.to_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    VENDOR_CATEGORIES.iter().find_map(|(category, patterns)| {
        let hit = patterns.iter().any(|p| {
            if p.chars().all(|c| c.is_ascii_alphanumeric()) {
                words.contains(p)
            } else {
                upper.contains(p)
            }
        });
        hit.then_some(*category)
    })
}

// ============================================================================
// CONFIGURABLE TIER ORDER
// ============================================================================

/// Classifier settings. Standard is always the implicit last tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub tier_order: Vec<Category>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tier_order: vec![
                Category::PossibleOfficial,
                Category::MobileHotspot,
                Category::IoT,
                Category::IspProvided,
                Category::Enterprise,
                Category::Public,
            ],
        }
    }
}

impl ClassifierConfig {
    /// Parse a comma-separated tier list such as
    /// `official,mobile,iot,isp,enterprise,public`.
    ///
    /// Tiers left out are never evaluated.
    pub fn from_tier_list(list: &str) -> Result<Self, ConfigError> {
        let mut tier_order = Vec::new();

        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let category =
                Category::from_tier_name(name).ok_or_else(|| ConfigError::UnknownTier(name.to_string()))?;
            if category == Category::Standard {
                return Err(ConfigError::StandardInTierOrder);
            }
            if tier_order.contains(&category) {
                return Err(ConfigError::DuplicateTier(name.to_string()));
            }
            tier_order.push(category);
        }

        if tier_order.is_empty() {
            return Err(ConfigError::EmptyTierOrder);
        }
        Ok(Self { tier_order })
    }

    /// Enterprise ahead of PossibleOfficial, for deployments where 802.1X
    /// networks should never be flagged by naming alone
    pub fn enterprise_first() -> Self {
        let mut config = Self::default();
        config.tier_order.retain(|c| *c != Category::Enterprise);
        config.tier_order.insert(0, Category::Enterprise);
        config
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_tier_list(&constants::get_tier_order())
    }
}
