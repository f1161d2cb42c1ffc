//! Network Classifier
//!
//! Ordered rule cascade over a record snapshot. First matching tier wins;
//! tier order comes from `ClassifierConfig`, Standard is the fallback.
//! Pure: same record + summary + config always gives the same result.

use super::context::NetworkContext;
use super::rules::{
    self, contains_any, is_match, template_suffix, ClassifierConfig, VendorCategory,
    ENTERPRISE_NAMING, IOT_PATTERNS, IOT_TEMPLATE, MOBILE_MAX_CHANNEL,
    MOBILE_PATTERNS, MOBILE_TEMPLATE, OFFICIAL_ACRONYMS, OFFICIAL_PATTERNS, PUBLIC_PATTERNS,
};
use super::types::{Category, Classification, Distribution, OFFICIAL_CAVEAT};
use crate::logic::frame::Security;
use crate::logic::registry::NetworkRecord;
use crate::logic::signal::SignalSummary;

// ============================================================================
// MAIN CLASSIFICATION FUNCTION
// ============================================================================

/// Classify with the default tier order
pub fn classify(record: &NetworkRecord, summary: Option<&SignalSummary>) -> Classification {
    classify_with_config(record, summary, &ClassifierConfig::default())
}

pub fn classify_with_config(
    record: &NetworkRecord,
    summary: Option<&SignalSummary>,
    config: &ClassifierConfig,
) -> Classification {
    let ctx = NetworkContext::new(record, summary);

    for tier in &config.tier_order {
        if let Some(hit) = evaluate(*tier, &ctx) {
            return hit.into_classification(*tier);
        }
    }

    Classification::standard()
}

/// Per-category counts, in category order, zero counts omitted
pub fn distribution<'a>(results: impl IntoIterator<Item = &'a Classification>) -> Distribution {
    let mut counts = [0usize; Category::ALL.len()];
    for result in results {
        if let Some(idx) = Category::ALL.iter().position(|c| *c == result.category) {
            counts[idx] += 1;
        }
    }

    Category::ALL
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|(c, n)| (*c, n))
        .collect()
}

// ============================================================================
// TIER EVALUATION
// ============================================================================

/// Signals behind a tier match
struct TierHit {
    matched: usize,
    possible: usize,
    reasons: Vec<String>,
}

impl TierHit {
    fn new(possible: usize) -> Self {
        Self {
            matched: 0,
            possible,
            reasons: Vec::new(),
        }
    }

    fn signal(&mut self, present: bool, reason: impl FnOnce() -> String) {
        if present {
            self.matched += 1;
            self.reasons.push(reason());
        }
    }

    fn into_classification(mut self, category: Category) -> Classification {
        let confidence = rules::confidence(self.matched, self.possible);
        self.reasons
            .push(format!("{} of {} signals matched", self.matched, self.possible));

        Classification {
            category,
            confidence,
            reasons: self.reasons,
            note: category.note().to_string(),
            caveat: (category == Category::PossibleOfficial).then(|| OFFICIAL_CAVEAT.to_string()),
        }
    }
}

fn evaluate(tier: Category, ctx: &NetworkContext) -> Option<TierHit> {
    match tier {
        Category::PossibleOfficial => official(ctx),
        Category::MobileHotspot => mobile(ctx),
        Category::IoT => iot(ctx),
        Category::IspProvided => isp(ctx),
        Category::Enterprise => enterprise(ctx),
        Category::Public => public(ctx),
        Category::Standard => None,
    }
}

fn official(ctx: &NetworkContext) -> Option<TierHit> {
    let ssid = ctx.ssid_str();
    let pattern = contains_any(ssid, OFFICIAL_PATTERNS)
        .or_else(|| rules::capture(&OFFICIAL_ACRONYMS, ssid, 1));
    let gov_vendor = ctx.vendor_is(VendorCategory::Government);
    if pattern.is_none() && !gov_vendor {
        return None;
    }

    let mut hit = TierHit::new(3);
    if let Some(p) = pattern {
        hit.signal(true, || format!("SSID matches official pattern '{}'", p));
    }
    hit.signal(gov_vendor, || "Vendor on official-equipment list".to_string());
    hit.signal(ctx.security.is_enterprise() || ctx.security.is_wpa3(), || {
        format!("Hardened security posture ({})", ctx.security)
    });
    Some(hit)
}

fn mobile(ctx: &NetworkContext) -> Option<TierHit> {
    let ssid = ctx.ssid_str();
    let marker = contains_any(ssid, MOBILE_PATTERNS);
    let template = is_match(&MOBILE_TEMPLATE, ssid);
    let naming = marker.is_some() || template;

    let mobile_vendor = ctx.vendor_is(VendorCategory::Mobile);
    let wpa2_personal = ctx.security == Security::Wpa2Personal;
    let low_channel = ctx.channel.map(|c| (1..=MOBILE_MAX_CHANNEL).contains(&c)).unwrap_or(false);
    let device_profile = mobile_vendor && wpa2_personal && low_channel;

    if !naming && !device_profile {
        return None;
    }

    let mut hit = TierHit::new(6);
    hit.signal(naming, || match marker {
        Some(p) => format!("SSID contains personal-device marker '{}'", p),
        None => "SSID matches personal-device template".to_string(),
    });
    hit.signal(mobile_vendor, || "Mobile chipset vendor".to_string());
    hit.signal(wpa2_personal, || "WPA2-Personal security".to_string());
    hit.signal(low_channel, || {
        format!("Single-digit channel {}", ctx.channel.unwrap_or_default())
    });
    hit.signal(ctx.randomized_bssid, || "Randomized (locally administered) BSSID".to_string());
    hit.signal(ctx.signal_is_transient(), || "Weak or fluctuating signal".to_string());
    Some(hit)
}

fn iot(ctx: &NetworkContext) -> Option<TierHit> {
    let ssid = ctx.ssid_str();
    let iot_vendor = ctx.vendor_is(VendorCategory::Iot);
    let naming = contains_any(ssid, IOT_PATTERNS).is_some()
        || template_suffix(&IOT_TEMPLATE, ssid)
            .map(has_digit)
            .unwrap_or(false);
    let weak = ctx.security.is_weak();

    if !(iot_vendor || naming) || !weak {
        return None;
    }

    let mut hit = TierHit::new(3);
    hit.signal(iot_vendor, || "IoT chipset vendor".to_string());
    hit.signal(naming, || "SSID matches default IoT naming".to_string());
    hit.signal(weak, || format!("Weak security ({})", ctx.security));
    Some(hit)
}

fn isp(ctx: &NetworkContext) -> Option<TierHit> {
    let suffix = rules::isp_suffix(ctx.ssid_str()).filter(|s| has_digit(s))?;

    let hex_suffix = suffix.chars().all(|c| c.is_ascii_hexdigit());
    let mut hit = TierHit::new(3);
    hit.signal(true, || format!("SSID matches ISP default template (suffix '{}')", suffix));
    hit.signal(hex_suffix, || "Hexadecimal suffix".to_string());
    hit.signal(ctx.vendor_is(VendorCategory::Consumer), || {
        "Consumer router vendor".to_string()
    });
    Some(hit)
}

fn enterprise(ctx: &NetworkContext) -> Option<TierHit> {
    if !ctx.security.is_enterprise() {
        return None;
    }

    let naming = contains_any(ctx.ssid_str(), ENTERPRISE_NAMING);
    let mut hit = TierHit::new(4);
    hit.signal(true, || format!("802.1X authentication ({})", ctx.security));
    hit.signal(naming.is_some(), || {
        format!("Corporate naming '{}'", naming.unwrap_or_default())
    });
    hit.signal(ctx.vendor_is(VendorCategory::Enterprise), || {
        "Enterprise equipment vendor".to_string()
    });
    hit.signal(ctx.signal_is_steady(), || "Steady signal (fixed installation)".to_string());
    Some(hit)
}

fn public(ctx: &NetworkContext) -> Option<TierHit> {
    let open = ctx.security == Security::Open;
    let naming = contains_any(ctx.ssid_str(), PUBLIC_PATTERNS);
    if !open && naming.is_none() {
        return None;
    }

    let mut hit = TierHit::new(2);
    hit.signal(open, || "Open network (no encryption)".to_string());
    hit.signal(naming.is_some(), || {
        format!("Public-access naming '{}'", naming.unwrap_or_default())
    });
    Some(hit)
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

// ============================================================================
// TESTS
// ============================================================================
