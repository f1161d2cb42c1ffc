//! Classification Types
//!
//! Categories and results. No rule logic here.

use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORY
// ============================================================================

/// Network category assigned by the rule cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    PossibleOfficial,
    Enterprise,
    MobileHotspot,
    Public,
    IoT,
    IspProvided,
    /// Fallback, never part of the tier order
    Standard,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::PossibleOfficial,
        Category::Enterprise,
        Category::MobileHotspot,
        Category::Public,
        Category::IoT,
        Category::IspProvided,
        Category::Standard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PossibleOfficial => "possible_official",
            Category::Enterprise => "enterprise",
            Category::MobileHotspot => "mobile_hotspot",
            Category::Public => "public",
            Category::IoT => "iot",
            Category::IspProvided => "isp_provided",
            Category::Standard => "standard",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Category::PossibleOfficial => "Possible Official",
            Category::Enterprise => "Enterprise",
            Category::MobileHotspot => "Mobile Hotspot",
            Category::Public => "Public",
            Category::IoT => "IoT Device",
            Category::IspProvided => "ISP Provided",
            Category::Standard => "Standard",
        }
    }

    /// Tier name as written in a tier-order list
    pub fn tier_name(&self) -> &'static str {
        match self {
            Category::PossibleOfficial => "official",
            Category::Enterprise => "enterprise",
            Category::MobileHotspot => "mobile",
            Category::Public => "public",
            Category::IoT => "iot",
            Category::IspProvided => "isp",
            Category::Standard => "standard",
        }
    }

    pub fn from_tier_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Category::ALL.into_iter().find(|c| c.tier_name() == name || c.as_str() == name)
    }

    /// Explanatory note attached to every classification
    pub fn note(&self) -> &'static str {
        match self {
            Category::PossibleOfficial => "Naming or equipment resembles government or official deployments",
            Category::Enterprise => "802.1X authentication typical of managed corporate networks",
            Category::MobileHotspot => "Likely a phone or portable hotspot",
            Category::Public => "Open or public-access network",
            Category::IoT => "Likely a smart-home or IoT device with weak security",
            Category::IspProvided => "Default naming of an ISP-supplied router",
            Category::Standard => "No distinguishing characteristics",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Caveat carried by every PossibleOfficial result
pub const OFFICIAL_CAVEAT: &str =
    "Heuristic classification only. Not a factual claim about the operator; verify independently.";

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    /// 0.0 - 1.0
    pub confidence: f32,
    pub reasons: Vec<String>,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caveat: Option<String>,
}

impl Classification {
    pub fn standard() -> Self {
        Self {
            category: Category::Standard,
            confidence: super::rules::STANDARD_CONFIDENCE,
            reasons: vec!["No rule matched".to_string()],
            note: Category::Standard.note().to_string(),
            caveat: None,
        }
    }

    /// One to five stars for console output
    pub fn stars(&self) -> String {
        let filled = (self.confidence * 5.0).round().clamp(1.0, 5.0) as usize;
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

/// Count of networks per category, in category order
pub type Distribution = Vec<(Category, usize)>;
