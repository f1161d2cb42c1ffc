//! Vendor Lookup
//!
//! OUI prefix -> vendor name. Static data, injected into the registry.
//! A Wireshark `manuf`-style file can replace the small built-in table.

use std::collections::HashMap;
use std::path::Path;

use crate::logic::frame::MacAddr;

/// Read-only OUI lookup
pub trait VendorLookup: Send + Sync {
    fn lookup(&self, oui: [u8; 3]) -> Option<String>;

    fn lookup_mac(&self, mac: &MacAddr) -> Option<String> {
        self.lookup(mac.oui())
    }
}

/// In-memory OUI table
#[derive(Debug, Clone, Default)]
pub struct StaticOuiTable {
    entries: HashMap<[u8; 3], String>,
}

/// A handful of well-known prefixes, enough for useful output without a
/// manuf file
const BUILTIN: &[([u8; 3], &str)] = &[
    ([0x00, 0x17, 0xF2], "Apple"),
    ([0x00, 0x16, 0x32], "Samsung Electronics"),
    ([0xF4, 0xF5, 0xD8], "Google"),
    ([0x00, 0x40, 0x96], "Cisco Systems"),
    ([0x00, 0x0B, 0x86], "Aruba Networks"),
    ([0x00, 0x14, 0x6C], "Netgear"),
    ([0x50, 0xC7, 0xBF], "TP-Link"),
    ([0x18, 0xB4, 0x30], "Nest Labs"),
];

impl StaticOuiTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (oui, name) in BUILTIN {
            table.insert(*oui, name);
        }
        table
    }

    pub fn insert(&mut self, oui: [u8; 3], name: &str) {
        self.entries.insert(oui, name.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse `manuf` text: `00:17:F2<TAB>Apple<TAB>Apple, Inc.`
    ///
    /// The long name is preferred when present. Comment lines and
    /// prefixes narrower than 24 bits (`/28`, `/36`) are skipped.
    pub fn from_manuf(text: &str) -> Self {
        let mut table = Self::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t').map(str::trim).filter(|f| !f.is_empty());
            let Some(prefix) = fields.next() else { continue };
            let Some(short) = fields.next() else { continue };
            let name = fields.next().unwrap_or(short);

            if prefix.contains('/') {
                continue;
            }
            if let Some(oui) = parse_oui(prefix) {
                table.insert(oui, name);
            }
        }

        table
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let table = Self::from_manuf(&text);
        log::info!("Loaded {} OUI entries from {}", table.len(), path.display());
        Ok(table)
    }
}

impl VendorLookup for StaticOuiTable {
    fn lookup(&self, oui: [u8; 3]) -> Option<String> {
        self.entries.get(&oui).cloned()
    }
}

fn parse_oui(prefix: &str) -> Option<[u8; 3]> {
    let hex: String = prefix.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 6 || prefix.len() > 8 {
        return None;
    }
    let mut oui = [0u8; 3];
    for (i, byte) in oui.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(oui)
}
