//! Console Reporter
//!
//! One log line per network plus the category distribution.

use crate::logic::classify::{distribution, Category};
use crate::logic::session::{ClassifiedNetwork, ReportError, ReportSink, ScanOutcome};
use crate::logic::signal::SignalQuality;

#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    /// `Found: <ssid> (<bssid>) | Ch: .. | Enc: .. | Sig: .. | Type: .. ★★★☆☆`
    pub fn format_line(network: &ClassifiedNetwork) -> String {
        let record = &network.record;
        let hidden = if record.hidden { " [HIDDEN]" } else { "" };
        let channel = record
            .channel
            .map(|c| c.to_string())
            .unwrap_or_else(|| "?".to_string());
        let signal = match &network.signal {
            Some(s) => format!("{:.0} dBm {}", s.mean, s.quality.bars()),
            None => format!("n/a {}", SignalQuality::VeryPoor.bars()),
        };

        format!(
            "Found: {}{} ({}) | Ch: {} | Enc: {} | Sig: {} | Type: {} {}",
            record.display_ssid(),
            hidden,
            record.bssid,
            channel,
            record.security,
            signal,
            network.classification.category.label(),
            network.classification.stars()
        )
    }

    pub fn print(&self, outcome: &ScanOutcome) {
        for network in &outcome.networks {
            log::info!("{}", Self::format_line(network));
            if let Some(caveat) = &network.classification.caveat {
                log::info!("    note: {}", caveat);
            }
        }

        let counts = distribution(outcome.classifications());
        log::info!(
            "Scan summary: {} networks ({} hidden, {} revealed) in {}s",
            outcome.networks.len(),
            outcome.stats.hidden,
            outcome.stats.reveals,
            outcome.duration_secs()
        );
        for (category, n) in &counts {
            log::info!("  {:<18} {:>4} {}", category.label(), n, percent(*n, outcome.networks.len()));
        }
        if counts.iter().any(|(c, _)| *c == Category::PossibleOfficial) {
            log::warn!("Possible official networks are heuristic matches only; verify independently");
        }
    }
}

impl ReportSink for ConsoleReporter {
    fn name(&self) -> &str {
        "console"
    }

    fn deliver(&mut self, outcome: &ScanOutcome) -> Result<(), ReportError> {
        self.print(outcome);
        Ok(())
    }
}

fn percent(n: usize, total: usize) -> String {
    if total == 0 {
        return String::new();
    }
    format!("({:.0}%)", n as f64 * 100.0 / total as f64)
}
