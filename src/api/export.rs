//! Scan Report Exporter
//!
//! Writes finished sessions to the output directory as a pretty JSON report,
//! JSONL (one network per line) or CSV. Registered with the session
//! controller as a `ReportSink`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants;
use crate::logic::classify::{distribution, OFFICIAL_CAVEAT};
use crate::logic::session::{ClassifiedNetwork, ReportError, ReportSink, ScanOutcome, SessionStats};

/// Shown at the top of every JSON report
pub const DISCLAIMER: &str = "Categories are heuristic hints derived from passively observed \
    beacons and names. They are not evidence of who operates a network.";

// ============================================================================
// EXPORT FORMATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty report with metadata, totals and distribution
    Json,
    /// One network per line
    Jsonl,
    /// Spreadsheet friendly, one network per row
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "jsonl" => Some(ExportFormat::Jsonl),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

// ============================================================================
// REPORT SHAPES
// ============================================================================

/// Flat per-network row shared by every format
#[derive(Debug, Clone, Serialize)]
pub struct NetworkRow {
    pub bssid: String,
    pub ssid: String,
    pub hidden: bool,
    pub channel: Option<u8>,
    pub security: String,
    pub vendor: Option<String>,
    pub randomized_bssid: bool,
    pub first_seen_us: u64,
    pub last_seen_us: u64,
    pub beacons: u64,
    pub probe_responses: u64,
    pub revealed_by: Option<String>,
    pub signal_mean: Option<f64>,
    pub signal_min: Option<i8>,
    pub signal_max: Option<i8>,
    pub signal_stddev: Option<f64>,
    pub signal_samples: usize,
    pub signal_quality: Option<String>,
    pub stability: Option<String>,
    pub trend: Option<String>,
    pub category: String,
    pub confidence: f32,
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caveat: Option<String>,
}

impl From<&ClassifiedNetwork> for NetworkRow {
    fn from(network: &ClassifiedNetwork) -> Self {
        let record = &network.record;
        let signal = network.signal.as_ref();
        Self {
            bssid: record.bssid.to_string(),
            ssid: record.display_ssid(),
            hidden: record.hidden,
            channel: record.channel,
            security: record.security.as_str().to_string(),
            vendor: record.vendor.clone(),
            randomized_bssid: record.randomized_bssid,
            first_seen_us: record.first_seen.as_micros(),
            last_seen_us: record.last_seen.as_micros(),
            beacons: record.beacon_count,
            probe_responses: record.probe_response_count,
            revealed_by: record.revealed_by.map(|e| format!("{:?}", e)),
            signal_mean: signal.map(|s| s.mean),
            signal_min: signal.map(|s| s.min),
            signal_max: signal.map(|s| s.max),
            signal_stddev: signal.map(|s| s.stddev),
            signal_samples: signal.map(|s| s.sample_count).unwrap_or(0),
            signal_quality: signal.map(|s| s.quality.as_str().to_string()),
            stability: signal.map(|s| s.stability.as_str().to_string()),
            trend: signal.map(|s| s.trend.as_str().to_string()),
            category: network.classification.category.as_str().to_string(),
            confidence: network.classification.confidence,
            reasons: network.classification.reasons.clone(),
            caveat: network.classification.caveat.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Totals<'a> {
    total_networks: usize,
    hidden_networks: usize,
    revealed_networks: u64,
    stale_networks: usize,
    frames: &'a SessionStats,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    disclaimer: &'static str,
    tool: &'static str,
    version: &'static str,
    session_id: String,
    host: String,
    interface: &'a str,
    scan_start: String,
    scan_end: String,
    duration_secs: i64,
    stop_reason: String,
    totals: Totals<'a>,
    distribution: Vec<(&'static str, usize)>,
    official_caveat: &'static str,
    networks: Vec<NetworkRow>,
    stale: Vec<String>,
}

// ============================================================================
// EXPORTER
// ============================================================================

#[derive(Debug)]
pub struct ReportExporter {
    dir: PathBuf,
    format: ExportFormat,
    last_written: Option<PathBuf>,
}

impl ReportExporter {
    pub fn new(dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            last_written: None,
        }
    }

    /// Path of the most recent report, if any was written
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }

    /// `scan_<unix start>_<session prefix>.<ext>`
    pub fn file_name(&self, outcome: &ScanOutcome) -> String {
        let id = outcome.session_id.simple().to_string();
        format!(
            "scan_{}_{}.{}",
            outcome.started_at.timestamp(),
            &id[..8],
            self.format.extension()
        )
    }

    /// Write `outcome` into the output directory, returning the file path
    pub fn export(&mut self, outcome: &ScanOutcome) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(self.file_name(outcome));
        let mut out = BufWriter::new(File::create(&path)?);

        match self.format {
            ExportFormat::Json => write_json(&mut out, outcome)?,
            ExportFormat::Jsonl => write_jsonl(&mut out, outcome)?,
            ExportFormat::Csv => write_csv(&mut out, outcome)?,
        }
        out.flush()?;

        log::info!(
            "Saved {} networks to {}",
            outcome.networks.len(),
            path.display()
        );
        self.last_written = Some(path.clone());
        Ok(path)
    }
}

impl ReportSink for ReportExporter {
    fn name(&self) -> &str {
        self.format.extension()
    }

    fn deliver(&mut self, outcome: &ScanOutcome) -> Result<(), ReportError> {
        self.export(outcome).map(|_| ())
    }
}

fn write_json(out: &mut impl Write, outcome: &ScanOutcome) -> Result<(), ReportError> {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());

    let report = JsonReport {
        disclaimer: DISCLAIMER,
        tool: constants::APP_NAME,
        version: constants::APP_VERSION,
        session_id: outcome.session_id.to_string(),
        host,
        interface: &outcome.interface,
        scan_start: outcome.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        scan_end: outcome.ended_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        duration_secs: outcome.duration_secs(),
        stop_reason: outcome.stop_reason.to_string(),
        totals: Totals {
            total_networks: outcome.networks.len(),
            hidden_networks: outcome.stats.hidden,
            revealed_networks: outcome.stats.reveals,
            stale_networks: outcome.stale.len(),
            frames: &outcome.stats,
        },
        distribution: distribution(outcome.classifications())
            .into_iter()
            .map(|(category, n)| (category.as_str(), n))
            .collect(),
        official_caveat: OFFICIAL_CAVEAT,
        networks: outcome.networks.iter().map(NetworkRow::from).collect(),
        stale: outcome.stale.iter().map(|b| b.to_string()).collect(),
    };

    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

fn write_jsonl(out: &mut impl Write, outcome: &ScanOutcome) -> Result<(), ReportError> {
    for network in &outcome.networks {
        writeln!(out, "{}", serde_json::to_string(&NetworkRow::from(network))?)?;
    }
    Ok(())
}

fn write_csv(out: &mut impl Write, outcome: &ScanOutcome) -> Result<(), ReportError> {
    writeln!(
        out,
        "bssid,ssid,hidden,channel,security,vendor,first_seen_us,last_seen_us,beacons,probe_responses,signal_mean,signal_samples,category,confidence"
    )?;

    for network in &outcome.networks {
        let row = NetworkRow::from(network);
        writeln!(
            out,
            "{},\"{}\",{},{},{},\"{}\",{},{},{},{},{},{},{},{:.2}",
            row.bssid,
            escape(&row.ssid),
            row.hidden,
            row.channel.map(|c| c.to_string()).unwrap_or_default(),
            row.security,
            escape(row.vendor.as_deref().unwrap_or("")),
            row.first_seen_us,
            row.last_seen_us,
            row.beacons,
            row.probe_responses,
            row.signal_mean.map(|m| format!("{:.1}", m)).unwrap_or_default(),
            row.signal_samples,
            row.category,
            row.confidence
        )?;
    }
    Ok(())
}

fn escape(field: &str) -> String {
    field.replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::logic::classify::{classify, Category};
    use crate::logic::frame::{CaptureTime, MacAddr, Security, Ssid};
    use crate::logic::registry::NetworkRecord;
    use crate::logic::session::StopReason;

    fn network(last: u8, ssid: Option<&str>, security: Security) -> ClassifiedNetwork {
        let mut record = NetworkRecord::new(MacAddr([0x00, 0x14, 0x6C, 0, 0, last]), CaptureTime::from_secs(1));
        record.ssid = ssid.map(Ssid::from);
        record.hidden = ssid.is_none();
        record.security = security;
        record.channel = Some(6);
        let classification = classify(&record, None);
        record.classification = Some(classification.clone());
        ClassifiedNetwork {
            record,
            classification,
            signal: None,
        }
    }

    fn outcome() -> ScanOutcome {
        let started_at = Utc::now();
        ScanOutcome {
            session_id: Uuid::new_v4(),
            interface: "mon0".to_string(),
            started_at,
            ended_at: started_at + Duration::seconds(30),
            stop_reason: StopReason::DurationElapsed,
            networks: vec![
                network(1, Some("Airport_Free_WiFi"), Security::Open),
                network(2, None, Security::Wpa2Personal),
                network(3, Some("Say \"hi\""), Security::Wpa2Personal),
            ],
            stats: SessionStats {
                hidden: 1,
                networks: 3,
                ..SessionStats::default()
            },
            stale: vec![MacAddr([0x00, 0x14, 0x6C, 0, 0, 2])],
        }
    }

    #[test]
    fn test_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = ReportExporter::new(dir.path(), ExportFormat::Json);
        let outcome = outcome();

        let path = exporter.export(&outcome).unwrap();
        assert_eq!(exporter.last_written(), Some(path.as_path()));
        assert!(path.to_string_lossy().ends_with(".json"));

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["disclaimer"], DISCLAIMER);
        assert_eq!(value["interface"], "mon0");
        assert_eq!(value["duration_secs"], 30);
        assert_eq!(value["totals"]["total_networks"], 3);
        assert_eq!(value["totals"]["hidden_networks"], 1);
        assert_eq!(value["networks"][0]["category"], Category::Public.as_str());
        assert_eq!(value["networks"][1]["ssid"], "[Hidden Network]");
        assert_eq!(value["stale"][0], "00:14:6C:00:00:02");
        assert!(value["distribution"].as_array().unwrap().len() >= 2);
    }

    #[test]
    fn test_jsonl_one_line_per_network() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = ReportExporter::new(dir.path(), ExportFormat::Jsonl);
        let path = exporter.export(&outcome()).unwrap();

        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let row: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(row["bssid"].is_string());
        }
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = ReportExporter::new(dir.path().join("nested"), ExportFormat::Csv);
        let path = exporter.export(&outcome()).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("bssid,ssid,hidden"));
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("\"Say \"\"hi\"\"\""));
    }

    #[test]
    fn test_sink_reports_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let mut exporter = ReportExporter::new(blocker.join("sub"), ExportFormat::Json);
        assert!(matches!(exporter.deliver(&outcome()), Err(ReportError::Io(_))));
        assert!(exporter.last_written().is_none());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("xml"), None);
    }
}
