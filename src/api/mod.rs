//! API Module
//!
//! Outer surface: report sinks handed to the session controller.
//!
//! Structure:
//! - export.rs: JSON / JSONL / CSV reports in the output directory
//! - console.rs: per-network log lines and category distribution
//!
//! Usage:
//! - `api::ReportExporter::new(dir, ExportFormat::Json)` - file report
//! - `api::ConsoleReporter::new()` - console summary

pub mod export;
pub mod console;

pub use console::ConsoleReporter;
pub use export::{ExportFormat, NetworkRow, ReportExporter, DISCLAIMER};
