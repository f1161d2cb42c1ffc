//! WifiObserver - Main Entry Point
//!
//! `wifi-observer [SOURCE] [DURATION_SECS]`
//!
//! SOURCE is a pcap file to replay or a monitor-mode interface name
//! (needs the `live-capture` feature). Falls back to WIFI_OBSERVER_SOURCE.

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use wifi_observer::api::{ConsoleReporter, ExportFormat, ReportExporter};
use wifi_observer::constants;
use wifi_observer::logic::config::ScanConfig;
use wifi_observer::logic::session::{CaptureSource, PcapFileSource, ScanOutcome, SessionController};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{} (receive-only)", constants::APP_NAME, constants::APP_VERSION);

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = ScanConfig::from_env()?;

    let mut args = std::env::args().skip(1);
    let source_name = args
        .next()
        .or_else(constants::get_source)
        .ok_or("no capture source: pass a pcap file or interface, or set WIFI_OBSERVER_SOURCE")?;
    let duration = match args.next() {
        Some(secs) => Some(Duration::from_secs(secs.parse()?)),
        None => None,
    };

    let source = open_source(&source_name)?;

    let controller = SessionController::new(config.clone());
    controller.add_sink(Box::new(ConsoleReporter::new()));
    controller.add_sink(Box::new(ReportExporter::new(&config.output_dir, ExportFormat::Json)));
    controller.start(source, duration)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(supervise(controller.clone()));
    runtime.shutdown_timeout(Duration::from_secs(1));

    let outcome = result?;
    log::info!(
        "Session {} finished: {} ({} networks)",
        outcome.session_id,
        outcome.stop_reason,
        outcome.networks.len()
    );

    match controller.take_capture_error() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Wait for the session to end on its own, or stop it on Ctrl-C
async fn supervise(controller: SessionController) -> Result<ScanOutcome, Box<dyn Error>> {
    let waiter = controller.clone();
    let finished = tokio::task::spawn_blocking(move || waiter.wait());

    tokio::select! {
        joined = finished => Ok(joined??),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            log::info!("Ctrl-C received, stopping scan");
            let stopper = controller.clone();
            Ok(tokio::task::spawn_blocking(move || stopper.stop()).await??)
        }
    }
}

fn open_source(name: &str) -> Result<Box<dyn CaptureSource>, Box<dyn Error>> {
    if Path::new(name).is_file() {
        return Ok(Box::new(PcapFileSource::open(name)?));
    }
    open_live(name)
}

#[cfg(feature = "live-capture")]
fn open_live(interface: &str) -> Result<Box<dyn CaptureSource>, Box<dyn Error>> {
    use wifi_observer::logic::session::LiveSource;
    Ok(Box::new(LiveSource::open(interface)?))
}

#[cfg(not(feature = "live-capture"))]
fn open_live(interface: &str) -> Result<Box<dyn CaptureSource>, Box<dyn Error>> {
    Err(format!(
        "'{}' is not a capture file; live capture needs the `live-capture` feature",
        interface
    )
    .into())
}
