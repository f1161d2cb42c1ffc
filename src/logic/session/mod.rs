//! Session Controller
//!
//! Drives one scan: `Idle -> Running -> Stopped`.
//!
//! ## Structure
//! - `source.rs` - CaptureSource trait + pcap file / memory / live sources
//! - `queue.rs` - bounded frame queue between capture and processing
//! - `types.rs` - SessionState, SessionStats, ScanOutcome, errors, sinks
//!
//! ## Threads
//! - capture thread: pulls the source, pushes into the queue (never touches
//!   the registry)
//! - processing thread: the single writer; decodes and applies frames one at
//!   a time, classifies periodically, finalizes exactly once
//!
//! ## Usage
//! ```ignore
//! let controller = SessionController::new(ScanConfig::from_env()?);
//! controller.add_sink(Box::new(exporter));
//! controller.start(Box::new(PcapFileSource::open("scan.pcap")?), None)?;
//! let outcome = controller.wait()?;
//! ```

pub mod source;
pub mod queue;
pub mod types;
#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use crate::logic::classify::{classify_with_config, ClassifierConfig, StaticOuiTable, VendorLookup};
use crate::logic::config::ScanConfig;
use crate::logic::frame::{decode, CaptureTime, Frame, FrameKind, RawFrame};
use crate::logic::registry::{NetworkRecord, NetworkRegistry};
use crate::logic::resolver::HiddenSsidResolver;
use crate::logic::signal::{SignalAnalyzer, SignalSummary};

pub use queue::{FrameQueue, Pop, Push};
pub use source::{CaptureError, CaptureEvent, CaptureSource, MemorySource, PcapFileSource};
#[cfg(feature = "live-capture")]
pub use source::LiveSource;
pub use types::{
    ClassifiedNetwork, ReportError, ReportSink, ScanOutcome, SessionError, SessionState,
    SessionStats, StopReason,
};

/// How long the processing loop waits on an empty queue before checking
/// timers again
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// SCAN CORE (single writer)
// ============================================================================

/// Registry, resolver and analyzer plus the counters they feed.
/// Every mutation goes through `process`.
#[derive(Debug)]
pub struct ScanCore {
    registry: NetworkRegistry,
    resolver: HiddenSsidResolver,
    analyzer: SignalAnalyzer,
    classifier: ClassifierConfig,
    stats: SessionStats,
    /// Latest capture timestamp seen, the session's notion of "now"
    latest: CaptureTime,
}

impl ScanCore {
    pub fn new(config: &ScanConfig, vendors: Arc<dyn VendorLookup>) -> Self {
        Self {
            registry: NetworkRegistry::new(vendors),
            resolver: HiddenSsidResolver::new(config.probe_retention),
            analyzer: SignalAnalyzer::new(config.signal_window),
            classifier: config.classifier.clone(),
            stats: SessionStats::default(),
            latest: CaptureTime(0),
        }
    }

    /// Decode one captured packet and route it. Decode failures are
    /// counted and dropped.
    pub fn process(&mut self, raw: &RawFrame) {
        match decode(raw) {
            Ok(frame) => {
                self.stats.frames_decoded += 1;
                self.apply(&frame);
            }
            Err(e) => {
                log::debug!("Dropped frame at {}us: {}", raw.timestamp.as_micros(), e);
                self.stats.record_malformed(&e);
            }
        }
    }

    /// Route a decoded frame to the resolver, registry and analyzer
    pub fn apply(&mut self, frame: &Frame) {
        self.stats.record_kind(frame.kind);
        self.latest = self.latest.max(frame.timestamp);

        if frame.kind == FrameKind::ProbeRequest {
            self.resolver.note_probe(frame);
            return;
        }

        match self.registry.observe(frame, &mut self.resolver) {
            Ok(obs) => {
                if obs.revealed.is_some() {
                    self.stats.reveals += 1;
                }
                if obs.anomaly.is_some() {
                    self.stats.bssid_anomalies += 1;
                }
                if let Some(dbm) = frame.signal_dbm {
                    self.analyzer.sample(obs.bssid, dbm, frame.timestamp);
                }
            }
            Err(e) => {
                log::debug!("Registry refused frame: {}", e);
                *self.stats.malformed_by_kind.entry("rejected".to_string()).or_insert(0) += 1;
                self.stats.frames_malformed += 1;
            }
        }
    }

    /// Classify every record and store the results on the registry
    pub fn classify_all(&mut self) -> Vec<ClassifiedNetwork> {
        let networks = self.classified_view();
        for network in &networks {
            self.registry
                .set_classification(&network.record.bssid, network.classification.clone());
        }
        networks
    }

    /// Classified copy of the registry; mutates nothing
    pub fn classified_view(&self) -> Vec<ClassifiedNetwork> {
        classify_snapshot(self.snapshot_parts(), &self.classifier)
    }

    fn snapshot_parts(&self) -> Vec<(NetworkRecord, Option<SignalSummary>)> {
        self.registry
            .snapshot()
            .into_iter()
            .map(|record| {
                let summary = self.analyzer.summary(&record.bssid);
                (record, summary)
            })
            .collect()
    }

    /// Counters with registry/resolver totals filled in
    pub fn stats(&self) -> SessionStats {
        let mut stats = self.stats.clone();
        stats.networks = self.registry.len();
        stats.hidden = self.registry.hidden_count();
        stats.correlated_reveals = self.resolver.stats().correlated_reveals;
        stats
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn analyzer(&self) -> &SignalAnalyzer {
        &self.analyzer
    }

    pub fn resolver(&self) -> &HiddenSsidResolver {
        &self.resolver
    }

    pub fn latest(&self) -> CaptureTime {
        self.latest
    }
}

fn classify_snapshot(
    parts: Vec<(NetworkRecord, Option<SignalSummary>)>,
    config: &ClassifierConfig,
) -> Vec<ClassifiedNetwork> {
    parts
        .into_iter()
        .map(|(mut record, signal)| {
            let classification = classify_with_config(&record, signal.as_ref(), config);
            record.classification = Some(classification.clone());
            ClassifiedNetwork {
                record,
                classification,
                signal,
            }
        })
        .collect()
}

// ============================================================================
// CONTROLLER
// ============================================================================

#[derive(Debug)]
struct Control {
    state: SessionState,
    interface: String,
    started_at: Option<chrono::DateTime<Utc>>,
    stop_reason: Option<StopReason>,
    capture_error: Option<CaptureError>,
    outcome: Option<ScanOutcome>,
    /// Set when `stop()` gave up waiting; finalize then leaves the
    /// registry untouched
    fenced: bool,
}

struct Inner {
    config: ScanConfig,
    session_id: Uuid,
    core: Mutex<ScanCore>,
    queue: FrameQueue,
    control: Mutex<Control>,
    stopped: Condvar,
    stop_requested: AtomicBool,
    frames_captured: AtomicU64,
    discarded: AtomicU64,
    sinks: Mutex<Vec<Box<dyn ReportSink>>>,
}

/// Owns one scan session. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session_id", &self.inner.session_id)
            .field("state", &self.state())
            .finish()
    }
}

impl SessionController {
    /// Controller using the OUI table from `config`, or the built-in one
    pub fn new(config: ScanConfig) -> Self {
        let vendors: Arc<dyn VendorLookup> = match &config.oui_file {
            Some(path) => match StaticOuiTable::load(path) {
                Ok(table) => Arc::new(table),
                Err(e) => {
                    log::warn!("Failed to load OUI table {}: {}, using built-in", path.display(), e);
                    Arc::new(StaticOuiTable::builtin())
                }
            },
            None => Arc::new(StaticOuiTable::builtin()),
        };
        Self::with_vendors(config, vendors)
    }

    pub fn with_vendors(config: ScanConfig, vendors: Arc<dyn VendorLookup>) -> Self {
        let core = ScanCore::new(&config, vendors);
        let queue = FrameQueue::new(config.queue_capacity);
        Self {
            inner: Arc::new(Inner {
                session_id: Uuid::new_v4(),
                core: Mutex::new(core),
                queue,
                control: Mutex::new(Control {
                    state: SessionState::Idle,
                    interface: String::new(),
                    started_at: None,
                    stop_reason: None,
                    capture_error: None,
                    outcome: None,
                    fenced: false,
                }),
                stopped: Condvar::new(),
                stop_requested: AtomicBool::new(false),
                frames_captured: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
                sinks: Mutex::new(Vec::new()),
                config,
            }),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn state(&self) -> SessionState {
        self.inner.control.lock().state
    }

    /// Register a consumer for the final outcome
    pub fn add_sink(&self, sink: Box<dyn ReportSink>) {
        self.inner.sinks.lock().push(sink);
    }

    /// Begin pulling from `source`. `duration` of `None` runs until the
    /// stream ends or `stop()` is called.
    pub fn start(
        &self,
        source: Box<dyn CaptureSource>,
        duration: Option<Duration>,
    ) -> Result<(), SessionError> {
        {
            let mut control = self.inner.control.lock();
            if control.state != SessionState::Idle {
                return Err(SessionError::InvalidState {
                    state: control.state,
                    action: "start",
                });
            }
            control.state = SessionState::Running;
            control.interface = source.interface().to_string();
            control.started_at = Some(Utc::now());
        }

        log::info!(
            "Session {} started on {} ({})",
            self.inner.session_id,
            source.interface(),
            match duration {
                Some(d) => format!("{}s", d.as_secs()),
                None => "unbounded".to_string(),
            }
        );

        let deadline = duration.map(|d| Instant::now() + d);

        let capture = Arc::clone(&self.inner);
        thread::spawn(move || capture_loop(capture, source));

        let processing = Arc::clone(&self.inner);
        thread::spawn(move || processing_loop(processing, deadline));

        Ok(())
    }

    /// Stop the session: the in-flight frame finishes, queued frames are
    /// discarded, the final snapshot is classified and delivered. Waits at
    /// most the configured drain timeout; on timeout the terminal
    /// classification no longer writes to the registry.
    pub fn stop(&self) -> Result<ScanOutcome, SessionError> {
        {
            let control = self.inner.control.lock();
            match control.state {
                SessionState::Idle => {
                    return Err(SessionError::InvalidState {
                        state: SessionState::Idle,
                        action: "stop",
                    })
                }
                SessionState::Stopped => {
                    if let Some(outcome) = &control.outcome {
                        return Ok(outcome.clone());
                    }
                }
                SessionState::Running => {}
            }
        }

        self.inner.request_stop(StopReason::Requested);

        let mut control = self.inner.control.lock();
        let deadline = Instant::now() + self.inner.config.drain_timeout;
        while control.state != SessionState::Stopped {
            if self.inner.stopped.wait_until(&mut control, deadline).timed_out() {
                break;
            }
        }
        if control.outcome.is_none() {
            control.fenced = true;
            log::warn!(
                "Session {} did not drain within {:?}",
                self.inner.session_id,
                self.inner.config.drain_timeout
            );
        }
        control.outcome.clone().ok_or(SessionError::DrainTimeout)
    }

    /// Block until the session has stopped on its own (end of stream,
    /// duration, capture error) or via `stop()`.
    pub fn wait(&self) -> Result<ScanOutcome, SessionError> {
        let mut control = self.inner.control.lock();
        if control.state == SessionState::Idle {
            return Err(SessionError::InvalidState {
                state: SessionState::Idle,
                action: "wait",
            });
        }
        while control.outcome.is_none() {
            self.inner.stopped.wait(&mut control);
        }
        control.outcome.clone().ok_or(SessionError::DrainTimeout)
    }

    /// Capture error that ended the session, if any. Taken once.
    pub fn take_capture_error(&self) -> Option<SessionError> {
        self.inner
            .control
            .lock()
            .capture_error
            .take()
            .map(SessionError::CaptureInterrupted)
    }

    /// Live classified view. Holds the core lock only while copying.
    pub fn snapshot(&self) -> Vec<ClassifiedNetwork> {
        let parts = self.inner.core.lock().snapshot_parts();
        classify_snapshot(parts, &self.inner.config.classifier)
    }

    /// Current counters
    pub fn stats(&self) -> SessionStats {
        let stats = self.inner.core.lock().stats();
        self.inner.merge_counters(stats)
    }
}

impl Inner {
    /// Record a stop reason (first wins) and close the queue
    fn request_stop(&self, reason: StopReason) {
        {
            let mut control = self.control.lock();
            if control.stop_reason.is_none() {
                control.stop_reason = Some(reason);
            }
        }
        self.stop_requested.store(true, Ordering::SeqCst);

        let discarded = self.queue.discard_all();
        if discarded > 0 {
            self.discarded.fetch_add(discarded as u64, Ordering::Relaxed);
            log::info!("Discarded {} queued frames on stop", discarded);
        }
    }

    fn merge_counters(&self, mut stats: SessionStats) -> SessionStats {
        stats.frames_captured = self.frames_captured.load(Ordering::Relaxed);
        stats.discarded_on_stop = self.discarded.load(Ordering::Relaxed);
        stats.queue_dropped = self.queue.dropped();
        stats
    }

    /// Terminal classification and delivery. Runs once, on the processing
    /// thread, after the queue is closed.
    fn finalize(&self) {
        let (networks, stats, stale) = {
            let mut core = self.core.lock();
            // control stays locked across the write so a timed-out stop()
            // cannot slip in between the check and the write
            let control = self.control.lock();
            let networks = if control.fenced {
                core.classified_view()
            } else {
                core.classify_all()
            };
            drop(control);
            let stale = core.registry().stale(core.latest(), self.config.stale_after);
            (networks, core.stats(), stale)
        };
        let stats = self.merge_counters(stats);

        let (interface, started_at, stop_reason) = {
            let control = self.control.lock();
            (
                control.interface.clone(),
                control.started_at.unwrap_or_else(Utc::now),
                control.stop_reason.clone().unwrap_or(StopReason::Requested),
            )
        };

        let outcome = ScanOutcome {
            session_id: self.session_id,
            interface,
            started_at,
            ended_at: Utc::now(),
            stop_reason,
            networks,
            stats,
            stale,
        };

        log::info!(
            "Session {} stopped ({}): {} networks, {} hidden, {} reveals, {} decoded, {} malformed, {} unsupported, {} dropped",
            outcome.session_id,
            outcome.stop_reason,
            outcome.stats.networks,
            outcome.stats.hidden,
            outcome.stats.reveals,
            outcome.stats.frames_decoded,
            outcome.stats.frames_malformed,
            outcome.stats.frames_unsupported,
            outcome.stats.queue_dropped + outcome.stats.discarded_on_stop
        );

        for sink in self.sinks.lock().iter_mut() {
            if let Err(e) = sink.deliver(&outcome) {
                log::error!("Report sink '{}' failed: {}", sink.name(), e);
            }
        }

        let mut control = self.control.lock();
        control.outcome = Some(outcome);
        control.state = SessionState::Stopped;
        drop(control);
        self.stopped.notify_all();
    }
}

// ============================================================================
// THREADS
// ============================================================================

fn capture_loop(inner: Arc<Inner>, mut source: Box<dyn CaptureSource>) {
    let live = source.is_live();

    while !inner.stop_requested.load(Ordering::SeqCst) {
        match source.next_event() {
            Ok(CaptureEvent::Frame(raw)) => {
                inner.frames_captured.fetch_add(1, Ordering::Relaxed);
                let pushed = if live {
                    inner.queue.push_drop_oldest(raw)
                } else {
                    inner.queue.push_blocking(raw)
                };
                // stop closed the queue while this frame was in hand
                if pushed == Push::Closed {
                    inner.discarded.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
            Ok(CaptureEvent::Idle) => continue,
            Ok(CaptureEvent::EndOfStream) => {
                log::info!("Capture on {} reached end of stream", source.interface());
                {
                    let mut control = inner.control.lock();
                    if control.stop_reason.is_none() {
                        control.stop_reason = Some(StopReason::EndOfStream);
                    }
                }
                inner.queue.close();
                break;
            }
            Err(e) => {
                log::error!("Capture on {} interrupted: {}", source.interface(), e);
                let reason = StopReason::CaptureInterrupted(e.to_string());
                inner.control.lock().capture_error = Some(e);
                inner.request_stop(reason);
                break;
            }
        }
    }
}

fn processing_loop(inner: Arc<Inner>, deadline: Option<Instant>) {
    let interval = inner.config.classify_interval;
    let mut last_classified = Instant::now();

    loop {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline && !inner.stop_requested.load(Ordering::SeqCst) {
                log::info!("Scan duration elapsed");
                inner.request_stop(StopReason::DurationElapsed);
            }
        }

        match inner.queue.pop(POLL_INTERVAL) {
            Pop::Frame(raw) => inner.core.lock().process(&raw),
            Pop::Empty => {}
            Pop::Closed => break,
        }

        if !interval.is_zero() && last_classified.elapsed() >= interval {
            let classified = inner.core.lock().classify_all().len();
            log::debug!("Periodic classification of {} networks", classified);
            last_classified = Instant::now();
        }
    }

    inner.finalize();
}
