use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::*;
use crate::logic::classify::{Category, StaticOuiTable};
use crate::logic::fixtures::{FrameBuilder, AP_CORP, AP_HOME, CLIENT};
use crate::logic::classify::OFFICIAL_CAVEAT;
use crate::logic::frame::{MacAddr, Security, Ssid};
use crate::logic::resolver::RevealEvidence;

fn test_config() -> ScanConfig {
    ScanConfig {
        classify_interval: Duration::ZERO,
        drain_timeout: Duration::from_secs(5),
        ..ScanConfig::default()
    }
}

fn controller() -> SessionController {
    SessionController::with_vendors(test_config(), Arc::new(StaticOuiTable::new()))
}

fn wpa2(builder: FrameBuilder) -> FrameBuilder {
    builder.channel(6).privacy().rsn(2).signal(-55)
}

/// Hidden home AP revealed by a probe response; hidden corporate AP
/// revealed through a client's probe request.
fn discovery_frames() -> Vec<RawFrame> {
    vec![
        wpa2(FrameBuilder::beacon(AP_HOME).ssid("")).at(1).build(),
        wpa2(FrameBuilder::probe_response(AP_HOME).ssid("HomeNet")).at(2).build(),
        wpa2(FrameBuilder::beacon(AP_CORP).ssid("")).at(3).build(),
        FrameBuilder::probe_request(CLIENT).ssid("CorpWifi").at(4).build(),
        wpa2(FrameBuilder::probe_response(AP_CORP).ssid("CorpWifi")).at(5).build(),
    ]
}

/// Never ends on its own; yields Idle like a quiet interface
struct QuietSource;

impl CaptureSource for QuietSource {
    fn interface(&self) -> &str {
        "mon0"
    }

    fn is_live(&self) -> bool {
        true
    }

    fn next_event(&mut self) -> Result<CaptureEvent, CaptureError> {
        thread::sleep(Duration::from_millis(5));
        Ok(CaptureEvent::Idle)
    }
}

/// Replays its frames, then stays open like an idle interface
struct TrickleSource {
    frames: VecDeque<RawFrame>,
}

impl TrickleSource {
    fn new(frames: Vec<RawFrame>) -> Self {
        Self { frames: frames.into() }
    }
}

impl CaptureSource for TrickleSource {
    fn interface(&self) -> &str {
        "mon0"
    }

    fn is_live(&self) -> bool {
        false
    }

    fn next_event(&mut self) -> Result<CaptureEvent, CaptureError> {
        match self.frames.pop_front() {
            Some(frame) => Ok(CaptureEvent::Frame(frame)),
            None => {
                thread::sleep(Duration::from_millis(5));
                Ok(CaptureEvent::Idle)
            }
        }
    }
}

fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(2));
    }
}

fn home_beacons(n: u64) -> Vec<RawFrame> {
    (0..n)
        .map(|i| FrameBuilder::beacon(AP_HOME).ssid("HomeNet").signal(-60).at(i).build())
        .collect()
}

/// Sink that remembers what it was given
struct RecordingSink {
    delivered: Arc<Mutex<Vec<ScanOutcome>>>,
}

impl ReportSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn deliver(&mut self, outcome: &ScanOutcome) -> Result<(), ReportError> {
        self.delivered.lock().push(outcome.clone());
        Ok(())
    }
}

struct FailingSink;

impl ReportSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn deliver(&mut self, _outcome: &ScanOutcome) -> Result<(), ReportError> {
        Err(ReportError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
    }
}

// ============================================================================
// SCAN CORE
// ============================================================================

#[test]
fn test_core_reveals_and_samples() {
    let mut core = ScanCore::new(&test_config(), Arc::new(StaticOuiTable::new()));
    for raw in discovery_frames() {
        core.process(&raw);
    }

    let home = core.registry().get(&AP_HOME).unwrap();
    assert!(!home.hidden);
    assert_eq!(home.ssid, Some(Ssid::from("HomeNet")));
    assert_eq!(home.channel, Some(6));
    assert_eq!(home.security, Security::Wpa2Personal);

    let corp = core.registry().get(&AP_CORP).unwrap();
    assert_eq!(corp.ssid, Some(Ssid::from("CorpWifi")));
    assert_eq!(corp.revealed_by, Some(RevealEvidence::CorrelatedProbe { client: CLIENT }));

    let summary = core.analyzer().summary(&AP_HOME).unwrap();
    assert_eq!(summary.sample_count, 2);
    assert_eq!(summary.latest, -55);

    let stats = core.stats();
    assert_eq!(stats.frames_decoded, 5);
    assert_eq!(stats.beacons, 2);
    assert_eq!(stats.probe_requests, 1);
    assert_eq!(stats.probe_responses, 2);
    assert_eq!(stats.networks, 2);
    assert_eq!(stats.hidden, 0);
    assert_eq!(stats.reveals, 2);
    assert_eq!(stats.correlated_reveals, 1);
}

#[test]
fn test_core_counts_decode_failures() {
    let mut core = ScanCore::new(&test_config(), Arc::new(StaticOuiTable::new()));

    // data frame
    core.process(&FrameBuilder::frame_control(0x08, AP_HOME).build());
    core.process(&FrameBuilder::beacon(AP_HOME).ssid("HomeNet").corrupt_fcs().build());
    let mut truncated = FrameBuilder::beacon(AP_HOME).ssid("HomeNet").build();
    truncated.data.truncate(20);
    core.process(&truncated);

    let stats = core.stats();
    assert_eq!(stats.frames_decoded, 0);
    assert_eq!(stats.frames_unsupported, 1);
    assert_eq!(stats.frames_malformed, 2);
    assert_eq!(stats.frames_rejected(), 3);
    assert_eq!(stats.malformed_by_kind.get("fcs_mismatch"), Some(&1));
    assert!(core.registry().is_empty());
}

#[test]
fn test_core_probe_request_never_creates_record() {
    let mut core = ScanCore::new(&test_config(), Arc::new(StaticOuiTable::new()));
    core.process(&FrameBuilder::probe_request(CLIENT).ssid("CorpWifi").signal(-40).at(1).build());

    assert!(core.registry().is_empty());
    assert_eq!(core.analyzer().tracked(), 0);
    assert_eq!(core.stats().probe_requests, 1);
}

#[test]
fn test_classify_all_writes_back() {
    let mut core = ScanCore::new(&test_config(), Arc::new(StaticOuiTable::new()));
    core.process(&FrameBuilder::beacon(AP_HOME).ssid("Airport_Free_WiFi").at(1).build());

    let networks = core.classify_all();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].classification.category, Category::Public);
    assert_eq!(
        networks[0].record.classification.as_ref().map(|c| c.category),
        Some(Category::Public)
    );
    assert_eq!(
        core.registry().get(&AP_HOME).unwrap().classification,
        Some(networks[0].classification.clone())
    );
}

// ============================================================================
// CONTROLLER
// ============================================================================

#[test]
fn test_offline_replay_runs_to_end_of_stream() {
    let controller = controller();
    let delivered = Arc::new(Mutex::new(Vec::new()));
    controller.add_sink(Box::new(RecordingSink {
        delivered: Arc::clone(&delivered),
    }));

    let source = MemorySource::new("replay.pcap", discovery_frames());
    controller.start(Box::new(source), None).unwrap();
    let outcome = controller.wait().unwrap();

    assert_eq!(controller.state(), SessionState::Stopped);
    assert_eq!(outcome.stop_reason, StopReason::EndOfStream);
    assert_eq!(outcome.interface, "replay.pcap");
    assert_eq!(outcome.session_id, controller.session_id());
    assert_eq!(outcome.stats.frames_captured, 5);
    assert_eq!(outcome.stats.frames_decoded, 5);
    assert_eq!(outcome.stats.queue_dropped, 0);
    assert_eq!(outcome.stats.discarded_on_stop, 0);

    let order: Vec<_> = outcome.networks.iter().map(|n| n.record.bssid).collect();
    assert_eq!(order, vec![AP_HOME, AP_CORP]);
    assert!(outcome.networks.iter().all(|n| !n.record.hidden));
    assert!(outcome.networks.iter().all(|n| n.record.classification.is_some()));
    assert!(outcome.networks[0].signal.is_some());

    // delivered exactly once
    assert_eq!(delivered.lock().len(), 1);
    assert_eq!(delivered.lock()[0], outcome);
}

#[test]
fn test_blocking_push_loses_nothing_with_tiny_queue() {
    let config = ScanConfig {
        queue_capacity: 1,
        ..test_config()
    };
    let controller = SessionController::with_vendors(config, Arc::new(StaticOuiTable::new()));

    let frames: Vec<RawFrame> = (0..200)
        .map(|i| FrameBuilder::beacon(AP_HOME).ssid("HomeNet").signal(-60).at(i).build())
        .collect();
    controller.start(Box::new(MemorySource::new("replay", frames)), None).unwrap();
    let outcome = controller.wait().unwrap();

    assert_eq!(outcome.stats.frames_decoded, 200);
    assert_eq!(outcome.stats.queue_dropped, 0);
    assert_eq!(outcome.networks[0].record.beacon_count, 200);
}

#[test]
fn test_invalid_transitions() {
    let controller = controller();
    assert!(matches!(
        controller.stop(),
        Err(SessionError::InvalidState { state: SessionState::Idle, .. })
    ));
    assert!(matches!(controller.wait(), Err(SessionError::InvalidState { .. })));

    controller
        .start(Box::new(MemorySource::new("replay", Vec::new())), None)
        .unwrap();
    let second = controller.start(Box::new(MemorySource::new("replay", Vec::new())), None);
    assert!(matches!(second, Err(SessionError::InvalidState { action: "start", .. })));

    controller.wait().unwrap();
    let third = controller.start(Box::new(MemorySource::new("replay", Vec::new())), None);
    assert!(matches!(
        third,
        Err(SessionError::InvalidState { state: SessionState::Stopped, .. })
    ));
}

#[test]
fn test_stop_finalizes_once() {
    let controller = controller();
    let delivered = Arc::new(Mutex::new(Vec::new()));
    controller.add_sink(Box::new(RecordingSink {
        delivered: Arc::clone(&delivered),
    }));

    controller.start(Box::new(QuietSource), None).unwrap();
    assert_eq!(controller.state(), SessionState::Running);

    let first = controller.stop().unwrap();
    assert_eq!(first.stop_reason, StopReason::Requested);
    assert_eq!(controller.state(), SessionState::Stopped);

    let second = controller.stop().unwrap();
    assert_eq!(first, second);
    assert_eq!(delivered.lock().len(), 1);
}

#[test]
fn test_stop_from_another_thread() {
    let controller = controller();
    controller.start(Box::new(QuietSource), None).unwrap();

    let remote = controller.clone();
    let handle = thread::spawn(move || remote.stop());

    let outcome = controller.wait().unwrap();
    let stopped = handle.join().unwrap().unwrap();
    assert_eq!(outcome, stopped);
    assert_eq!(outcome.stop_reason, StopReason::Requested);
}

#[test]
fn test_duration_elapsed() {
    let controller = controller();
    controller
        .start(Box::new(QuietSource), Some(Duration::from_millis(100)))
        .unwrap();

    let outcome = controller.wait().unwrap();
    assert_eq!(outcome.stop_reason, StopReason::DurationElapsed);
    assert!(outcome.networks.is_empty());
}

#[test]
fn test_capture_error_finalizes_with_partial_results() {
    let controller = controller();
    let frames = vec![FrameBuilder::beacon(AP_HOME).ssid("HomeNet").at(1).build()];
    let source = MemorySource::new("mon0", frames).failing("device went away");

    controller.start(Box::new(source), None).unwrap();
    let outcome = controller.wait().unwrap();

    assert_eq!(
        outcome.stop_reason,
        StopReason::CaptureInterrupted("Capture Error: device went away".to_string())
    );
    assert!(matches!(
        controller.take_capture_error(),
        Some(SessionError::CaptureInterrupted(CaptureError::Backend(_)))
    ));
    assert!(controller.take_capture_error().is_none());
    assert!(outcome.networks.len() <= 1);
}

#[test]
fn test_failing_sink_is_not_fatal() {
    let controller = controller();
    let delivered = Arc::new(Mutex::new(Vec::new()));
    controller.add_sink(Box::new(FailingSink));
    controller.add_sink(Box::new(RecordingSink {
        delivered: Arc::clone(&delivered),
    }));

    controller
        .start(Box::new(MemorySource::new("replay", discovery_frames())), None)
        .unwrap();
    let outcome = controller.wait().unwrap();

    assert_eq!(outcome.networks.len(), 2);
    assert_eq!(delivered.lock().len(), 1);
}

#[test]
fn test_snapshot_does_not_write_classifications() {
    let controller = controller();
    let frames = vec![
        FrameBuilder::beacon(AP_HOME).ssid("Airport_Free_WiFi").at(1).build(),
        wpa2(FrameBuilder::beacon(AP_CORP).ssid("CorpWifi")).at(2).build(),
    ];
    controller.start(Box::new(TrickleSource::new(frames)), None).unwrap();
    wait_until("both beacons", || controller.stats().frames_decoded == 2);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].classification.category, Category::Public);
    assert!(snapshot.iter().all(|n| n.record.classification.is_some()));
    {
        let core = controller.inner.core.lock();
        assert!(core.registry().get(&AP_HOME).unwrap().classification.is_none());
        assert!(core.registry().get(&AP_CORP).unwrap().classification.is_none());
    }

    let outcome = controller.stop().unwrap();
    assert_eq!(outcome.networks[0].classification, snapshot[0].classification);
    let core = controller.inner.core.lock();
    assert!(core.registry().get(&AP_HOME).unwrap().classification.is_some());
}

#[test]
fn test_stop_discards_queued_frames() {
    let config = ScanConfig {
        queue_capacity: 8,
        ..test_config()
    };
    let controller = SessionController::with_vendors(config, Arc::new(StaticOuiTable::new()));

    // hold the core so processing stalls on its first frame
    let stall = controller.inner.core.lock();
    controller
        .start(Box::new(MemorySource::new("replay", home_beacons(20))), None)
        .unwrap();
    // one frame in flight, eight queued, one waiting for room
    let inner = Arc::clone(&controller.inner);
    wait_until("a stalled pipeline", || {
        inner.queue.len() == 8 && inner.frames_captured.load(Ordering::SeqCst) == 10
    });

    let remote = controller.clone();
    let stopper = thread::spawn(move || remote.stop());
    wait_until("queued frames discarded", || inner.discarded.load(Ordering::SeqCst) == 9);
    drop(stall);

    let outcome = stopper.join().unwrap().unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Requested);
    assert_eq!(outcome.stats.frames_decoded, 1);
    assert_eq!(outcome.stats.frames_captured, 10);
    assert_eq!(outcome.stats.discarded_on_stop, 9);
    assert_eq!(outcome.stats.queue_dropped, 0);
    assert_eq!(
        outcome.stats.frames_decoded + outcome.stats.discarded_on_stop,
        outcome.stats.frames_captured
    );
    assert_eq!(outcome.networks[0].record.beacon_count, 1);
}

#[test]
fn test_live_overrun_drops_oldest() {
    let config = ScanConfig {
        queue_capacity: 1,
        ..test_config()
    };
    let controller = SessionController::with_vendors(config, Arc::new(StaticOuiTable::new()));

    let stall = controller.inner.core.lock();
    let source = MemorySource::new("mon0", home_beacons(50)).live();
    controller.start(Box::new(source), None).unwrap();
    let inner = Arc::clone(&controller.inner);
    wait_until("all frames captured", || inner.frames_captured.load(Ordering::SeqCst) == 50);
    drop(stall);

    let outcome = controller.wait().unwrap();
    let stats = &outcome.stats;
    assert_eq!(outcome.stop_reason, StopReason::EndOfStream);
    assert_eq!(stats.frames_captured, 50);
    // one frame in flight plus the single queue slot
    assert!(stats.frames_decoded <= 2);
    assert!(stats.queue_dropped >= 48);
    assert_eq!(stats.discarded_on_stop, 0);
    assert_eq!(
        stats.frames_decoded + stats.queue_dropped + stats.discarded_on_stop,
        stats.frames_captured
    );
}

#[test]
fn test_drain_timeout_leaves_registry_untouched() {
    let config = ScanConfig {
        drain_timeout: Duration::from_millis(100),
        ..test_config()
    };
    let controller = SessionController::with_vendors(config, Arc::new(StaticOuiTable::new()));
    controller
        .start(Box::new(TrickleSource::new(home_beacons(1))), None)
        .unwrap();
    wait_until("the beacon", || controller.stats().frames_decoded == 1);

    let stall = controller.inner.core.lock();
    assert!(matches!(controller.stop(), Err(SessionError::DrainTimeout)));
    drop(stall);

    let outcome = controller.wait().unwrap();
    assert_eq!(outcome.networks.len(), 1);
    assert!(outcome.networks[0].record.classification.is_some());
    let core = controller.inner.core.lock();
    assert!(core.registry().get(&AP_HOME).unwrap().classification.is_none());
}

#[test]
fn test_oui_file_reaches_official_vendor_tier() {
    let dir = tempfile::tempdir().unwrap();
    let manuf = dir.path().join("manuf");
    std::fs::write(&manuf, "00:80:18\tHarris\tHarris Corporation\n").unwrap();

    let config = ScanConfig {
        oui_file: Some(manuf),
        ..test_config()
    };
    let controller = SessionController::new(config);
    let radio = MacAddr([0x00, 0x80, 0x18, 0x01, 0x02, 0x03]);
    let frames = vec![wpa2(FrameBuilder::beacon(radio).ssid("Unit7")).at(1).build()];

    controller.start(Box::new(MemorySource::new("replay", frames)), None).unwrap();
    let outcome = controller.wait().unwrap();

    let network = &outcome.networks[0];
    assert_eq!(network.record.vendor.as_deref(), Some("Harris Corporation"));
    assert_eq!(network.classification.category, Category::PossibleOfficial);
    assert_eq!(network.classification.caveat.as_deref(), Some(OFFICIAL_CAVEAT));
}

#[test]
fn test_stale_reported_at_end() {
    let config = ScanConfig {
        stale_after: Duration::from_secs(60),
        ..test_config()
    };
    let controller = SessionController::with_vendors(config, Arc::new(StaticOuiTable::new()));
    let frames = vec![
        FrameBuilder::beacon(AP_HOME).ssid("HomeNet").at(1).build(),
        FrameBuilder::beacon(AP_CORP).ssid("CorpWifi").at(120).build(),
    ];

    controller.start(Box::new(MemorySource::new("replay", frames)), None).unwrap();
    let outcome = controller.wait().unwrap();

    assert_eq!(outcome.stale, vec![AP_HOME]);
    assert_eq!(outcome.networks.len(), 2);
}
