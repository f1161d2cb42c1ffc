//! Capture Sources
//!
//! Where raw frames come from. A source is pulled from a dedicated capture
//! thread; it never sees the registry.
//!
//! - `PcapFileSource`: replays a `.pcap` file (pure Rust, always available)
//! - `MemorySource`: replays frames held in memory (tests, tooling)
//! - `LiveSource`: monitor-mode interface via libpcap (`live-capture` feature)

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use pcap_file::pcap::PcapReader;

use crate::logic::frame::{CaptureTime, LinkType, RawFrame};

// ============================================================================
// TYPES
// ============================================================================

/// One step of a capture stream
#[derive(Debug)]
pub enum CaptureEvent {
    Frame(RawFrame),
    /// Nothing arrived within the read timeout; the stream is still open
    Idle,
    /// The stream ended cleanly
    EndOfStream,
}

#[derive(Debug)]
pub enum CaptureError {
    Io(std::io::Error),
    /// Link type other than radiotap (127) or bare 802.11 (105)
    UnsupportedLinkType(u32),
    /// Error reported by the capture backend
    Backend(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Io(e) => write!(f, "Capture Error: {}", e),
            CaptureError::UnsupportedLinkType(dlt) => {
                write!(f, "Capture Error: unsupported link type {} (need 802.11 or radiotap)", dlt)
            }
            CaptureError::Backend(msg) => write!(f, "Capture Error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::Io(e)
    }
}

impl From<pcap_file::PcapError> for CaptureError {
    fn from(e: pcap_file::PcapError) -> Self {
        CaptureError::Backend(e.to_string())
    }
}

/// Producer of raw frames. Receive-only.
pub trait CaptureSource: Send {
    /// Interface name or file path, for reports
    fn interface(&self) -> &str;

    /// Live sources must not block on a slow consumer
    fn is_live(&self) -> bool;

    fn next_event(&mut self) -> Result<CaptureEvent, CaptureError>;
}

// ============================================================================
// MEMORY SOURCE
// ============================================================================

/// Replays a fixed list of frames, then reports end of stream
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    frames: VecDeque<RawFrame>,
    live: bool,
    /// Error returned once the frames run out, instead of `EndOfStream`
    fail_with: Option<String>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, frames: Vec<RawFrame>) -> Self {
        Self {
            name: name.into(),
            frames: frames.into(),
            live: false,
            fail_with: None,
        }
    }

    /// Pretend to be a live interface (drop-oldest queueing)
    pub fn live(mut self) -> Self {
        self.live = true;
        self
    }

    /// End the stream with a backend error
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }
}

impl CaptureSource for MemorySource {
    fn interface(&self) -> &str {
        &self.name
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn next_event(&mut self) -> Result<CaptureEvent, CaptureError> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(CaptureEvent::Frame(frame));
        }
        match self.fail_with.take() {
            Some(message) => Err(CaptureError::Backend(message)),
            None => Ok(CaptureEvent::EndOfStream),
        }
    }
}

// ============================================================================
// PCAP FILE SOURCE
// ============================================================================

/// Offline replay of a classic pcap capture
pub struct PcapFileSource {
    path: String,
    link: LinkType,
    reader: PcapReader<BufReader<File>>,
}

impl std::fmt::Debug for PcapFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcapFileSource")
            .field("path", &self.path)
            .field("link", &self.link)
            .finish()
    }
}

impl PcapFileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = PcapReader::new(BufReader::new(file))?;

        let dlt = u32::from(reader.header().datalink);
        let link = LinkType::from_dlt(dlt).ok_or(CaptureError::UnsupportedLinkType(dlt))?;

        log::info!("Replaying {} ({:?})", path.display(), link);

        Ok(Self {
            path: path.display().to_string(),
            link,
            reader,
        })
    }

    pub fn link_type(&self) -> LinkType {
        self.link
    }
}

impl CaptureSource for PcapFileSource {
    fn interface(&self) -> &str {
        &self.path
    }

    fn is_live(&self) -> bool {
        false
    }

    fn next_event(&mut self) -> Result<CaptureEvent, CaptureError> {
        match self.reader.next_packet() {
            Some(packet) => {
                let packet = packet?;
                Ok(CaptureEvent::Frame(RawFrame::new(
                    packet.data.into_owned(),
                    CaptureTime::from_duration(packet.timestamp),
                    self.link,
                )))
            }
            None => Ok(CaptureEvent::EndOfStream),
        }
    }
}

// ============================================================================
// LIVE SOURCE (libpcap)
// ============================================================================

#[cfg(feature = "live-capture")]
pub use live::LiveSource;

#[cfg(feature = "live-capture")]
mod live {
    use super::*;

    /// Read timeout so the capture thread can notice `stop()`
    const READ_TIMEOUT_MS: i32 = 250;

    /// Monitor-mode interface. Switching the adapter into monitor mode is
    /// left to the operator.
    pub struct LiveSource {
        interface: String,
        link: LinkType,
        cap: pcap::Capture<pcap::Active>,
    }

    impl LiveSource {
        pub fn open(interface: &str) -> Result<Self, CaptureError> {
            let cap = pcap::Capture::from_device(interface)
                .map_err(|e| CaptureError::Backend(e.to_string()))?
                .promisc(true)
                .immediate_mode(true)
                .timeout(READ_TIMEOUT_MS)
                .open()
                .map_err(|e| CaptureError::Backend(e.to_string()))?;

            let dlt = cap.get_datalink().0 as u32;
            let link = LinkType::from_dlt(dlt).ok_or(CaptureError::UnsupportedLinkType(dlt))?;

            log::info!("Capturing on {} ({:?})", interface, link);

            Ok(Self {
                interface: interface.to_string(),
                link,
                cap,
            })
        }
    }

    impl CaptureSource for LiveSource {
        fn interface(&self) -> &str {
            &self.interface
        }

        fn is_live(&self) -> bool {
            true
        }

        fn next_event(&mut self) -> Result<CaptureEvent, CaptureError> {
            match self.cap.next_packet() {
                Ok(packet) => {
                    let ts = packet.header.ts;
                    let micros = (ts.tv_sec as u64)
                        .saturating_mul(1_000_000)
                        .saturating_add(ts.tv_usec as u64);
                    Ok(CaptureEvent::Frame(RawFrame::new(
                        packet.data.to_vec(),
                        CaptureTime(micros),
                        self.link,
                    )))
                }
                Err(pcap::Error::TimeoutExpired) => Ok(CaptureEvent::Idle),
                Err(pcap::Error::NoMorePackets) => Ok(CaptureEvent::EndOfStream),
                Err(e) => Err(CaptureError::Backend(e.to_string())),
            }
        }
    }
}
