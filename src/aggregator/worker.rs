//! Capture → decode → merge loop for a single interface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::capture::{FrameSource, ReadOutcome};
use crate::parser::FrameDecoder;
use crate::store::DeviceStore;

/// Per-worker counters, returned when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    /// Frames decoded and merged into the store
    pub merged: usize,
    /// Frames too short to decode
    pub discarded: usize,
    /// Read errors reported by the capture provider
    pub read_errors: usize,
}

/// Feeds frames from one source into the shared store.
pub struct Aggregator {
    decoder: FrameDecoder,
    store: Arc<DeviceStore>,
}

impl Aggregator {
    pub fn new(store: Arc<DeviceStore>) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            store,
        }
    }

    /// Run until `running` is cleared.
    ///
    /// The flag is checked once per read, so the worst-case stop latency is
    /// the source's read timeout. Reading and decoding happen without holding
    /// the store lock.
    pub fn run<S: FrameSource + ?Sized>(&self, source: &mut S, running: &AtomicBool) -> AggregatorStats {
        let interface = source.interface_name().to_string();
        let mut stats = AggregatorStats::default();

        info!("Capturing on {}", interface);

        while running.load(Ordering::SeqCst) {
            let frame = match source.read() {
                Ok(ReadOutcome::Frame(frame)) => frame,
                Ok(ReadOutcome::Timeout) => continue,
                Err(e) => {
                    stats.read_errors += 1;
                    debug!("Capture error on {}: {}", interface, e);
                    continue;
                }
            };

            match self.decoder.decode(&frame.data, frame.length, &frame.interface) {
                Some(packet) => {
                    trace!(
                        "{}: {} -> {} type {:04x} len {} {}",
                        interface,
                        packet.source,
                        packet.destination,
                        packet.ethertype,
                        packet.length,
                        packet.info.as_deref().unwrap_or("")
                    );
                    if self.store.merge_packet(&packet) {
                        stats.merged += 1;
                    }
                }
                None => stats.discarded += 1,
            }
        }

        info!(
            "Stopped capturing on {} ({} frames merged, {} discarded, {} read errors)",
            interface, stats.merged, stats.discarded, stats.read_errors
        );

        stats
    }
}
