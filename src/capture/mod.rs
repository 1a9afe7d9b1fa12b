//! Raw frame acquisition.
//!
//! This module defines the `FrameSource` trait and provides a pnet-based
//! implementation. Aggregator workers only see the trait, so tests can feed
//! them canned frames.

mod pnet_capture;

pub use pnet_capture::{active_interfaces, describe_interfaces, PnetFrameReader, CATCH_ALL_NAME};

use crate::error::CaptureError;

/// A raw frame as delivered by the capture provider.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// The captured bytes
    pub data: Vec<u8>,
    /// Length reported by the provider
    pub length: usize,
    /// Interface the frame arrived on
    pub interface: String,
}

/// What a single aggregator worker should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Interface(String),
    /// One reader for every interface at once
    CatchAll,
}

impl CaptureTarget {
    /// Display name used in logs and thread names.
    pub fn name(&self) -> &str {
        match self {
            CaptureTarget::Interface(name) => name,
            CaptureTarget::CatchAll => CATCH_ALL_NAME,
        }
    }
}

/// Result of one bounded read.
#[derive(Debug)]
pub enum ReadOutcome {
    Frame(RawFrame),
    /// Nothing arrived within the read timeout
    Timeout,
}

/// A source of raw frames from one interface.
///
/// Implementations own their capture handle exclusively and release it when
/// dropped. `read` must return within the configured read timeout so that
/// callers can check for cancellation between reads.
pub trait FrameSource: Send {
    /// Wait for the next frame, bounded by the read timeout.
    fn read(&mut self) -> Result<ReadOutcome, CaptureError>;

    /// Get the name of the interface being captured.
    fn interface_name(&self) -> &str;
}
