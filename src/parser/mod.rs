//! Frame decoding module.
//!
//! This module is responsible for turning raw captured bytes into domain packets.

mod frame_decoder;

pub use frame_decoder::FrameDecoder;
