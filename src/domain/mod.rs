//! Domain models for passive device monitoring.
//!
//! This module contains the core types shared by the decoder, the
//! aggregation store and the reporter. None of them touch the network.

mod device;
mod packet;

pub use device::{DeviceRecord, Observation};
pub use packet::{DecodedPacket, Endpoint};
