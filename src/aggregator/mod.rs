//! Aggregation workers.
//!
//! One worker runs per capture interface and merges decoded packets into the
//! shared `DeviceStore`.

mod worker;

pub use worker::{Aggregator, AggregatorStats};
