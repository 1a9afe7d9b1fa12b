//! Concurrent aggregation store shared by capture workers and the reporter.

mod device_store;

pub use device_store::{DeviceStore, StoreSnapshot, TrafficTotals};
