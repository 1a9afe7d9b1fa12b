//! Shared device table.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{DecodedPacket, DeviceRecord, Endpoint, Observation};
use crate::utils::prettify;

/// Frame-level counters, independent of how many devices a frame touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficTotals {
    pub frames: usize,
    pub bytes: usize,
}

/// Point-in-time copy of the store, ordered by hardware address.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub devices: Vec<(String, DeviceRecord)>,
    pub totals: TrafficTotals,
}

#[derive(Debug, Default)]
struct Inner {
    devices: BTreeMap<String, DeviceRecord>,
    totals: TrafficTotals,
}

/// Device records keyed by canonical hardware address.
///
/// All state sits behind one mutex. Each public operation takes the lock
/// once, does only in-memory work and releases it, so producers never wait
/// on another producer's I/O.
#[derive(Debug, Default)]
pub struct DeviceStore {
    inner: Mutex<Inner>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one observation of `hardware_address`.
    ///
    /// The address is normalized first; an address with no hex digits is ignored.
    pub fn merge(&self, hardware_address: &str, observation: &Observation) {
        let key = prettify(hardware_address);
        if key.is_empty() {
            return;
        }

        let mut inner = self.lock();
        merge_into(&mut inner.devices, key, observation);
    }

    /// Merge both endpoints of a decoded packet and count the frame.
    ///
    /// Returns `false` without touching the store if the packet has no source address.
    pub fn merge_packet(&self, packet: &DecodedPacket) -> bool {
        if packet.source.hardware_address.is_empty() {
            return false;
        }

        let source_key = prettify(&packet.source.hardware_address);
        let destination_key = prettify(&packet.destination.hardware_address);
        let source = observation_for(packet, &packet.source);
        let destination = observation_for(packet, &packet.destination);

        let mut inner = self.lock();
        inner.totals.frames += 1;
        inner.totals.bytes += packet.length;
        if !source_key.is_empty() {
            merge_into(&mut inner.devices, source_key, &source);
        }
        if !destination_key.is_empty() {
            merge_into(&mut inner.devices, destination_key, &destination);
        }

        true
    }

    /// Copy every record and the traffic totals.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.lock();
        StoreSnapshot {
            devices: inner
                .devices
                .iter()
                .map(|(mac, record)| (mac.clone(), record.clone()))
                .collect(),
            totals: inner.totals,
        }
    }

    /// Get a copy of a single record.
    pub fn get(&self, hardware_address: &str) -> Option<DeviceRecord> {
        self.lock().devices.get(&prettify(hardware_address)).cloned()
    }

    /// Number of distinct devices seen.
    pub fn len(&self) -> usize {
        self.lock().devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().devices.is_empty()
    }

    // Records are plain counters, so a panic in another holder cannot leave
    // them logically broken; keep going with the data as-is.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn merge_into(devices: &mut BTreeMap<String, DeviceRecord>, key: String, observation: &Observation) {
    devices
        .entry(key)
        .and_modify(|record| record.absorb(observation))
        .or_insert_with(|| DeviceRecord::first_seen(observation));
}

fn observation_for(packet: &DecodedPacket, endpoint: &Endpoint) -> Observation {
    Observation {
        ip: endpoint.ip_address,
        ethertype: packet.ethertype,
        interface: packet.interface.clone(),
        length: packet.length,
    }
}
