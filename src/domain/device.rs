//! Per-device aggregate state.

use std::net::Ipv4Addr;

/// What a single endpoint of a single packet contributes to its device record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub ip: Option<Ipv4Addr>,
    pub ethertype: u16,
    pub interface: String,
    pub length: usize,
}

/// Aggregated statistics for one hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Number of packets this address appeared in (as source or destination)
    pub packet_count: usize,
    /// Sum of the lengths of those packets
    pub byte_count: usize,
    pub last_ip: Option<Ipv4Addr>,
    pub last_ethertype: u16,
    /// Interface of the most recent observation that carried an IP
    pub network: String,
}

impl DeviceRecord {
    /// Create a record from the first observation of an address.
    pub fn first_seen(observation: &Observation) -> Self {
        Self {
            packet_count: 1,
            byte_count: observation.length,
            last_ip: observation.ip,
            last_ethertype: observation.ethertype,
            network: observation.interface.clone(),
        }
    }

    /// Fold a later observation into the record.
    ///
    /// Counters always advance. The descriptive fields are only replaced when
    /// the observation carries an IP, so broadcast or non-IP chatter does not
    /// wipe a known address.
    pub fn absorb(&mut self, observation: &Observation) {
        self.packet_count += 1;
        self.byte_count += observation.length;

        if observation.ip.is_some() {
            self.last_ip = observation.ip;
            self.last_ethertype = observation.ethertype;
            self.network.clone_from(&observation.interface);
        }
    }
}
