//! Decoded link-layer packets.

use std::fmt;
use std::net::Ipv4Addr;

/// One side of a frame: hardware address plus the IPv4 address if the frame carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Canonical lowercase colon-separated hardware address
    pub hardware_address: String,
    /// IPv4 address, only present for IPv4 frames long enough to hold one
    pub ip_address: Option<Ipv4Addr>,
}

impl Endpoint {
    pub fn new(hardware_address: impl Into<String>, ip_address: Option<Ipv4Addr>) -> Self {
        Self {
            hardware_address: hardware_address.into(),
            ip_address,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip_address {
            Some(ip) => write!(f, "{} ({})", self.hardware_address, ip),
            None => write!(f, "{}", self.hardware_address),
        }
    }
}

/// A frame decoded into the fields the monitor cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    /// Interface the frame was captured on
    pub interface: String,
    pub source: Endpoint,
    pub destination: Endpoint,
    /// Raw ethertype field, read big-endian
    pub ethertype: u16,
    /// Captured length in bytes
    pub length: usize,
    /// Best-effort protocol annotation
    pub info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        let with_ip = Endpoint::new("aa:bb:cc:dd:ee:ff", Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(with_ip.to_string(), "aa:bb:cc:dd:ee:ff (10.0.0.1)");

        let without_ip = Endpoint::new("aa:bb:cc:dd:ee:ff", None);
        assert_eq!(without_ip.to_string(), "aa:bb:cc:dd:ee:ff");
    }
}
