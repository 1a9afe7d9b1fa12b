//! Ethernet / IPv4 header decoder.
//!
//! Header fields come from pnet's packet views, which refuse buffers shorter
//! than their fixed header, so truncated or hostile frames can only ever
//! produce less information, never an out-of-bounds read.

use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::Packet;

use crate::domain::{DecodedPacket, Endpoint};

/// Decoder for captured Ethernet frames.
///
/// Stateless; a single instance can be shared or recreated freely.
pub struct FrameDecoder;

impl FrameDecoder {
    /// Create a new frame decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decode a captured frame.
    ///
    /// `length` is the length declared by the capture provider; only
    /// `min(length, bytes.len())` bytes are ever examined. Returns `None` for
    /// frames too short to hold an Ethernet header.
    pub fn decode(&self, bytes: &[u8], length: usize, interface: &str) -> Option<DecodedPacket> {
        let data = &bytes[..length.min(bytes.len())];
        let ethernet = EthernetPacket::new(data)?;
        let ethertype = ethernet.get_ethertype();

        // Needs the full 20-byte IPv4 header after the Ethernet header
        let ipv4 = if ethertype == EtherTypes::Ipv4 {
            Ipv4Packet::new(ethernet.payload())
        } else {
            None
        };

        Some(DecodedPacket {
            interface: interface.to_string(),
            source: Endpoint::new(
                ethernet.get_source().to_string(),
                ipv4.as_ref().map(|ip| ip.get_source()),
            ),
            destination: Endpoint::new(
                ethernet.get_destination().to_string(),
                ipv4.as_ref().map(|ip| ip.get_destination()),
            ),
            ethertype: ethertype.0,
            length: data.len(),
            info: classify(ethertype, ipv4.as_ref()),
        })
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Produce a short protocol annotation from at most one byte past the Ethernet header.
fn classify(ethertype: EtherType, ipv4: Option<&Ipv4Packet>) -> Option<String> {
    match ethertype {
        EtherTypes::Ipv4 => ipv4.map(|ip| {
            let protocol = ip.get_next_level_protocol();
            format!("ip protocol: {} ({})", ip_protocol_name(protocol), protocol.0)
        }),
        EtherTypes::Arp => Some("arp".to_string()),
        EtherTypes::Ipv6 => Some("ipv6".to_string()),
        EtherTypes::Vlan => Some("802.1q vlan".to_string()),
        EtherTypes::Lldp => Some("lldp".to_string()),
        _ => None,
    }
}

fn ip_protocol_name(protocol: IpNextHeaderProtocol) -> &'static str {
    match protocol {
        IpNextHeaderProtocols::Icmp => "icmp",
        IpNextHeaderProtocols::Igmp => "igmp",
        IpNextHeaderProtocols::Tcp => "tcp",
        IpNextHeaderProtocols::Udp => "udp",
        IpNextHeaderProtocols::Gre => "gre",
        IpNextHeaderProtocols::Esp => "esp",
        IpNextHeaderProtocols::Ah => "ah",
        IpNextHeaderProtocols::OspfigP => "ospf",
        IpNextHeaderProtocols::Sctp => "sctp",
        _ => "other",
    }
}
