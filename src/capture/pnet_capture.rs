//! pnet-based frame capture implementation.

use std::io;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkReceiver, NetworkInterface};
use tracing::debug;

use super::{FrameSource, RawFrame, ReadOutcome};
use crate::error::CaptureError;

/// Name reported for the all-interfaces reader.
pub const CATCH_ALL_NAME: &str = "any";

/// Frame reader bound to one interface.
///
/// Owns the receive side of a pnet datalink channel. The handle is closed
/// exactly once, when the reader is dropped.
pub struct PnetFrameReader {
    interface: String,
    rx: Box<dyn DataLinkReceiver>,
}

impl PnetFrameReader {
    /// Open the named interface in promiscuous mode.
    pub fn open(interface_name: &str, read_timeout: Duration) -> Result<Self, CaptureError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(interface_name.to_string()))?;

        Self::open_on(interface, read_timeout, true)
    }

    /// Open a single reader that receives frames from every interface.
    ///
    /// Binds a packet socket to interface index 0. Promiscuous membership
    /// cannot be requested on index 0, so this only sees traffic the host
    /// would receive anyway.
    #[cfg(target_os = "linux")]
    pub fn open_catch_all(read_timeout: Duration) -> Result<Self, CaptureError> {
        let mut interface = datalink::interfaces()
            .into_iter()
            .next()
            .ok_or_else(|| CaptureError::InterfaceNotFound(CATCH_ALL_NAME.to_string()))?;

        interface.name = CATCH_ALL_NAME.to_string();
        interface.index = 0;
        interface.ips.clear();

        Self::open_on(interface, read_timeout, false)
    }

    #[cfg(not(target_os = "linux"))]
    pub fn open_catch_all(_read_timeout: Duration) -> Result<Self, CaptureError> {
        Err(CaptureError::InterfaceNotFound(format!(
            "{} (catch-all capture is only supported on Linux)",
            CATCH_ALL_NAME
        )))
    }

    fn open_on(
        interface: NetworkInterface,
        read_timeout: Duration,
        promiscuous: bool,
    ) -> Result<Self, CaptureError> {
        let config = Config {
            read_timeout: Some(read_timeout),
            promiscuous,
            ..Config::default()
        };

        let rx = match datalink::channel(&interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => return Err(CaptureError::UnsupportedChannel(interface.name)),
            Err(e) => {
                let msg = e.to_string();
                if e.kind() == io::ErrorKind::PermissionDenied
                    || msg.contains("permission")
                    || msg.contains("Operation not permitted")
                {
                    return Err(CaptureError::InsufficientPermissions);
                }
                return Err(CaptureError::ChannelCreation(format!(
                    "{}: {}",
                    interface.name, msg
                )));
            }
        };

        debug!(
            "Opened capture on {} (promiscuous: {}, timeout: {:?})",
            interface.name, promiscuous, read_timeout
        );

        Ok(Self {
            interface: interface.name,
            rx,
        })
    }
}

impl FrameSource for PnetFrameReader {
    fn read(&mut self) -> Result<ReadOutcome, CaptureError> {
        match self.rx.next() {
            Ok(frame) => Ok(ReadOutcome::Frame(RawFrame {
                data: frame.to_vec(),
                length: frame.len(),
                interface: self.interface.clone(),
            })),
            Err(e) if is_timeout(&e) => Ok(ReadOutcome::Timeout),
            Err(e) => Err(CaptureError::Read(e)),
        }
    }

    fn interface_name(&self) -> &str {
        &self.interface
    }
}

impl Drop for PnetFrameReader {
    fn drop(&mut self) {
        debug!("Releasing capture handle on {}", self.interface);
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Names of interfaces that are up, and the preferred default among them.
///
/// The default is the first interface that is up, not a loopback and has an
/// address.
pub fn active_interfaces() -> (Vec<String>, Option<String>) {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces()
        .into_iter()
        .filter(|iface| iface.is_up())
        .collect();

    let default = interfaces
        .iter()
        .find(|iface| !iface.is_loopback() && !iface.ips.is_empty())
        .map(|iface| iface.name.clone());

    (interfaces.into_iter().map(|iface| iface.name).collect(), default)
}

/// One line per interface, for `--list-interfaces`.
pub fn describe_interfaces() -> Vec<String> {
    datalink::interfaces()
        .into_iter()
        .map(|iface| {
            let status = if iface.is_up() { "UP" } else { "DOWN" };
            let ips: Vec<_> = iface.ips.iter().map(|ip| ip.to_string()).collect();
            let mac = iface
                .mac
                .map(|mac| mac.to_string())
                .unwrap_or_else(|| "no MAC".to_string());
            format!(
                "{}: {} {} [{}]",
                iface.name,
                status,
                mac,
                if ips.is_empty() {
                    "no IP".to_string()
                } else {
                    ips.join(", ")
                }
            )
        })
        .collect()
}
