//! macwatch - passive LAN device monitor.
//!
//! Captures frames on one or more interfaces, counts packets per hardware
//! address, resolves vendors from an offline OUI file and prints a
//! refreshed table of every device seen.
//!
//! The pipeline is: [`capture`] → [`parser`] → [`store`] → [`reporter`],
//! wired together by [`monitor`].

pub mod aggregator;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod monitor;
pub mod parser;
pub mod reporter;
pub mod store;
pub mod utils;
pub mod vendor;

pub use config::{Config, InterfaceSelection, Overrides};
pub use error::{CaptureError, ConfigError};
pub use monitor::{Monitor, MonitorSummary};
pub use vendor::VendorRegistry;
