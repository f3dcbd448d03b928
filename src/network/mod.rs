//! Link-layer network attachment for embedded systems
//!
//! This module defines the contract a Wi-Fi (or similar) driver implements so
//! that the [`NetworkGuard`] can keep the device attached without ever
//! blocking the polling loop. The guard owns retry, backoff, periodic driver
//! reset and scan diagnostics; the driver only reports status and performs
//! single, non-blocking operations.
//!

#![allow(missing_docs)]
#![deny(unsafe_code)]

use heapless::{String, Vec};

/// Common error types for network operations
pub mod error;

/// Retry spacing shared by the network and session guards
pub mod backoff;

/// Non-blocking attachment state machine
pub mod guard;

pub use backoff::Backoff;
pub use guard::NetworkGuard;

/// Maximum number of access points returned by one scan.
pub const MAX_SCAN: usize = 16;

/// Maximum SSID length in bytes.
pub const SSID_LEN: usize = 32;

/// Link status as reported by the driver.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LinkStatus {
    /// Attached with an address.
    Connected,
    /// Driver idle, no attempt in progress.
    Idle,
    /// The configured network is not in range.
    NoNetwork,
    /// Authentication was rejected.
    ConnectFailed,
    /// An established link dropped.
    ConnectionLost,
    /// Not attached.
    Disconnected,
}

/// One entry of a scan result.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AccessPoint {
    pub ssid: String<SSID_LEN>,
    pub rssi: i8,
    pub channel: u8,
}

/// Snapshot of an established link, for diagnostics.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LinkInfo {
    pub ip: [u8; 4],
    pub rssi: i8,
    pub channel: u8,
    pub bssid: [u8; 6],
}

/// Driver-side operations needed by [`NetworkGuard`].
///
/// No method may block beyond a driver call; [`begin`](Self::begin) starts an
/// attempt and returns immediately.
pub trait NetworkInterface {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Current link status.
    fn status(&mut self) -> LinkStatus;

    /// Lists visible access points.
    fn scan(&mut self) -> Result<Vec<AccessPoint, MAX_SCAN>, Self::Error>;

    /// Full low-level reset: drop stored credentials, re-enter station mode
    /// and set the network hostname.
    fn reset(&mut self, hostname: &str) -> Result<(), Self::Error>;

    /// Starts a non-blocking attach attempt.
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Details of the current link, if the driver can report them.
    fn link_info(&mut self) -> Option<LinkInfo> {
        None
    }

    /// Advertises `hostname` on the local network (mDNS or equivalent).
    fn announce_hostname(&mut self, hostname: &str) -> Result<(), Self::Error> {
        let _ = hostname;
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkStatus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LinkStatus::Connected => defmt::write!(f, "Connected"),
            LinkStatus::Idle => defmt::write!(f, "Idle"),
            LinkStatus::NoNetwork => defmt::write!(f, "NoNetwork"),
            LinkStatus::ConnectFailed => defmt::write!(f, "ConnectFailed"),
            LinkStatus::ConnectionLost => defmt::write!(f, "ConnectionLost"),
            LinkStatus::Disconnected => defmt::write!(f, "Disconnected"),
        }
    }
}
