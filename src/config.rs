//! Configuration for the connection core.
//!
//! Two kinds of configuration feed the core:
//!
//! - Device parameters (network name, broker address, credentials) come from
//!   an external [`ParameterStore`] and are copied once into a [`NetConfig`].
//! - Tuning constants and routing settings live in [`CoreConfig`], a plain
//!   struct with sensible defaults.
//!
//! ```rust
//! use iotlink::config::{CoreConfig, NetConfig, ParameterStore, StaticParameters};
//!
//! let params = StaticParameters::new(
//!     &[
//!         ("wifi_ssid", "home"),
//!         ("wifi_pass", "secret"),
//!         ("device_id", "virgo-01"),
//!         ("mqtt_ip", "192.168.1.10"),
//!     ],
//!     &["wifi_ssid", "device_id", "mqtt_ip"],
//! );
//! assert!(params.is_critical_valid());
//!
//! let net = NetConfig::load(&params).unwrap();
//! assert_eq!(net.broker_port, 1883);
//!
//! let core = CoreConfig {
//!     log_topic: Some("virgo/log"),
//!     ..CoreConfig::default()
//! };
//! assert_eq!(core.timing.flush_window_ms, 3000);
//! ```

use heapless::String;

use crate::error::Error;
use crate::session::QoS;

/// Key-value lookups into the device parameter set.
///
/// Implemented by whatever owns provisioning and validation; the core only
/// reads.
pub trait ParameterStore {
    /// Text value of `key`, if set.
    fn get_string(&self, key: &str) -> Option<&str>;

    /// Integer value of `key`, if set and numeric.
    fn get_int(&self, key: &str) -> Option<i32> {
        self.get_string(key)?.trim().parse().ok()
    }

    /// `true` when every parameter needed to leave provisioning is valid.
    fn is_critical_valid(&self) -> bool;
}

/// A parameter set backed by a static slice of pairs.
///
/// A critical key is valid when it is present with a non-empty value.
#[derive(Debug, Clone, Copy)]
pub struct StaticParameters<'a> {
    entries: &'a [(&'a str, &'a str)],
    critical: &'a [&'a str],
}

impl<'a> StaticParameters<'a> {
    pub const fn new(entries: &'a [(&'a str, &'a str)], critical: &'a [&'a str]) -> Self {
        Self { entries, critical }
    }
}

impl ParameterStore for StaticParameters<'_> {
    fn get_string(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    fn is_critical_valid(&self) -> bool {
        self.critical
            .iter()
            .all(|key| self.get_string(key).is_some_and(|v| !v.is_empty()))
    }
}

/// Network and broker identity, copied out of the parameter store at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetConfig {
    pub ssid: String<32>,
    pub wifi_password: String<64>,
    /// Device identifier: network hostname, broker client id and discovery id.
    pub device_id: String<32>,
    pub broker_host: String<64>,
    pub broker_port: u16,
    pub username: String<32>,
    pub password: String<64>,
}

impl NetConfig {
    /// Reads `wifi_ssid`, `wifi_pass`, `device_id`, `mqtt_ip`, `mqtt_port`,
    /// `mqtt_user` and `mqtt_pass`.
    ///
    /// The SSID, device id and broker host are required. The port defaults
    /// to 1883; credentials default to empty.
    pub fn load<P: ParameterStore + ?Sized>(params: &P) -> Result<Self, Error> {
        let port = match params.get_int("mqtt_port") {
            Some(p) => u16::try_from(p).map_err(|_| Error::Capacity)?,
            None => 1883,
        };
        Ok(Self {
            ssid: required(params, "wifi_ssid")?,
            wifi_password: optional(params, "wifi_pass")?,
            device_id: required(params, "device_id")?,
            broker_host: required(params, "mqtt_ip")?,
            broker_port: port,
            username: optional(params, "mqtt_user")?,
            password: optional(params, "mqtt_pass")?,
        })
    }
}

fn required<P: ParameterStore + ?Sized, const N: usize>(
    params: &P,
    key: &str,
) -> Result<String<N>, Error> {
    match params.get_string(key) {
        Some(v) if !v.is_empty() => String::try_from(v).map_err(|_| Error::Capacity),
        _ => Err(Error::MissingParameter),
    }
}

fn optional<P: ParameterStore + ?Sized, const N: usize>(
    params: &P,
    key: &str,
) -> Result<String<N>, Error> {
    String::try_from(params.get_string(key).unwrap_or("")).map_err(|_| Error::Capacity)
}

/// Timing policy for the guards and the orchestrator, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// How long after subscribing retained messages are ignored.
    pub flush_window_ms: u64,
    /// Minimum spacing between attach attempts while one is in flight.
    pub attempt_spacing_ms: u64,
    /// Minimum spacing between full driver resets.
    pub radio_reset_ms: u64,
    /// Minimum spacing between diagnostic scans, and the hold-off after a
    /// scan that did not find the network.
    pub scan_throttle_ms: u64,
    /// Consecutive failures before a diagnostic scan.
    pub scan_after_failures: u8,
    pub backoff_base_ms: u64,
    /// Highest failure count that still grows the delay exponentially.
    pub backoff_max_shift: u8,
    pub backoff_ceiling_ms: u64,
    /// Exclusive upper bound of the random jitter added to each delay.
    pub jitter_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            flush_window_ms: 3_000,
            attempt_spacing_ms: 8_000,
            radio_reset_ms: 5_000,
            scan_throttle_ms: 30_000,
            scan_after_failures: 5,
            backoff_base_ms: 100,
            backoff_max_shift: 5,
            backoff_ceiling_ms: 10_000,
            jitter_ms: 50,
        }
    }
}

/// Settings of the connection core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig<'a> {
    pub timing: Timing,
    pub keep_alive_secs: u16,
    pub clean_session: bool,
    /// First topic level of the discovery topic.
    pub discovery_prefix: &'a str,
    /// Topic that [`log_book`](crate::runtime::Runtime::log_book) messages go to.
    pub log_topic: Option<&'a str>,
    /// Name of an INTERNAL entity reporting whether the supervisor is online.
    /// When set, publishing additionally requires that entity to read true.
    pub supervisor_status: Option<&'a str>,
    /// Maximum inbound messages handled per tick.
    pub inbound_budget: usize,
    pub state_qos: QoS,
    pub retain_states: bool,
}

impl Default for CoreConfig<'_> {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            keep_alive_secs: 20,
            clean_session: true,
            discovery_prefix: "homeassistant",
            log_topic: None,
            supervisor_status: None,
            inbound_budget: 8,
            state_qos: QoS::AtMostOnce,
            retain_states: false,
        }
    }
}
