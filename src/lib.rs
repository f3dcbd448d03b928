//! # iotlink - connection core for home-automation devices
//!
//! A `no_std` runtime core that keeps a microcontroller attached to its
//! network and to a publish/subscribe broker, and keeps a fixed set of named
//! entities in sync with a remote supervisor such as a home-automation hub.
//!
//! ## Features
//!
//! ### Connection management
//! - **Network guard**: non-blocking attach with exponential backoff and jitter,
//!   periodic driver reset and scan diagnostics
//! - **Session guard**: non-blocking broker session with the same backoff policy
//! - **Orchestrator**: explicit state machine from attach to discovery,
//!   subscription, retained-message flush and readiness
//!
//! ### Entities
//! - Typed, topic-addressed state cells with change detection
//! - Persistence of controllable values across reboots
//! - Canonical numeric formatting driven by a resolution string
//!
//! ### Support
//! - Parameter lookup and boot-time provisioning decision
//! - Long-press provisioning trigger
//! - Suspend and resume for exclusive collaborators such as firmware upload
//!
//! ## Usage
//!
//! ```rust,no_run
//! use iotlink::config::{CoreConfig, NetConfig, StaticParameters};
//! use iotlink::entity::{EntityDescriptor, Kind, Registry};
//! use iotlink::runtime::{Peripherals, Runtime};
//! use iotlink::storage::MemoryStore;
//! # use iotlink::network::{AccessPoint, LinkStatus, NetworkInterface, MAX_SCAN};
//! # use iotlink::session::{BrokerSession, Credentials, InboundMessage, QoS, SessionOptions};
//! # use iotlink::system::Platform;
//! # struct Wifi;
//! # impl NetworkInterface for Wifi {
//! #     type Error = ();
//! #     fn status(&mut self) -> LinkStatus { LinkStatus::Connected }
//! #     fn scan(&mut self) -> Result<heapless::Vec<AccessPoint, MAX_SCAN>, ()> { Ok(heapless::Vec::new()) }
//! #     fn reset(&mut self, _h: &str) -> Result<(), ()> { Ok(()) }
//! #     fn begin(&mut self, _s: &str, _p: &str) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct Mqtt;
//! # impl BrokerSession for Mqtt {
//! #     type Error = ();
//! #     fn configure(&mut self, _o: &SessionOptions<'_>) -> Result<(), ()> { Ok(()) }
//! #     fn is_connected(&mut self) -> bool { true }
//! #     fn connect(&mut self, _c: &Credentials<'_>) -> Result<(), ()> { Ok(()) }
//! #     fn disconnect(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn publish(&mut self, _t: &str, _p: &[u8], _q: QoS, _r: bool) -> Result<(), ()> { Ok(()) }
//! #     fn subscribe(&mut self, _t: &str, _q: QoS) -> Result<(), ()> { Ok(()) }
//! #     fn poll(&mut self) -> Result<Option<InboundMessage>, ()> { Ok(None) }
//! # }
//! # struct Board;
//! # impl Platform for Board {
//! #     fn now_ms(&self) -> u64 { 0 }
//! #     fn reboot(&mut self) {}
//! # }
//! # struct Rng;
//! # impl rand_core::RngCore for Rng {
//! #     fn next_u32(&mut self) -> u32 { 7 }
//! #     fn next_u64(&mut self) -> u64 { 7 }
//! #     fn fill_bytes(&mut self, d: &mut [u8]) { d.fill(7) }
//! #     fn try_fill_bytes(&mut self, d: &mut [u8]) -> Result<(), rand_core::Error> { d.fill(7); Ok(()) }
//! # }
//!
//! static ENTITIES: [EntityDescriptor<'static>; 2] = [
//!     EntityDescriptor::new("Relay", Kind::Control)
//!         .topics("virgo/relay/state", "virgo/relay/set")
//!         .default_value("OFF"),
//!     EntityDescriptor::new("Supervisor", Kind::Internal)
//!         .topics("", "homeassistant/status")
//!         .default_value("offline"),
//! ];
//!
//! let params = StaticParameters::new(
//!     &[("wifi_ssid", "home"), ("device_id", "virgo-01"), ("mqtt_ip", "10.0.0.2")],
//!     &["wifi_ssid", "device_id", "mqtt_ip"],
//! );
//!
//! let mut core = Runtime::new(
//!     Registry::from_table(&ENTITIES).unwrap(),
//!     NetConfig::load(&params).unwrap(),
//!     CoreConfig::default(),
//!     Peripherals {
//!         network: Wifi,
//!         session: Mqtt,
//!         store: MemoryStore::<16>::new(),
//!         platform: Board,
//!         rng: Rng,
//!     },
//! )
//! .with_discovery(r#"{"device":{"name":"Virgo"},"cmps":{"relay":{"p":"switch"}}}"#);
//!
//! core.init();
//! loop {
//!     core.tick();
//!     if core.became_ready() {
//!         core.publish_all();
//!         core.confirm_ready();
//!     }
//!     if core.on_change("Relay") {
//!         // drive the relay output
//!     }
//! }
//! ```
//!
//! ## Platform Support
//!
//! The crate only needs `core`. Hardware access goes through small traits:
//! [`network::NetworkInterface`], [`session::BrokerSession`],
//! [`storage::KeyValueStore`], [`config::ParameterStore`] and
//! [`system::Platform`].
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: `defmt::Format` implementations for public error and state types

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod error;

pub use error::Error;

/// Configuration: device parameters and core tuning.
pub mod config;

/// Discovery payload validation and topic.
pub mod discovery;

/// Entity descriptors, bridges and the registry.
///
/// An entity is one named value shared with the supervisor. This module
/// handles its text form, persistence and change detection.
pub mod entity;

/// Routing of inbound messages and gating of outbound ones.
pub mod mediator;

/// Link-layer attachment: driver contract and the network guard.
pub mod network;

/// Communication state machine and readiness signals.
pub mod orchestrator;

/// The polling core tying everything together.
pub mod runtime;

/// Broker session contract and the session guard.
pub mod session;

/// Key-value persistence for entity state.
pub mod storage;

/// Platform services and the provisioning trigger.
pub mod system;
