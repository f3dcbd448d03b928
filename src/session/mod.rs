//! Broker session contract
//!
//! The core does not implement a publish/subscribe protocol. It drives any
//! client that implements [`BrokerSession`]: one-time option binding, a
//! non-blocking connect, publish, subscribe and a polled inbound queue.
//!
//! # Example
//!
//! ```rust
//! use iotlink::session::{BrokerSession, Credentials, InboundMessage, QoS, SessionOptions};
//!
//! #[derive(Default)]
//! struct Loopback {
//!     connected: bool,
//!     queue: heapless::Deque<InboundMessage, 4>,
//! }
//!
//! impl BrokerSession for Loopback {
//!     type Error = ();
//!     fn configure(&mut self, _o: &SessionOptions<'_>) -> Result<(), ()> { Ok(()) }
//!     fn is_connected(&mut self) -> bool { self.connected }
//!     fn connect(&mut self, _c: &Credentials<'_>) -> Result<(), ()> {
//!         self.connected = true;
//!         Ok(())
//!     }
//!     fn disconnect(&mut self) -> Result<(), ()> {
//!         self.connected = false;
//!         Ok(())
//!     }
//!     fn publish(&mut self, topic: &str, payload: &[u8], _q: QoS, _r: bool) -> Result<(), ()> {
//!         let msg = InboundMessage::new(topic, payload).ok_or(())?;
//!         self.queue.push_back(msg).map_err(|_| ())
//!     }
//!     fn subscribe(&mut self, _t: &str, _q: QoS) -> Result<(), ()> { Ok(()) }
//!     fn poll(&mut self) -> Result<Option<InboundMessage>, ()> { Ok(self.queue.pop_front()) }
//! }
//!
//! let mut session = Loopback::default();
//! session.publish("a/b", b"1", QoS::AtMostOnce, false).unwrap();
//! let msg = session.poll().unwrap().unwrap();
//! assert_eq!(msg.topic.as_str(), "a/b");
//! assert_eq!(msg.payload_str(), Some("1"));
//! ```

#![allow(missing_docs)]
#![deny(unsafe_code)]

use heapless::{String, Vec};

/// Non-blocking session state machine
pub mod guard;

pub use guard::SessionGuard;

/// Maximum topic length in bytes.
pub const TOPIC_LEN: usize = 128;

/// Maximum inbound payload length in bytes.
pub const PAYLOAD_LEN: usize = 512;

/// Delivery guarantee requested for a publish or subscription.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// Fire and forget.
    AtMostOnce = 0,
    /// Acknowledged delivery, duplicates possible.
    AtLeastOnce = 1,
    /// Assured single delivery.
    ExactlyOnce = 2,
}

/// An inbound publish taken from the broker.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InboundMessage {
    pub topic: String<TOPIC_LEN>,
    pub payload: Vec<u8, PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Copies `topic` and `payload`, or returns `None` if either is too long.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        Some(Self {
            topic: String::try_from(topic).ok()?,
            payload: Vec::from_slice(payload).ok()?,
        })
    }

    /// The payload as UTF-8 text, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}

/// Options bound to the client once, before the first connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions<'a> {
    pub host: &'a str,
    pub port: u16,
    pub keep_alive_secs: u16,
    pub clean_session: bool,
}

/// Identity presented on connect.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub client_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

impl core::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Client-side operations needed by [`SessionGuard`] and the core.
///
/// `connect` either opens the session before returning or starts an
/// asynchronous open and returns `Ok` while it is pending. It must not block
/// for long. [`is_connected`](Self::is_connected) is what the core trusts; a
/// pending open is given `attempt_spacing_ms` before the guard tries again.
pub trait BrokerSession {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Binds endpoint and session options. Called once.
    fn configure(&mut self, options: &SessionOptions<'_>) -> Result<(), Self::Error>;

    /// `true` while a session is open.
    fn is_connected(&mut self) -> bool;

    /// Opens a session, or starts opening one.
    fn connect(&mut self, credentials: &Credentials<'_>) -> Result<(), Self::Error>;

    /// Closes the session, leaving the network link alone.
    fn disconnect(&mut self) -> Result<(), Self::Error>;

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> Result<(), Self::Error>;

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), Self::Error>;

    /// Takes the next received message, if any. Must not block.
    fn poll(&mut self) -> Result<Option<InboundMessage>, Self::Error>;
}

#[cfg(feature = "defmt")]
impl defmt::Format for QoS {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "QoS{=u8}", *self as u8)
    }
}
