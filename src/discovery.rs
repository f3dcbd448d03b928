//! Device discovery announcement.
//!
//! The supervisor learns about the device and its entities from a single
//! JSON document published retained to `<prefix>/device/<device_id>/config`:
//!
//! ```json
//! {
//!   "device": { "identifiers": ["virgo-01"], "name": "Virgo" },
//!   "o": { "name": "virgo-fw" },
//!   "cmps": {
//!     "relay": {
//!       "p": "switch",
//!       "name": "Relay",
//!       "unique_id": "virgo-01-relay",
//!       "stat_t": "virgo/relay/state",
//!       "cmd_t": "virgo/relay/set"
//!     }
//!   }
//! }
//! ```
//!
//! Only the structure is checked here: `device` must be an object and `cmps`
//! a non-empty object. The content of components is the supervisor's concern.

use core::fmt;
use core::fmt::Write as _;

use heapless::String;
use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};

use crate::session::TOPIC_LEN;

/// Why a discovery payload was not announced.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DiscoveryError {
    /// No payload was supplied.
    Missing,
    /// Not a JSON object, or `device`/`cmps` is not an object.
    Malformed,
    /// The `device` object is absent.
    MissingDevice,
    /// The `cmps` object is absent.
    MissingComponents,
    /// The `cmps` object has no entries.
    NoComponents,
    /// The topic does not fit its buffer.
    TopicTooLong,
}

#[cfg(feature = "defmt")]
impl defmt::Format for DiscoveryError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DiscoveryError::Missing => defmt::write!(f, "Missing"),
            DiscoveryError::Malformed => defmt::write!(f, "Malformed"),
            DiscoveryError::MissingDevice => defmt::write!(f, "MissingDevice"),
            DiscoveryError::MissingComponents => defmt::write!(f, "MissingComponents"),
            DiscoveryError::NoComponents => defmt::write!(f, "NoComponents"),
            DiscoveryError::TopicTooLong => defmt::write!(f, "TopicTooLong"),
        }
    }
}

/// A JSON object whose members are counted and otherwise ignored.
struct Object {
    members: usize,
}

impl<'de> Deserialize<'de> for Object {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountMembers;

        impl<'de> Visitor<'de> for CountMembers {
            type Value = Object;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Object, A::Error> {
                let mut members = 0;
                while map.next_key::<&'de str>()?.is_some() {
                    map.next_value::<IgnoredAny>()?;
                    members += 1;
                }
                Ok(Object { members })
            }
        }

        deserializer.deserialize_map(CountMembers)
    }
}

#[derive(serde::Deserialize)]
struct Announcement {
    device: Option<Object>,
    cmps: Option<Object>,
}

/// Checks the structure of a discovery payload.
///
/// Returns the number of components on success.
pub fn validate(payload: &str) -> Result<usize, DiscoveryError> {
    if payload.trim().is_empty() {
        return Err(DiscoveryError::Missing);
    }
    let (doc, _) = serde_json_core::from_str::<Announcement>(payload)
        .map_err(|_| DiscoveryError::Malformed)?;
    doc.device.ok_or(DiscoveryError::MissingDevice)?;
    let cmps = doc.cmps.ok_or(DiscoveryError::MissingComponents)?;
    if cmps.members == 0 {
        return Err(DiscoveryError::NoComponents);
    }
    Ok(cmps.members)
}

/// Builds `<prefix>/device/<device_id>/config`.
pub fn topic(prefix: &str, device_id: &str) -> Result<String<TOPIC_LEN>, DiscoveryError> {
    let mut topic = String::new();
    write!(topic, "{}/device/{}/config", prefix, device_id)
        .map_err(|_| DiscoveryError::TopicTooLong)?;
    Ok(topic)
}

/// Validates `payload` and builds its topic in one step.
///
/// Returns the payload, its topic and the component count, or
/// [`Error::Discovery`](crate::Error::Discovery) naming the failed check.
pub fn prepare<'p>(
    payload: Option<&'p str>,
    prefix: &str,
    device_id: &str,
) -> Result<(&'p str, String<TOPIC_LEN>, usize), crate::Error> {
    let payload = payload.ok_or(DiscoveryError::Missing)?;
    let count = validate(payload)?;
    Ok((payload, topic(prefix, device_id)?, count))
}
