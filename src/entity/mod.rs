//! # Entities
//!
//! An entity is a named, typed, topic-addressed piece of device state that a
//! remote supervisor can see and, depending on its kind, control. Entities
//! are declared in a static table of [`EntityDescriptor`]s; at startup the
//! [`Registry`] turns each descriptor into an [`EntityBridge`] that owns the
//! live value.
//!
//! ## Kinds
//!
//! | Kind        | Inbound          | Persisted | Change detection            |
//! |-------------|------------------|-----------|-----------------------------|
//! | `Control`   | applied + echoed | yes       | value vs. mirror            |
//! | `Indicator` | ignored          | no        | value vs. mirror            |
//! | `Button`    | applied          | no        | fires once, then clears     |
//! | `Internal`  | applied, even while flushing | no | value vs. mirror        |
//!
//! ## Example
//!
//! ```rust
//! use iotlink::entity::{EntityDescriptor, Kind, Registry};
//! use iotlink::mediator::Outbound;
//! use iotlink::storage::MemoryStore;
//!
//! struct Discard;
//! impl Outbound for Discard {
//!     fn publish(&mut self, _topic: &str, _payload: &str, _log: bool) {}
//! }
//!
//! static TABLE: [EntityDescriptor<'static>; 2] = [
//!     EntityDescriptor::new("Setpoint", Kind::Control)
//!         .topics("dev/setpoint/state", "dev/setpoint/set")
//!         .resolution("0.1")
//!         .default_value("19.0"),
//!     EntityDescriptor::new("Temperature", Kind::Indicator)
//!         .topics("dev/temperature/state", "")
//!         .resolution("0.01")
//!         .default_value("0"),
//! ];
//!
//! let mut store: MemoryStore<8> = MemoryStore::new();
//! let mut registry = Registry::from_table(&TABLE).unwrap();
//! registry.init_all(&mut store);
//!
//! let setpoint = registry.get_mut("Setpoint").unwrap();
//! setpoint.write_float(21.26, &mut store, &mut Discard);
//! assert_eq!(setpoint.read(), "21.3");
//! ```

pub mod bridge;
pub mod key;
pub mod registry;
pub mod value;


pub use bridge::EntityBridge;
pub use key::persistence_key;
pub use registry::Registry;

/// Maximum length of an entity value in bytes.
pub const VALUE_LEN: usize = crate::storage::VALUE_LEN;

/// Maximum number of entities in a [`Registry`].
pub const MAX_ENTITIES: usize = 32;

/// An entity value in its canonical text form.
pub type Value = heapless::String<VALUE_LEN>;

/// Behavior class of an entity.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Kind {
    /// Supervisor-controllable state that survives reboots.
    Control,
    /// Output-only state reported by the device.
    Indicator,
    /// Momentary trigger that fires once per received press.
    Button,
    /// Device-internal input such as supervisor status; never flushed.
    Internal,
}

impl Kind {
    /// Short upper-case label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            Kind::Control => "CONTROL",
            Kind::Indicator => "INDICATOR",
            Kind::Button => "BUTTON",
            Kind::Internal => "INTERNAL",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Kind {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.label())
    }
}

/// Immutable declaration of one entity.
///
/// Descriptors are meant to live in a `static` table. Empty topic strings
/// mean "no topic".
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct EntityDescriptor<'a> {
    /// Unique entity name; also the source of the persistence key.
    pub name: &'a str,
    /// Behavior class.
    pub kind: Kind,
    /// Topic the device publishes state to.
    pub topic_out: &'a str,
    /// Topic the device listens on.
    pub topic_in: &'a str,
    /// Resolution such as `"0.01"`; its fractional digit count sets the precision.
    pub resolution: &'a str,
    /// Default value in text form.
    pub default: &'a str,
}

impl<'a> EntityDescriptor<'a> {
    /// A descriptor with no topics, integer resolution and an empty default.
    pub const fn new(name: &'a str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            topic_out: "",
            topic_in: "",
            resolution: "1",
            default: "",
        }
    }

    /// Sets the outbound and inbound topics.
    pub const fn topics(mut self, topic_out: &'a str, topic_in: &'a str) -> Self {
        self.topic_out = topic_out;
        self.topic_in = topic_in;
        self
    }

    pub const fn resolution(mut self, resolution: &'a str) -> Self {
        self.resolution = resolution;
        self
    }

    pub const fn default_value(mut self, default: &'a str) -> Self {
        self.default = default;
        self
    }
}
