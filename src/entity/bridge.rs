//! A single entity's state cell.

use core::fmt::Write as _;

use log::{debug, warn};

use super::key::{Key, persistence_key};
use super::value::{self, decimals_for, normalize};
use super::{EntityDescriptor, Kind, Value};
use crate::mediator::Outbound;
use crate::storage::KeyValueStore;

/// Runtime state of one entity.
///
/// A bridge pairs the immutable [`EntityDescriptor`] with the current value,
/// a mirror of the value last seen by [`on_change`](Self::on_change) or set by
/// a local write, the decimal precision derived from the resolution string,
/// and the persistence key.
///
/// Every operation that can publish takes the [`Outbound`] sink explicitly,
/// and every operation that can persist takes the store explicitly. Persistence
/// is best effort: a failing store is logged and the in-memory value stays
/// authoritative.
#[derive(Debug, Clone)]
pub struct EntityBridge<'a> {
    descriptor: EntityDescriptor<'a>,
    value: Value,
    mirror: Value,
    decimals: u8,
    key: Key,
    initialized: bool,
    log_writes: bool,
}

impl<'a> EntityBridge<'a> {
    /// Creates an uninitialized bridge for `descriptor`.
    pub fn new(descriptor: EntityDescriptor<'a>) -> Self {
        Self {
            decimals: decimals_for(descriptor.resolution),
            key: persistence_key(descriptor.name),
            descriptor,
            value: Value::new(),
            mirror: Value::new(),
            initialized: false,
            log_writes: true,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor<'a> {
        &self.descriptor
    }

    pub fn name(&self) -> &'a str {
        self.descriptor.name
    }

    pub fn kind(&self) -> Kind {
        self.descriptor.kind
    }

    /// Decimal places used when rendering numeric values.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// The derived persistence key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Enables or disables logging of this entity's outbound publications.
    pub fn set_log_writes(&mut self, enabled: bool) {
        self.log_writes = enabled;
    }

    pub fn log_writes(&self) -> bool {
        self.log_writes
    }

    /// Loads the starting value.
    ///
    /// CONTROL entities restore their persisted value. When nothing is stored,
    /// or the stored value is empty, the default is adopted and written back
    /// so the store matches memory. Other kinds always start from the default.
    /// Nothing is published.
    pub fn init<S: KeyValueStore>(&mut self, store: &mut S) {
        let start = if self.descriptor.kind == Kind::Control {
            match store.get(&self.key) {
                Ok(Some(saved)) if !saved.is_empty() => normalize(&saved, self.decimals),
                Ok(_) => {
                    let default = value::truncated(self.descriptor.default);
                    self.persist(store, &default);
                    default
                }
                Err(e) => {
                    warn!("[Bridge] {}: restore failed ({:?}), using default", self.name(), e);
                    value::truncated(self.descriptor.default)
                }
            }
        } else {
            value::truncated(self.descriptor.default)
        };

        self.mirror = start.clone();
        self.value = start;
        self.initialized = true;
        debug!("[Bridge] {} initialized to '{}'", self.name(), self.value);
    }

    /// Sets the value from local code.
    ///
    /// The value is normalized, mirrored, then persisted (CONTROL only) and
    /// published to the outbound topic.
    pub fn write<S: KeyValueStore, O: Outbound>(&mut self, raw: &str, store: &mut S, out: &mut O) {
        self.value = self.canonical(raw);
        self.mirror = self.value.clone();
        self.save_and_publish(store, out);
    }

    /// Writes a float rendered with this entity's precision.
    pub fn write_float<S: KeyValueStore, O: Outbound>(&mut self, v: f32, store: &mut S, out: &mut O) {
        let text = value::format_float(v, self.decimals);
        self.write(&text, store, out);
    }

    pub fn write_int<S: KeyValueStore, O: Outbound>(&mut self, v: i32, store: &mut S, out: &mut O) {
        let mut text = Value::new();
        let _ = write!(text, "{}", v);
        self.write(&text, store, out);
    }

    /// Writes `"ON"` or `"OFF"`.
    pub fn write_bool<S: KeyValueStore, O: Outbound>(&mut self, v: bool, store: &mut S, out: &mut O) {
        self.write(if v { "ON" } else { "OFF" }, store, out);
    }

    /// Current value as text.
    pub fn read(&self) -> &str {
        &self.value
    }

    pub fn read_int(&self) -> i32 {
        value::parse_int(&self.value)
    }

    pub fn read_float(&self) -> f32 {
        value::parse_float(&self.value)
    }

    pub fn read_bool(&self) -> bool {
        value::parse_bool(&self.value)
    }

    /// Consumes a pending change.
    ///
    /// BUTTON entities fire once per non-empty value and then clear. Other
    /// kinds fire when the value differs from the mirror, and the mirror then
    /// catches up. An empty value never fires.
    pub fn on_change(&mut self) -> bool {
        if self.value.is_empty() {
            return false;
        }
        if self.descriptor.kind == Kind::Button {
            self.value.clear();
            self.mirror.clear();
            return true;
        }
        if self.value != self.mirror {
            self.mirror = self.value.clone();
            return true;
        }
        false
    }

    /// Offers an inbound message to this entity.
    ///
    /// Returns `true` if the message was consumed. INDICATOR entities and
    /// entities without an inbound topic never consume. While `suppress` is
    /// set only INTERNAL entities consume; everything else reports `false` so
    /// replayed retained messages cause no side effects.
    pub fn handle_inbound<S: KeyValueStore, O: Outbound>(
        &mut self,
        topic: &str,
        payload: &str,
        suppress: bool,
        store: &mut S,
        out: &mut O,
    ) -> bool {
        if self.descriptor.topic_in.is_empty() || self.descriptor.kind == Kind::Indicator {
            return false;
        }
        if suppress && self.descriptor.kind != Kind::Internal {
            return false;
        }
        if topic != self.descriptor.topic_in {
            return false;
        }

        self.value = self.canonical(payload);
        if self.descriptor.kind == Kind::Control {
            self.save_and_publish(store, out);
        }
        true
    }

    /// Publishes the current value of a CONTROL entity.
    pub fn publish_value<O: Outbound>(&self, out: &mut O) {
        if self.descriptor.kind == Kind::Control {
            self.publish(out);
        }
    }

    /// Forgets the persisted value and clears memory.
    ///
    /// The next [`init`](Self::init) starts over from the default.
    pub fn reset<S: KeyValueStore>(&mut self, store: &mut S) {
        if self.descriptor.kind == Kind::Control {
            if let Err(e) = store.remove(&self.key) {
                warn!("[Bridge] {}: remove failed ({:?})", self.name(), e);
            }
        }
        self.value.clear();
        self.mirror.clear();
    }

    fn canonical(&self, raw: &str) -> Value {
        if raw.len() > super::VALUE_LEN {
            warn!("[Bridge] {}: value truncated to {} bytes", self.name(), super::VALUE_LEN);
        }
        normalize(raw, self.decimals)
    }

    fn save_and_publish<S: KeyValueStore, O: Outbound>(&self, store: &mut S, out: &mut O) {
        if self.descriptor.kind == Kind::Control {
            self.persist(store, &self.value);
        }
        self.publish(out);
    }

    fn persist<S: KeyValueStore>(&self, store: &mut S, v: &str) {
        if let Err(e) = store.put(&self.key, v) {
            warn!("[Bridge] {}: persist failed ({:?})", self.name(), e);
        }
    }

    fn publish<O: Outbound>(&self, out: &mut O) {
        out.publish(self.descriptor.topic_out, &self.value, self.log_writes);
    }
}
