//! Ordered collection of entity bridges.

use heapless::Vec;
use log::{debug, info};

use super::{EntityBridge, EntityDescriptor, Kind, MAX_ENTITIES, VALUE_LEN};
use crate::error::Error;
use crate::mediator::Outbound;
use crate::session::TOPIC_LEN;
use crate::storage::KeyValueStore;

/// All entities of the device, in table order.
///
/// Lookup by name is linear; tables hold tens of entries at most.
#[derive(Debug, Default)]
pub struct Registry<'a> {
    bridges: Vec<EntityBridge<'a>, MAX_ENTITIES>,
}

impl<'a> Registry<'a> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { bridges: Vec::new() }
    }

    /// Builds a registry with one bridge per descriptor, keeping table order.
    pub fn from_table(table: &[EntityDescriptor<'a>]) -> Result<Self, Error> {
        let mut registry = Self::new();
        for descriptor in table {
            registry.register(*descriptor)?;
        }
        Ok(registry)
    }

    /// Appends one entity.
    ///
    /// Rejects empty or duplicate names, a second owner for an inbound topic,
    /// a persistence key already used by another CONTROL entity, and fields
    /// that exceed their buffers.
    pub fn register(&mut self, descriptor: EntityDescriptor<'a>) -> Result<(), Error> {
        if descriptor.name.is_empty() {
            return Err(Error::EmptyName);
        }
        if descriptor.topic_in.len() > TOPIC_LEN
            || descriptor.topic_out.len() > TOPIC_LEN
            || descriptor.default.len() > VALUE_LEN
        {
            return Err(Error::Capacity);
        }

        let bridge = EntityBridge::new(descriptor);
        for existing in &self.bridges {
            let other = existing.descriptor();
            if other.name == descriptor.name {
                return Err(Error::DuplicateName);
            }
            if !descriptor.topic_in.is_empty() && other.topic_in == descriptor.topic_in {
                return Err(Error::DuplicateTopic);
            }
            if descriptor.kind == Kind::Control
                && other.kind == Kind::Control
                && existing.key() == bridge.key()
            {
                return Err(Error::KeyCollision);
            }
        }

        self.bridges.push(bridge).map_err(|_| Error::RegistryFull)
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityBridge<'a>> {
        self.bridges.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EntityBridge<'a>> {
        self.bridges.iter_mut()
    }

    /// Finds an entity by name.
    pub fn get(&self, name: &str) -> Option<&EntityBridge<'a>> {
        self.bridges.iter().find(|b| b.name() == name)
    }

    /// Finds an entity by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut EntityBridge<'a>> {
        self.bridges.iter_mut().find(|b| b.name() == name)
    }

    /// Initializes every entity from the store or its default.
    pub fn init_all<S: KeyValueStore>(&mut self, store: &mut S) {
        for bridge in self.bridges.iter_mut() {
            bridge.init(store);
        }
        info!("[Core] {} entities initialized", self.bridges.len());
    }

    /// Resets every entity, wiping persisted CONTROL values.
    pub fn reset_all<S: KeyValueStore>(&mut self, store: &mut S) {
        for bridge in self.bridges.iter_mut() {
            bridge.reset(store);
        }
        info!("[Core] all entities reset");
    }

    /// Publishes the current value of every CONTROL entity.
    pub fn publish_all<O: Outbound>(&self, out: &mut O) {
        for bridge in self.bridges.iter() {
            bridge.publish_value(out);
        }
    }

    /// Offers an inbound message to each entity in order.
    ///
    /// Returns the name of the entity that consumed it, if any.
    pub fn route_inbound<S: KeyValueStore, O: Outbound>(
        &mut self,
        topic: &str,
        payload: &str,
        suppress: bool,
        store: &mut S,
        out: &mut O,
    ) -> Option<&'a str> {
        for bridge in self.bridges.iter_mut() {
            if bridge.handle_inbound(topic, payload, suppress, store, out) {
                return Some(bridge.name());
            }
        }
        None
    }

    /// Inbound topics that some entity can consume.
    pub fn inbound_topics(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.bridges
            .iter()
            .map(|b| *b.descriptor())
            .filter(|d| !d.topic_in.is_empty() && d.kind != Kind::Indicator)
            .map(|d| d.topic_in)
    }

    /// Logs one line per entity.
    pub fn log_summary(&self) {
        info!("[Core] ---- {} entities ----", self.bridges.len());
        for b in self.bridges.iter() {
            let d = b.descriptor();
            info!(
                "[Core] {:<9} {:<24} key={:<15} out='{}' in='{}' value='{}'",
                d.kind.label(),
                d.name,
                b.key(),
                d.topic_out,
                d.topic_in,
                b.read()
            );
        }
        debug!("[Core] ---- end of entities ----");
    }
}
