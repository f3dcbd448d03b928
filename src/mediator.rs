//! Routing between the broker session and the entity registry.
//!
//! Inbound messages are offered to the registry with the current flush
//! suppression flag. Outbound values from entities go through the
//! [`Outbound`] sink, which the [`Mediator`] implements on top of a
//! [`BrokerSession`], holding them back while publishing is not allowed.

use log::{debug, info, warn};

use crate::entity::Registry;
use crate::session::{BrokerSession, QoS};
use crate::storage::KeyValueStore;

/// Destination for values published by entities.
pub trait Outbound {
    /// Publishes `payload` to `topic`. An empty topic is a no-op.
    /// `log` asks for the publication to be logged.
    fn publish(&mut self, topic: &str, payload: &str, log: bool);
}

impl<T: Outbound + ?Sized> Outbound for &mut T {
    fn publish(&mut self, topic: &str, payload: &str, log: bool) {
        T::publish(self, topic, payload, log)
    }
}

/// A short-lived view over the session used for one routing or publishing pass.
#[derive(Debug)]
pub struct Mediator<'s, B: BrokerSession> {
    session: &'s mut B,
    allowed: bool,
    suppress: bool,
    qos: QoS,
    retain: bool,
}

impl<'s, B: BrokerSession> Mediator<'s, B> {
    /// `allowed` gates every outbound publication; `suppress` is the flush
    /// window flag handed to entities on inbound routing.
    pub fn new(session: &'s mut B, allowed: bool, suppress: bool) -> Self {
        Self {
            session,
            allowed,
            suppress,
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }

    /// Sets the QoS and retain flag of state publications.
    pub fn with_delivery(mut self, qos: QoS, retain: bool) -> Self {
        self.qos = qos;
        self.retain = retain;
        self
    }

    /// Offers an inbound message to the registry.
    ///
    /// Returns `true` if an entity consumed it. Unclaimed messages are
    /// dropped; that includes messages held back by the flush window.
    pub fn route_inbound<S: KeyValueStore>(
        &mut self,
        registry: &mut Registry<'_>,
        store: &mut S,
        topic: &str,
        payload: &str,
    ) -> bool {
        let suppress = self.suppress;
        match registry.route_inbound(topic, payload, suppress, store, self) {
            Some(name) => {
                debug!("[Mediator] '{}' <- {} = '{}'", name, topic, payload);
                true
            }
            None if suppress => {
                debug!("[Mediator] flush window, ignored {} = '{}'", topic, payload);
                false
            }
            None => {
                debug!("[Mediator] no entity for {}, dropped", topic);
                false
            }
        }
    }
}

impl<B: BrokerSession> Outbound for Mediator<'_, B> {
    fn publish(&mut self, topic: &str, payload: &str, log: bool) {
        if topic.is_empty() {
            return;
        }
        if !self.allowed {
            debug!("[Mediator] not connected, held {} = '{}'", topic, payload);
            return;
        }
        match self.session.publish(topic, payload.as_bytes(), self.qos, self.retain) {
            Ok(()) if log => info!("[Mediator] {} -> '{}'", topic, payload),
            Ok(()) => {}
            Err(e) => warn!("[Mediator] publish to {} failed: {:?}", topic, e),
        }
    }
}
