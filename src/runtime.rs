//! The polling core.
//!
//! [`Runtime`] owns the entity registry, both guards, the orchestrator and
//! the collaborators they drive. Call [`Runtime::tick`] once per scheduling
//! quantum; it never blocks. Each tick, in order:
//!
//! 1. kicks the watchdog (also while suspended),
//! 2. polls the network guard, then the session guard if attached,
//! 3. advances the orchestrator, announcing discovery and subscribing when a
//!    session has just opened,
//! 4. drains up to `inbound_budget` messages from the session into the
//!    registry, honoring the flush window,
//! 5. closes the flush window once its deadline has passed.
//!
//! The application reads [`became_ready`](Runtime::became_ready),
//! [`publish_allowed`](Runtime::publish_allowed) and
//! [`is_fully_ready`](Runtime::is_fully_ready), and reads or writes entities
//! through the runtime so that persistence and publishing stay consistent.

use log::{debug, info, warn};
use rand_core::RngCore;

use crate::config::{CoreConfig, NetConfig};
use crate::discovery;
use crate::entity::{EntityBridge, Registry};
use crate::mediator::{Mediator, Outbound};
use crate::network::{NetworkGuard, NetworkInterface};
use crate::orchestrator::{CommState, Orchestrator};
use crate::session::{BrokerSession, QoS, SessionGuard};
use crate::storage::KeyValueStore;
use crate::system::provisioning::{self, ButtonEvent, ProvisioningButton};
use crate::system::{Mode, Platform};

/// The collaborators a [`Runtime`] drives.
#[derive(Debug)]
pub struct Peripherals<N, B, S, P, R> {
    /// Link-layer driver.
    pub network: N,
    /// Broker client.
    pub session: B,
    /// Persistence for CONTROL entities.
    pub store: S,
    /// Clock, watchdog and reset.
    pub platform: P,
    /// Jitter source for retry backoff.
    pub rng: R,
}

/// Connection core and entity owner.
#[derive(Debug)]
pub struct Runtime<'a, N, B, S, P, R> {
    registry: Registry<'a>,
    net: NetConfig,
    config: CoreConfig<'a>,
    discovery: Option<&'a str>,
    iface: N,
    session: B,
    store: S,
    platform: P,
    rng: R,
    network_guard: NetworkGuard,
    session_guard: SessionGuard,
    orchestrator: Orchestrator,
    mode: Mode,
}

impl<'a, N, B, S, P, R> Runtime<'a, N, B, S, P, R>
where
    N: NetworkInterface,
    B: BrokerSession,
    S: KeyValueStore,
    P: Platform,
    R: RngCore,
{
    /// Assembles the core. Entities are not initialized yet; call
    /// [`init`](Self::init) before the first tick.
    pub fn new(
        registry: Registry<'a>,
        net: NetConfig,
        config: CoreConfig<'a>,
        parts: Peripherals<N, B, S, P, R>,
    ) -> Self {
        Self {
            network_guard: NetworkGuard::new(config.timing),
            session_guard: SessionGuard::new(&config),
            orchestrator: Orchestrator::new(config.timing.flush_window_ms),
            registry,
            net,
            config,
            discovery: None,
            iface: parts.network,
            session: parts.session,
            store: parts.store,
            platform: parts.platform,
            rng: parts.rng,
            mode: Mode::Active,
        }
    }

    /// Sets the discovery document announced on every new session.
    pub fn with_discovery(mut self, payload: &'a str) -> Self {
        self.discovery = Some(payload);
        self
    }

    /// Replaces the discovery document.
    pub fn set_discovery(&mut self, payload: Option<&'a str>) {
        self.discovery = payload;
    }

    /// Restores every entity from the store or its default and logs the table.
    pub fn init(&mut self) {
        self.registry.init_all(&mut self.store);
        self.registry.log_summary();
    }

    /// Runs one non-blocking step of the core.
    pub fn tick(&mut self) {
        self.platform.kick_watchdog();
        if self.mode == Mode::Suspended {
            return;
        }
        let now = self.platform.now_ms();

        let attached = self
            .network_guard
            .poll(&mut self.iface, &self.net, now, &mut self.rng);
        let session = attached
            && self
                .session_guard
                .poll(&mut self.session, &self.net, now, &mut self.rng);

        let step = self.orchestrator.step(attached, session);
        if step.attached {
            self.on_attached();
        }
        if step.announce {
            self.announce();
            self.orchestrator.announced(now);
        }

        if self.orchestrator.session_active() {
            self.pump(now);
        }
        self.orchestrator.settle(now);
    }

    /// `true` exactly once, on the tick the pipeline became ready.
    pub fn became_ready(&mut self) -> bool {
        self.orchestrator.became_ready()
    }

    /// `true` while outbound publications reach the broker.
    ///
    /// Requires an open session and, when configured, the supervisor-status
    /// entity reading true.
    pub fn publish_allowed(&self) -> bool {
        self.mode == Mode::Active && self.orchestrator.session_active() && self.supervisor_online()
    }

    /// Pipeline ready and confirmed with [`confirm_ready`](Self::confirm_ready).
    pub fn is_fully_ready(&self) -> bool {
        self.mode == Mode::Active && self.orchestrator.is_fully_ready()
    }

    /// Tells the core that the application has published its startup state.
    pub fn confirm_ready(&mut self) {
        self.orchestrator.confirm_ready();
    }

    pub fn state(&self) -> CommState {
        self.orchestrator.state()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Hands the network to an exclusive collaborator.
    ///
    /// The session is closed, the link is left up and polling stops until
    /// [`resume`](Self::resume). Only the watchdog keeps being serviced.
    pub fn suspend(&mut self) {
        if self.mode == Mode::Suspended {
            return;
        }
        info!("[Core] suspending broker activity");
        self.session_guard.disconnect(&mut self.session);
        self.orchestrator.restart();
        self.mode = Mode::Suspended;
    }

    /// Takes the network back after [`suspend`](Self::suspend).
    ///
    /// Retry timers restart from scratch and the session is rebuilt,
    /// including discovery and subscriptions.
    pub fn resume(&mut self) {
        if self.mode == Mode::Active {
            return;
        }
        info!("[Core] resuming");
        self.network_guard.reset_timers();
        self.session_guard.reset_timers();
        self.orchestrator.restart();
        self.mode = Mode::Active;
    }

    /// Closes the broker session only; the guard reopens it on a later tick.
    pub fn disconnect_session(&mut self) {
        self.session_guard.disconnect(&mut self.session);
    }

    /// Inbound entry point for transports that deliver by callback.
    ///
    /// Returns `true` if an entity consumed the message. Messages are dropped
    /// while suspended.
    pub fn dispatch_inbound(&mut self, topic: &str, payload: &str) -> bool {
        if self.mode == Mode::Suspended {
            debug!("[Core] suspended, dropping inbound on {}", topic);
            return false;
        }
        let now = self.platform.now_ms();
        let suppress = self.orchestrator.suppresses_inbound(now);
        let allowed = self.publish_allowed();
        let mut mediator = Mediator::new(&mut self.session, allowed, suppress)
            .with_delivery(self.config.state_qos, self.config.retain_states);
        mediator.route_inbound(&mut self.registry, &mut self.store, topic, payload)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityBridge<'a>> {
        self.registry.get(name)
    }

    pub fn registry(&self) -> &Registry<'a> {
        &self.registry
    }

    /// Current text value of an entity.
    pub fn read(&self, name: &str) -> Option<&str> {
        self.registry.get(name).map(|b| b.read())
    }

    /// Consumes a pending change of an entity. Unknown names report `false`.
    pub fn on_change(&mut self, name: &str) -> bool {
        self.registry.get_mut(name).is_some_and(|b| b.on_change())
    }

    /// Writes an entity's value. Returns `false` for unknown names.
    pub fn write(&mut self, name: &str, value: &str) -> bool {
        self.with_entity(name, |bridge, store, out| bridge.write(value, store, out))
    }

    pub fn write_float(&mut self, name: &str, value: f32) -> bool {
        self.with_entity(name, |bridge, store, out| bridge.write_float(value, store, out))
    }

    pub fn write_int(&mut self, name: &str, value: i32) -> bool {
        self.with_entity(name, |bridge, store, out| bridge.write_int(value, store, out))
    }

    pub fn write_bool(&mut self, name: &str, value: bool) -> bool {
        self.with_entity(name, |bridge, store, out| bridge.write_bool(value, store, out))
    }

    /// Publishes an entity's current value. Returns `false` for unknown names.
    pub fn publish_value(&mut self, name: &str) -> bool {
        self.with_entity(name, |bridge, _, out| bridge.publish_value(out))
    }

    /// Publishes every CONTROL entity's current value.
    pub fn publish_all(&mut self) {
        let allowed = self.publish_allowed();
        let mut mediator = Mediator::new(&mut self.session, allowed, false)
            .with_delivery(self.config.state_qos, self.config.retain_states);
        self.registry.publish_all(&mut mediator);
    }

    /// Wipes persisted values and clears every entity in memory.
    pub fn reset_all(&mut self) {
        self.registry.reset_all(&mut self.store);
    }

    /// Logs `msg` and mirrors it to the configured log topic when possible.
    pub fn log_book(&mut self, msg: &str) {
        info!("[LogBook] {}", msg);
        if let Some(topic) = self.config.log_topic {
            let allowed = self.publish_allowed();
            Mediator::new(&mut self.session, allowed, false).publish(topic, msg, false);
        }
    }

    /// Feeds the provisioning button state.
    ///
    /// A long press sets the force-provisioning flag; releasing afterwards
    /// reboots the device.
    pub fn poll_provisioning_button(&mut self, button: &mut ProvisioningButton, pressed: bool) -> ButtonEvent {
        let now = self.platform.now_ms();
        let event = button.poll(pressed, now);
        match event {
            ButtonEvent::Armed => {
                info!("[Core] long press, provisioning forced");
                provisioning::set_force_provisioning(&mut self.store, true);
            }
            ButtonEvent::Restart => {
                info!("[Core] button released, rebooting into provisioning");
                self.platform.reboot();
            }
            ButtonEvent::None => {}
        }
        event
    }

    /// Reboots through the platform.
    pub fn reboot(&mut self) {
        self.platform.reboot();
    }

    /// Mutable access to the persistence store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Mutable access to the broker client.
    pub fn session_mut(&mut self) -> &mut B {
        &mut self.session
    }

    /// Mutable access to the network driver.
    pub fn network_mut(&mut self) -> &mut N {
        &mut self.iface
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    fn with_entity<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnOnce(&mut EntityBridge<'a>, &mut S, &mut Mediator<'_, B>),
    {
        let allowed = self.publish_allowed();
        let Some(bridge) = self.registry.get_mut(name) else {
            warn!("[Core] no entity named '{}'", name);
            return false;
        };
        let mut mediator = Mediator::new(&mut self.session, allowed, false)
            .with_delivery(self.config.state_qos, self.config.retain_states);
        f(bridge, &mut self.store, &mut mediator);
        true
    }

    fn supervisor_online(&self) -> bool {
        match self.config.supervisor_status {
            Some(name) => self.registry.get(name).is_some_and(|b| b.read_bool()),
            None => true,
        }
    }

    fn on_attached(&mut self) {
        match self.iface.link_info() {
            Some(info) => info!(
                "[Core] link up: ip {}.{}.{}.{} rssi {} dBm channel {} bssid {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                info.ip[0],
                info.ip[1],
                info.ip[2],
                info.ip[3],
                info.rssi,
                info.channel,
                info.bssid[0],
                info.bssid[1],
                info.bssid[2],
                info.bssid[3],
                info.bssid[4],
                info.bssid[5]
            ),
            None => info!("[Core] link up"),
        }
        if let Err(e) = self.iface.announce_hostname(&self.net.device_id) {
            warn!("[Core] hostname announce failed: {:?}", e);
        }
    }

    fn announce(&mut self) {
        match discovery::prepare(self.discovery, self.config.discovery_prefix, &self.net.device_id) {
            Ok((payload, topic, count)) => {
                match self.session.publish(&topic, payload.as_bytes(), QoS::AtLeastOnce, true) {
                    Ok(()) => info!("[Core] discovery announced: {} components on {}", count, topic),
                    Err(e) => warn!("[Core] discovery publish failed: {:?}", e),
                }
            }
            Err(e) => warn!("[Core] discovery skipped: {:?}", e),
        }

        let mut subscribed = 0;
        for topic in self.registry.inbound_topics() {
            match self.session.subscribe(topic, QoS::AtMostOnce) {
                Ok(()) => subscribed += 1,
                Err(e) => warn!("[Core] subscribe to {} failed: {:?}", topic, e),
            }
        }
        info!("[Core] subscribed to {} topics", subscribed);
    }

    fn pump(&mut self, now: u64) {
        for _ in 0..self.config.inbound_budget {
            let msg = match self.session.poll() {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(e) => {
                    warn!("[Core] inbound poll failed: {:?}", e);
                    break;
                }
            };
            let Some(payload) = msg.payload_str() else {
                warn!("[Core] non-UTF-8 payload on {}, dropped", msg.topic);
                continue;
            };

            let suppress = self.orchestrator.suppresses_inbound(now);
            let allowed = self.publish_allowed();
            let mut mediator = Mediator::new(&mut self.session, allowed, suppress)
                .with_delivery(self.config.state_qos, self.config.retain_states);
            mediator.route_inbound(&mut self.registry, &mut self.store, &msg.topic, payload);
        }
    }
}
