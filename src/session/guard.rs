use log::{debug, info, warn};
use rand_core::RngCore;

use super::{BrokerSession, Credentials, SessionOptions};
use crate::config::{CoreConfig, NetConfig, Timing};
use crate::network::Backoff;

/// Keeps a broker session open without blocking.
///
/// Only poll it while the network is attached. The first poll binds the
/// endpoint and session options; later polls observe the session or, once
/// the backoff allows, try to open one. A successful connect still reports
/// `false` for that tick: the caller sees the session on the next poll and
/// performs its post-connect work there.
///
/// An accepted connect that has not produced a session yet is left alone
/// for `attempt_spacing_ms` before the next attempt. A failing `configure`
/// is retried on the same backoff as a failing connect.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    timing: Timing,
    keep_alive_secs: u16,
    clean_session: bool,
    backoff: Backoff,
    configured: bool,
    was_connected: bool,
    in_flight: bool,
}

impl SessionGuard {
    pub fn new(config: &CoreConfig<'_>) -> Self {
        Self {
            timing: config.timing,
            keep_alive_secs: config.keep_alive_secs,
            clean_session: config.clean_session,
            backoff: Backoff::new(),
            configured: false,
            was_connected: false,
            in_flight: false,
        }
    }

    /// Runs one step of the session policy. Returns `true` while a session is open.
    pub fn poll<B: BrokerSession, R: RngCore>(
        &mut self,
        session: &mut B,
        net: &NetConfig,
        now: u64,
        rng: &mut R,
    ) -> bool {
        if !self.configured {
            if !self.backoff.elapsed(now) {
                return false;
            }
            let options = SessionOptions {
                host: &net.broker_host,
                port: net.broker_port,
                keep_alive_secs: self.keep_alive_secs,
                clean_session: self.clean_session,
            };
            if let Err(e) = session.configure(&options) {
                let delay = self.backoff.record_attempt(now, &self.timing, rng);
                warn!(
                    "[SessionGuard] configuring {}:{} failed: {:?}, next in {} ms",
                    net.broker_host, net.broker_port, e, delay
                );
                return false;
            }
            self.backoff.reset();
            debug!(
                "[SessionGuard] bound to {}:{} (keep-alive {} s)",
                net.broker_host, net.broker_port, self.keep_alive_secs
            );
            self.configured = true;
        }

        if session.is_connected() {
            if !self.was_connected {
                info!("[SessionGuard] session open as '{}'", net.device_id);
                self.was_connected = true;
            }
            self.in_flight = false;
            self.backoff.reset();
            return true;
        }

        if self.was_connected {
            warn!("[SessionGuard] session lost");
            self.was_connected = false;
        }

        if self.in_flight && self.backoff.since_attempt(now) < self.timing.attempt_spacing_ms {
            return false;
        }
        if !self.backoff.elapsed(now) {
            return false;
        }

        let credentials = Credentials {
            client_id: &net.device_id,
            username: &net.username,
            password: &net.password,
        };
        match session.connect(&credentials) {
            Ok(()) => {
                debug!("[SessionGuard] connect accepted, awaiting session");
                self.backoff.reset();
                self.backoff.mark_attempt(now);
                self.in_flight = true;
            }
            Err(e) => {
                self.in_flight = false;
                let delay = self.backoff.record_attempt(now, &self.timing, rng);
                warn!(
                    "[SessionGuard] connect attempt {} failed: {:?}, next in {} ms",
                    self.backoff.failures(),
                    e,
                    delay
                );
            }
        }
        false
    }

    /// Closes the session without touching the network link.
    pub fn disconnect<B: BrokerSession>(&mut self, session: &mut B) {
        if let Err(e) = session.disconnect() {
            warn!("[SessionGuard] disconnect failed: {:?}", e);
        }
        if self.was_connected {
            info!("[SessionGuard] session closed");
        }
        self.was_connected = false;
        self.in_flight = false;
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn failures(&self) -> u8 {
        self.backoff.failures()
    }

    pub fn delay_ms(&self) -> u64 {
        self.backoff.delay_ms()
    }

    /// Drops retry timers and counters. Endpoint binding is kept.
    pub fn reset_timers(&mut self) {
        self.backoff.forget();
        self.was_connected = false;
        self.in_flight = false;
    }
}
