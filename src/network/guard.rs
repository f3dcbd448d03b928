use log::{debug, info, warn};
use rand_core::RngCore;

use super::backoff::{Backoff, elapsed};
use super::{LinkStatus, NetworkInterface};
use crate::config::{NetConfig, Timing};

/// Keeps the device attached to its network without blocking.
///
/// Poll it every tick. Each poll either observes an attached link, or decides
/// whether to scan, wait, reset the driver, or start a fresh attempt. All
/// timing is deadline-based against the `now` passed in, so a missed tick only
/// delays the next decision.
///
/// Policy, in order:
///
/// 1. Attached: clear the failure count and report `true`.
/// 2. A scan recently found the network missing: hold off for the scan throttle.
/// 3. After `scan_after_failures` failures, and at most once per scan throttle,
///    scan. Missing network: hold off. Found: clear the failure count.
/// 4. Skip while an attempt is in flight and younger than `attempt_spacing_ms`,
///    or while the backoff delay has not elapsed.
/// 5. Reset the driver if the last reset is older than `radio_reset_ms`.
/// 6. Start an attempt and grow the backoff.
#[derive(Debug, Clone)]
pub struct NetworkGuard {
    timing: Timing,
    backoff: Backoff,
    last_reset: Option<u64>,
    last_scan: Option<u64>,
    in_flight: bool,
    ssid_visible: bool,
    attached: bool,
}

impl NetworkGuard {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            backoff: Backoff::new(),
            last_reset: None,
            last_scan: None,
            in_flight: false,
            ssid_visible: true,
            attached: false,
        }
    }

    /// Runs one step of the attachment policy. Returns `true` when attached.
    pub fn poll<N: NetworkInterface, R: RngCore>(
        &mut self,
        iface: &mut N,
        net: &NetConfig,
        now: u64,
        rng: &mut R,
    ) -> bool {
        if iface.status() == LinkStatus::Connected {
            if !self.attached {
                info!("[NetGuard] attached to '{}'", net.ssid);
            }
            self.attached = true;
            self.in_flight = false;
            self.ssid_visible = true;
            self.backoff.reset();
            return true;
        }

        if self.attached {
            warn!("[NetGuard] link to '{}' lost", net.ssid);
            self.attached = false;
        }

        let since_scan = elapsed(self.last_scan, now);
        if !self.ssid_visible && since_scan < self.timing.scan_throttle_ms {
            return false;
        }

        if self.backoff.failures() >= self.timing.scan_after_failures
            && since_scan >= self.timing.scan_throttle_ms
        {
            self.last_scan = Some(now);
            match iface.scan() {
                Ok(visible) => match visible.iter().find(|ap| ap.ssid == net.ssid) {
                    Some(ap) => {
                        info!(
                            "[NetGuard] '{}' visible (rssi {} dBm, channel {}), retrying",
                            net.ssid, ap.rssi, ap.channel
                        );
                        self.ssid_visible = true;
                        self.backoff.reset();
                    }
                    None => {
                        warn!(
                            "[NetGuard] '{}' not among {} visible networks, holding off",
                            net.ssid,
                            visible.len()
                        );
                        self.ssid_visible = false;
                        return false;
                    }
                },
                Err(e) => warn!("[NetGuard] scan failed: {:?}", e),
            }
        }

        let since_attempt = self.backoff.since_attempt(now);
        if self.in_flight && since_attempt < self.timing.attempt_spacing_ms {
            return false;
        }
        if !self.backoff.elapsed(now) {
            return false;
        }

        if elapsed(self.last_reset, now) >= self.timing.radio_reset_ms {
            debug!("[NetGuard] resetting interface, hostname '{}'", net.device_id);
            if let Err(e) = iface.reset(&net.device_id) {
                warn!("[NetGuard] interface reset failed: {:?}", e);
            }
            self.last_reset = Some(now);
        }

        if let Err(e) = iface.begin(&net.ssid, &net.wifi_password) {
            warn!("[NetGuard] attach request failed: {:?}", e);
        }
        self.in_flight = true;
        let delay = self.backoff.record_attempt(now, &self.timing, rng);
        self.report(iface.status(), net, delay);
        false
    }

    /// `true` if the last poll observed an attached link.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Consecutive failed attempts since the last attach.
    pub fn failures(&self) -> u8 {
        self.backoff.failures()
    }

    /// Current backoff delay in milliseconds.
    pub fn delay_ms(&self) -> u64 {
        self.backoff.delay_ms()
    }

    /// Drops all timers and counters, as after a suspension during which the
    /// clock kept running.
    pub fn reset_timers(&mut self) {
        self.backoff.forget();
        self.last_reset = None;
        self.last_scan = None;
        self.in_flight = false;
        self.ssid_visible = true;
        self.attached = false;
    }

    fn report(&self, status: LinkStatus, net: &NetConfig, delay: u64) {
        let attempt = self.backoff.failures();
        match status {
            LinkStatus::NoNetwork => {
                warn!("[NetGuard] attempt {}: '{}' not found, next in {} ms", attempt, net.ssid, delay)
            }
            LinkStatus::ConnectFailed => {
                warn!("[NetGuard] attempt {}: authentication failed, next in {} ms", attempt, delay)
            }
            LinkStatus::ConnectionLost => {
                warn!("[NetGuard] attempt {}: connection lost, next in {} ms", attempt, delay)
            }
            LinkStatus::Disconnected => {
                debug!("[NetGuard] attempt {}: disconnected, next in {} ms", attempt, delay)
            }
            LinkStatus::Idle => debug!("[NetGuard] attempt {}: idle, next in {} ms", attempt, delay),
            LinkStatus::Connected => {}
        }
    }
}
