use log::{info, warn};

use crate::config::ParameterStore;
use crate::storage::KeyValueStore;

/// Store key of the force-provisioning flag.
pub const FORCE_KEY: &str = "force_prov";

/// What a button poll asks the caller to do.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ButtonEvent {
    /// Nothing to do.
    None,
    /// The button has been held long enough; provisioning is armed.
    Armed,
    /// Released after arming; restart into provisioning.
    Restart,
}

/// Long-press detector for a provisioning button.
///
/// Poll with the current pressed state. Holding for `hold_ms` arms once;
/// releasing after that asks for a restart. Each trigger needs a full
/// press and release.
#[derive(Debug, Clone)]
pub struct ProvisioningButton {
    hold_ms: u64,
    pressed_at: Option<u64>,
    armed: bool,
}

impl ProvisioningButton {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms,
            pressed_at: None,
            armed: false,
        }
    }

    pub fn poll(&mut self, pressed: bool, now: u64) -> ButtonEvent {
        match (pressed, self.pressed_at) {
            (true, None) => {
                self.pressed_at = Some(now);
                self.armed = false;
                ButtonEvent::None
            }
            (true, Some(since)) if !self.armed && now.saturating_sub(since) >= self.hold_ms => {
                self.armed = true;
                ButtonEvent::Armed
            }
            (false, Some(_)) => {
                self.pressed_at = None;
                if core::mem::take(&mut self.armed) {
                    ButtonEvent::Restart
                } else {
                    ButtonEvent::None
                }
            }
            _ => ButtonEvent::None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Reads the force-provisioning flag. A failing store reads as not set.
pub fn force_provisioning<S: KeyValueStore>(store: &mut S) -> bool {
    match store.get(FORCE_KEY) {
        Ok(Some(v)) => crate::entity::value::parse_bool(&v),
        Ok(None) => false,
        Err(e) => {
            warn!("[Provisioning] reading {} failed: {:?}", FORCE_KEY, e);
            false
        }
    }
}

/// Sets or clears the force-provisioning flag.
pub fn set_force_provisioning<S: KeyValueStore>(store: &mut S, enable: bool) {
    let result = if enable {
        store.put(FORCE_KEY, "true")
    } else {
        store.remove(FORCE_KEY)
    };
    match result {
        Ok(()) => info!("[Provisioning] force flag {}", if enable { "set" } else { "cleared" }),
        Err(e) => warn!("[Provisioning] writing {} failed: {:?}", FORCE_KEY, e),
    }
}

/// `true` when the device must stay in (or enter) provisioning: the critical
/// parameters are invalid or provisioning was forced.
pub fn needs_provisioning<P: ParameterStore + ?Sized, S: KeyValueStore>(params: &P, store: &mut S) -> bool {
    !params.is_critical_valid() || force_provisioning(store)
}
