//! System services the core relies on.
//!
//! The core never touches hardware directly. Time, the watchdog and reboot
//! come from a [`Platform`] implementation supplied by the firmware; the
//! provisioning trigger lives in [`provisioning`].
//!
//! ```rust
//! use iotlink::system::Platform;
//!
//! struct Board { millis: u64, kicks: u32 }
//!
//! impl Platform for Board {
//!     fn now_ms(&self) -> u64 { self.millis }
//!     fn kick_watchdog(&mut self) { self.kicks += 1; }
//!     fn reboot(&mut self) { /* hand over to the reset controller */ }
//! }
//! ```

/// Long-press provisioning trigger and the persisted force flag.
pub mod provisioning;

/// Board-level services: clock, watchdog and reset.
pub trait Platform {
    /// Monotonic milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Feeds the hardware watchdog. Called at the start of every tick.
    fn kick_watchdog(&mut self) {}

    /// Restarts the device.
    fn reboot(&mut self);
}

/// Whether the core is running or has ceded the network to an exclusive
/// collaborator such as a firmware upload.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    /// Normal polling.
    Active,
    /// Guards paused; only the watchdog is serviced.
    Suspended,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Mode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Mode::Active => defmt::write!(f, "Active"),
            Mode::Suspended => defmt::write!(f, "Suspended"),
        }
    }
}
