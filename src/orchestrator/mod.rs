#![deny(unsafe_code)]

//! # Communication orchestrator
//!
//! Sequences the path from a cold device to a fully synchronized one:
//!
//! ```text
//! Disconnected ─► Attaching ─► SessionPending ─► Announcing ─► Flushing ─► Ready
//!       ▲              ▲               ▲                                      │
//!       └── resume ────┴─ link lost ───┴──────── session lost ────────────────┘
//! ```
//!
//! * `Attaching`: the network guard has no link yet.
//! * `SessionPending`: linked, waiting for the broker session.
//! * `Announcing`: the session just opened; the owner publishes discovery and
//!   subscribes, then reports back with [`Orchestrator::announced`].
//! * `Flushing`: retained messages replayed after subscribing are ignored for
//!   non-internal entities until the deadline passes.
//! * `Ready`: the pipeline is complete.
//!
//! The state is an explicit enum and every transition is a pure function of
//! the current state and the observed inputs, see [`CommState::on_link`],
//! [`CommState::on_announced`] and [`CommState::on_clock`]. The
//! [`Orchestrator`] wraps the state with the readiness signals exposed to the
//! application.

use log::{debug, info, warn};

#[cfg(test)]
mod tests;

/// Where the device stands on the way to a synchronized session.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommState {
    /// Nothing attempted yet, or restarted after a suspension.
    Disconnected,
    /// Waiting for the network link.
    Attaching,
    /// Linked, waiting for a broker session.
    SessionPending,
    /// Session just opened; discovery and subscriptions are due.
    Announcing,
    /// Retained replay window, open until `until` (ms).
    Flushing { until: u64 },
    /// Fully synchronized.
    Ready,
}

impl CommState {
    /// Applies the link observations of this tick.
    ///
    /// A lost link or session always wins. A session seen from any of the
    /// pre-session states moves to `Announcing`. Later states are kept.
    pub fn on_link(self, attached: bool, session: bool) -> CommState {
        if !attached {
            return CommState::Attaching;
        }
        if !session {
            return CommState::SessionPending;
        }
        match self {
            CommState::Disconnected | CommState::Attaching | CommState::SessionPending => {
                CommState::Announcing
            }
            other => other,
        }
    }

    /// Opens the flush window once the announcement has been made.
    pub fn on_announced(self, now: u64, window_ms: u64) -> CommState {
        match self {
            CommState::Announcing => CommState::Flushing {
                until: now.saturating_add(window_ms),
            },
            other => other,
        }
    }

    /// Closes the flush window once its deadline has passed.
    pub fn on_clock(self, now: u64) -> CommState {
        match self {
            CommState::Flushing { until } if now >= until => CommState::Ready,
            other => other,
        }
    }

    /// `true` from the moment the session opens.
    pub fn session_active(self) -> bool {
        matches!(
            self,
            CommState::Announcing | CommState::Flushing { .. } | CommState::Ready
        )
    }

    /// `true` while inbound messages must be held back from non-internal entities.
    pub fn suppresses_inbound(self, now: u64) -> bool {
        matches!(self, CommState::Flushing { until } if now < until)
    }

    fn is_linked(self) -> bool {
        !matches!(self, CommState::Disconnected | CommState::Attaching)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CommState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            CommState::Disconnected => defmt::write!(f, "Disconnected"),
            CommState::Attaching => defmt::write!(f, "Attaching"),
            CommState::SessionPending => defmt::write!(f, "SessionPending"),
            CommState::Announcing => defmt::write!(f, "Announcing"),
            CommState::Flushing { until } => defmt::write!(f, "Flushing(until={=u64})", until),
            CommState::Ready => defmt::write!(f, "Ready"),
        }
    }
}

/// Work the owner must do after [`Orchestrator::step`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Step {
    /// The network link just came up.
    pub attached: bool,
    /// The session just opened: publish discovery, subscribe, then call
    /// [`Orchestrator::announced`].
    pub announce: bool,
}

/// Communication state plus the readiness signals built on it.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    state: CommState,
    flush_window_ms: u64,
    ready_edge: bool,
    confirmed: bool,
}

impl Orchestrator {
    pub fn new(flush_window_ms: u64) -> Self {
        Self {
            state: CommState::Disconnected,
            flush_window_ms,
            ready_edge: false,
            confirmed: false,
        }
    }

    pub fn state(&self) -> CommState {
        self.state
    }

    /// Feeds this tick's link observations.
    ///
    /// Clears any unconsumed ready edge from the previous tick.
    pub fn step(&mut self, attached: bool, session: bool) -> Step {
        self.ready_edge = false;
        let prev = self.state;
        let next = prev.on_link(attached, session);
        if next == prev {
            return Step::default();
        }

        if prev.session_active() && !next.session_active() {
            warn!("[Core] session dropped in {:?}", prev);
            self.confirmed = false;
        }
        debug!("[Core] {:?} -> {:?}", prev, next);
        self.state = next;

        Step {
            attached: !prev.is_linked() && next.is_linked(),
            announce: next == CommState::Announcing,
        }
    }

    /// Reports the announcement as done and opens the flush window.
    pub fn announced(&mut self, now: u64) {
        let next = self.state.on_announced(now, self.flush_window_ms);
        if next != self.state {
            debug!("[Core] flushing retained messages for {} ms", self.flush_window_ms);
            self.state = next;
        }
    }

    /// Advances time-driven transitions; called after inbound handling.
    pub fn settle(&mut self, now: u64) {
        let next = self.state.on_clock(now);
        if next != self.state {
            info!("[Core] communication ready");
            self.state = next;
            self.ready_edge = true;
        }
    }

    /// `true` once, on the tick the pipeline became ready.
    pub fn became_ready(&mut self) -> bool {
        core::mem::take(&mut self.ready_edge)
    }

    pub fn session_active(&self) -> bool {
        self.state.session_active()
    }

    pub fn suppresses_inbound(&self, now: u64) -> bool {
        self.state.suppresses_inbound(now)
    }

    /// Records that the application has published its startup state.
    pub fn confirm_ready(&mut self) {
        if self.state == CommState::Ready && !self.confirmed {
            info!("[Core] application ready");
        }
        self.confirmed = true;
    }

    /// Pipeline ready and confirmed by the application.
    pub fn is_fully_ready(&self) -> bool {
        self.state == CommState::Ready && self.confirmed
    }

    /// Starts over from `Disconnected`, as after a suspension.
    pub fn restart(&mut self) {
        self.state = CommState::Disconnected;
        self.ready_edge = false;
        self.confirmed = false;
    }
}
