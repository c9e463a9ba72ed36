//! # Session Events
//!
//! Everything a host may want to tell players about leaves the engine here.
//!
//! ## Flow
//! ```text
//! Session::tick ──emit──> EventBus ──recv──> host (chat, boss bar, sounds)
//! ```
//!
//! Emitting never blocks. When the channel is full the event is dropped;
//! the engine never waits on a slow consumer.

use caldera_arena::ProvisionReport;
use caldera_core::{ArenaId, PlayerId};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::trace;

/// Default bus capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Events emitted by a session.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Players were moved into an arena.
    SessionStarted {
        /// The arena.
        arena: ArenaId,
        /// Players in the roster.
        players: usize,
    },

    /// One second of the initial countdown.
    CountdownTick {
        /// Seconds left.
        remaining: u32,
        /// True at the last ten seconds and every ten seconds before.
        announce: bool,
    },

    /// The countdown display can be cleared.
    CountdownCleared,

    /// The hazard started rising.
    HazardRising {
        /// Level at the start.
        level: i32,
    },

    /// A hazard rise finished sweeping.
    HazardRaised {
        /// New level.
        level: i32,
        /// Cells turned into lava.
        converted: usize,
        /// Cells that could not be read or written.
        failures: usize,
    },

    /// The hazard reached the ceiling and stops rising.
    HazardPeaked {
        /// Final level.
        level: i32,
    },

    /// PvP damage is on.
    PvpEnabled,

    /// The boundary started shrinking.
    ShrinkStarted {
        /// Size the boundary shrinks to.
        target: f64,
        /// Length of the shrink.
        duration_secs: u32,
    },

    /// The boundary reached its final size.
    ContainmentSettled {
        /// Size at settlement.
        size: f64,
    },

    /// A player was eliminated.
    PlayerEliminated {
        /// The player.
        player: PlayerId,
        /// Players still alive.
        remaining: usize,
    },

    /// A player joined as spectator.
    SpectatorJoined {
        /// The player.
        player: PlayerId,
    },

    /// Last player standing.
    Winner {
        /// The player.
        player: PlayerId,
    },

    /// The session was torn down.
    SessionEnded,

    /// A provisioning run finished.
    ArenasProvisioned(ProvisionReport),
}

/// Announce the last ten seconds, and every multiple of ten before that.
#[inline]
#[must_use]
pub const fn should_announce(remaining: u32) -> bool {
    remaining <= 10 || remaining % 10 == 0
}

/// Bounded, non-blocking event channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: Sender<SessionEvent>,
    receiver: Receiver<SessionEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Emits an event. Dropped if the channel is full.
    pub fn emit(&self, event: SessionEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event) | TrySendError::Disconnected(event)) => {
                trace!(?event, "Event dropped");
            }
        }
    }

    /// A receiving handle. All handles share one queue.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.receiver.clone()
    }

    /// Removes and returns every queued event.
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
