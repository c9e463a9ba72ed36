//! # Status Board
//!
//! The only session state readable from other threads.
//!
//! The status task publishes a fresh snapshot every `status.update_interval`
//! ticks; readers clone it out from under a read lock.

use std::sync::Arc;

use caldera_core::ArenaId;
use parking_lot::RwLock;

use crate::state::SessionState;

/// Point-in-time view of the session (the sidebar contents).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusSnapshot {
    /// Session state.
    pub state: SessionState,
    /// Arena in use, if any.
    pub arena: Option<ArenaId>,
    /// Players alive.
    pub alive: usize,
    /// Spectators.
    pub spectators: usize,
    /// Current hazard level.
    pub hazard_level: i32,
    /// Seconds since the session started.
    pub elapsed_secs: u64,
    /// PvP damage on.
    pub pvp: bool,
    /// Boundary size.
    pub border_size: f64,
}

impl StatusSnapshot {
    /// Elapsed time as `mm:ss`.
    #[must_use]
    pub fn elapsed_clock(&self) -> String {
        format!("{:02}:{:02}", self.elapsed_secs / 60, self.elapsed_secs % 60)
    }
}

/// Shared, read-mostly status handle. Cloning shares the same board.
#[derive(Clone, Debug, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl StatusBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot.
    pub fn publish(&self, snapshot: StatusSnapshot) {
        *self.inner.write() = snapshot;
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_is_shared() {
        let board = StatusBoard::new();
        let reader = board.clone();

        board.publish(StatusSnapshot {
            state: SessionState::Active,
            alive: 3,
            elapsed_secs: 125,
            ..StatusSnapshot::default()
        });

        let seen = std::thread::spawn(move || reader.snapshot()).join().unwrap();
        assert_eq!(seen.state, SessionState::Active);
        assert_eq!(seen.alive, 3);
        assert_eq!(seen.elapsed_clock(), "02:05");
    }
}
