//! # Engine Error Types
//!
//! Why a session could not start, and rejected transitions.

use caldera_arena::ArenaError;
use thiserror::Error;

use crate::state::{SessionState, Trigger};

/// Reasons `Session::try_start` refuses to start.
///
/// Every variant leaves the session in `WAITING` with the pool unchanged.
#[derive(Error, Debug)]
pub enum StartError {
    /// A session is already running.
    #[error("session is {0}, not WAITING")]
    NotWaiting(SessionState),

    /// Too few players online.
    #[error("not enough players: {online} online, {required} required")]
    NotEnoughPlayers {
        /// Players online.
        online: usize,
        /// Configured minimum.
        required: usize,
    },

    /// No arena is available.
    #[error("no arenas available")]
    ResourceExhausted,

    /// The arena's world cannot be found or loaded.
    #[error("arena world not available: {0}")]
    WorldUnavailable(String),

    /// Any other pool failure.
    #[error(transparent)]
    Arena(ArenaError),
}

impl From<ArenaError> for StartError {
    fn from(err: ArenaError) -> Self {
        match err {
            ArenaError::ResourceExhausted => Self::ResourceExhausted,
            other => Self::Arena(other),
        }
    }
}

/// A trigger that is not valid in the current state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("transition rejected: {trigger:?} in {from}")]
pub struct TransitionError {
    /// State at the time of the trigger.
    pub from: SessionState,
    /// The rejected trigger.
    pub trigger: Trigger,
}
