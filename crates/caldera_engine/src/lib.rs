//! # CALDERA Engine - Session Orchestration
//!
//! Runs one rising-lava elimination game at a time.
//!
//! ## Architecture
//!
//! - **Session**: the state machine; owns roster, engines, pool and world
//! - **Scheduler**: one-shot and periodic tasks, gated on the session running
//! - **Hazard**: monotonic lava level, swept in 16x16 blocks
//! - **Containment**: delayed, timed boundary shrink
//! - **Roster**: alive / spectator partition and win detection
//! - **TickLoop**: wall-clock driver for hosts without their own scheduler
//!
//! ## Threading Model
//!
//! ```text
//! scheduling thread                      other threads
//! ┌──────────────────────────┐
//! │ Session::tick()          │ ──events──> EventBus receivers
//! │  world, pool, tasks      │ ──publish─> StatusBoard readers
//! │  <── candidates ─────────┼──────────── provisioning worker
//! └──────────────────────────┘
//! ```
//!
//! Session state is only ever mutated inside `Session::tick` and the public
//! `Session` operations, all on the scheduling thread.
//!
//! ## Example
//!
//! ```rust,ignore
//! use caldera_engine::{Session, TickLoop};
//!
//! let mut session = Session::open(config, world)?;
//! session.start();
//! TickLoop::new(20).run_while(|_| {
//!     session.tick();
//!     session.state().is_running()
//! });
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod containment;
pub mod error;
pub mod events;
pub mod hazard;
pub mod roster;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod status;
pub mod tick;

// Re-exports for convenience
pub use containment::{ContainmentEngine, ContainmentPoll, SETTLE_TOLERANCE};
pub use error::{StartError, TransitionError};
pub use events::{should_announce, EventBus, SessionEvent, DEFAULT_EVENT_CAPACITY};
pub use hazard::{HazardEngine, HazardRaise};
pub use roster::{Elimination, Roster};
pub use scheduler::{
    Countdown, CountdownListener, Gate, Scheduler, Task, TaskControl, TaskHandle,
};
pub use session::Session;
pub use state::{next_state, SessionState, Trigger};
pub use status::{StatusBoard, StatusSnapshot};
pub use tick::{TickLoop, TickStats};
