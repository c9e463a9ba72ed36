//! # CALDERA
//!
//! Rising-lava, last-player-standing minigame engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        caldera_engine                        │
//! │  Session ── Scheduler ── Hazard ── Containment ── Roster     │
//! └──────────────┬───────────────────────────────┬───────────────┘
//!                │                               │
//!        ┌───────▼────────┐              ┌───────▼────────┐
//!        │ caldera_arena  │              │  WorldService  │<── host backend
//!        │ pool, registry │─────────────>│ (caldera_core) │    or caldera_world
//!        └────────────────┘              └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `common`: shared types, configuration, the world seam
//! - `world`: in-memory world backend
//! - `arena`: arena pool and registry
//! - `engine`: the session and everything it drives

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub use caldera_arena as arena;
pub use caldera_core as common;
pub use caldera_engine as engine;
pub use caldera_world as world;

// Re-export commonly used types
pub use caldera_arena::{ArenaPool, PoolSettings, ProvisionReport};
pub use caldera_core::{Arena, ArenaId, GameConfig, Location, PlayerId, WorldService};
pub use caldera_engine::{Session, SessionEvent, SessionState, StatusSnapshot, TickLoop};
pub use caldera_world::{MemoryWorld, Terrain};

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Already installed is fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
