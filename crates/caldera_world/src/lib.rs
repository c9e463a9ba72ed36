//! # CALDERA World
//!
//! An in-process implementation of `caldera_core::WorldService`.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same terrain
//! 2. **Sparse**: Only cells written through `set_cell` are stored
//! 3. **Clocked**: Boundary transitions advance on `on_tick`, one tick per
//!    scheduler step
//!
//! ## Core Components
//!
//! - `SimplexNoise`: 2D noise for rolling terrain
//! - `Terrain`: base column shapes (flat, ocean, rolling)
//! - `MemoryWorld`: worlds, regions, boundary and players
//!
//! ## Example
//!
//! ```rust,ignore
//! use caldera_world::{MemoryWorld, Terrain};
//!
//! let mut world = MemoryWorld::new(20);
//! world.insert_world("caldera_world", Terrain::flat(64));
//! let alice = world.add_player();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;
pub mod noise;
pub mod terrain;

pub use memory::MemoryWorld;
pub use noise::{SimplexNoise, WorldSeed};
pub use terrain::Terrain;
