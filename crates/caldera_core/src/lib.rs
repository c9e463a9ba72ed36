//! # CALDERA Core
//!
//! Shared vocabulary for the rising-lava elimination minigame.
//!
//! ## Contents
//!
//! - `types`: player identities, block/region coordinates, materials
//! - `arena`: the `Arena` record handed out by the arena pool
//! - `config`: `GameConfig`, loaded from TOML
//! - `world`: the `WorldService` trait (the terrain engine seam)
//! - `error`: world and configuration errors
//!
//! ## Threading Rule
//!
//! Nothing in here is tied to a thread, but every `WorldService` call is made
//! from the single scheduling thread. World backends are not required to be
//! `Sync`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use caldera_core::{GameConfig, Location};
//!
//! let config = GameConfig::load("caldera.toml")?;
//! let lobby: Location = config.lobby.location();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod arena;
pub mod config;
pub mod error;
pub mod types;
pub mod world;

pub use arena::{Arena, ArenaId};
pub use config::{
    GameConfig, GameSection, LobbySection, ProvisioningSection, StatusSection, WorldSection,
};
pub use error::{ConfigError, WorldError, WorldResult};
pub use types::{BlockPos, GameMode, Location, Material, PlayerId, RegionCoord, REGION_SIZE};
pub use world::{WorldService, WorldSettings};
