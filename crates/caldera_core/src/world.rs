//! # World Service
//!
//! The seam between the session core and the terrain engine.
//!
//! ```text
//! caldera_engine / caldera_arena      world backend
//! ┌──────────────────────────┐        ┌────────────────────┐
//! │ calls WorldService       │ ─────> │ impl WorldService  │
//! └──────────────────────────┘        └────────────────────┘
//! ```
//!
//! Every call happens on the scheduling thread. Backends are free to be
//! `!Sync`; candidate generation workers never receive a world handle.

use crate::error::WorldResult;
use crate::types::{BlockPos, GameMode, Location, Material, PlayerId, RegionCoord};

/// Settings used when a world is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSettings {
    /// Terrain seed.
    pub seed: u64,
    /// Generate villages and similar structures.
    pub generate_structures: bool,
    /// Allow natural mob spawning.
    pub spawn_mobs: bool,
    /// Freeze the day/night cycle at noon.
    pub lock_daylight: bool,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            generate_structures: true,
            spawn_mobs: false,
            lock_daylight: true,
        }
    }
}

/// Interface to the host's world/terrain engine.
///
/// The host implements this trait; the core never touches terrain any other
/// way.
pub trait WorldService {
    /// Highest non-empty cell in a column (water counts).
    ///
    /// # Errors
    ///
    /// Backend-specific; callers treat a failure as one unsuitable sample.
    fn highest_solid_elevation(&self, world: &str, x: i32, z: i32) -> WorldResult<i32>;

    /// Reads one cell.
    ///
    /// # Errors
    ///
    /// Fails for unknown worlds, unloaded regions or out-of-range elevations.
    fn read_cell(&self, world: &str, pos: BlockPos) -> WorldResult<Material>;

    /// Writes one cell.
    ///
    /// # Errors
    ///
    /// Same conditions as [`WorldService::read_cell`].
    fn set_cell(&mut self, world: &str, pos: BlockPos, material: Material) -> WorldResult<()>;

    /// Loads a region and keeps it resident.
    ///
    /// # Errors
    ///
    /// Fails when the world does not exist.
    fn load_region(&mut self, world: &str, region: RegionCoord) -> WorldResult<()>;

    /// Releases a region. Unknown regions are ignored.
    fn unload_region(&mut self, world: &str, region: RegionCoord);

    /// Returns true if the world exists and is loaded.
    fn world_exists(&self, world: &str) -> bool;

    /// Creates a world.
    ///
    /// # Errors
    ///
    /// Fails if the world exists or the backend cannot create it.
    fn create_world(&mut self, name: &str, settings: &WorldSettings) -> WorldResult<()>;

    /// Unloads and deletes a world.
    ///
    /// # Errors
    ///
    /// Fails if the world does not exist.
    fn delete_world(&mut self, name: &str) -> WorldResult<()>;

    /// Centers the containment boundary.
    fn set_containment_center(&mut self, world: &str, x: f64, z: f64);

    /// Sets the boundary size immediately, cancelling any transition.
    fn set_containment_size(&mut self, world: &str, size: f64);

    /// Moves the boundary size to `size` over `duration_secs` seconds.
    ///
    /// One request; the backend interpolates on its own clock.
    fn shrink_containment(&mut self, world: &str, size: f64, duration_secs: u32);

    /// Current boundary size.
    fn containment_size(&self, world: &str) -> f64;

    /// Current boundary center `(x, z)`.
    fn containment_center(&self, world: &str) -> (f64, f64);

    /// Default spawn point of a world.
    fn spawn_location(&self, world: &str) -> Option<Location>;

    /// Moves a player.
    ///
    /// # Errors
    ///
    /// Fails for players that are not online or unknown worlds.
    fn teleport(&mut self, player: PlayerId, location: &Location) -> WorldResult<()>;

    /// Forces a game mode on a player. Offline players are ignored.
    fn set_game_mode(&mut self, player: PlayerId, mode: GameMode);

    /// Enables or disables player-vs-player damage in a world.
    fn set_pvp(&mut self, world: &str, enabled: bool);

    /// Players currently connected and eligible to join a session.
    fn online_players(&self) -> Vec<PlayerId>;

    /// Called once at the start of every scheduler tick.
    ///
    /// Backends that keep their own clock (boundary transitions) advance it
    /// here. The default does nothing.
    fn on_tick(&mut self) {}
}
