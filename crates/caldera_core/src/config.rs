//! # Game Configuration
//!
//! All tunables live in one TOML file, loaded once at startup.
//!
//! ```toml
//! tick_rate = 20
//!
//! [game]
//! min_players = 2
//! initial_countdown = 60
//!
//! [world]
//! border_initial_size = 200
//! border_final_size = 20
//! shrink_delay = 120
//! shrink_duration = 600
//! ```
//!
//! Every section is optional; missing keys fall back to the defaults below.
//! Durations are in seconds unless the field name says `ticks`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Location;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Scheduler ticks per second.
    pub tick_rate: u32,
    /// Fixed RNG seed (spawn spread, arena candidates). Random when absent.
    pub seed: Option<u64>,
    /// Session rules.
    pub game: GameSection,
    /// Arena world and boundary.
    pub world: WorldSection,
    /// Where players go when a session ends.
    pub lobby: LobbySection,
    /// Periodic status refresh.
    pub status: StatusSection,
    /// Arena provisioning.
    pub provisioning: ProvisioningSection,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            seed: None,
            game: GameSection::default(),
            world: WorldSection::default(),
            lobby: LobbySection::default(),
            status: StatusSection::default(),
            provisioning: ProvisioningSection::default(),
        }
    }
}

/// Session rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSection {
    /// Minimum online players for `start()`.
    pub min_players: usize,
    /// Soft cap reported to hosts; the core does not enforce it.
    pub max_players: usize,
    /// Countdown before the hazard starts rising.
    pub initial_countdown: u32,
    /// Delay from ACTIVE until PvP is enabled.
    pub pvp_countdown: u32,
    /// Seconds between hazard rises.
    pub hazard_rise_interval: u32,
    /// Levels added per rise.
    pub hazard_rise_amount: i32,
    /// Hazard level after every reset.
    pub starting_hazard_level: i32,
    /// Ticks between the winner announcement and the automatic stop.
    pub ending_delay_ticks: u64,
    /// 16x16 sweep blocks the hazard task may convert per tick.
    pub sweep_blocks_per_tick: usize,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 20,
            initial_countdown: 60,
            pvp_countdown: 180,
            hazard_rise_interval: 5,
            hazard_rise_amount: 1,
            starting_hazard_level: 0,
            ending_delay_ticks: 100,
            sweep_blocks_per_tick: 64,
        }
    }
}

/// Arena world and boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    /// Name of the world arenas are provisioned in.
    pub name: String,
    /// Boundary size new arenas are created with.
    pub border_initial_size: u32,
    /// Boundary size the shrink ends at.
    pub border_final_size: u32,
    /// Delay from arena selection until the shrink starts.
    pub shrink_delay: u32,
    /// Length of the shrink transition.
    pub shrink_duration: u32,
    /// Preferred spawn height for world spawn points.
    pub spawn_height: i32,
    /// Hazard ceiling and top of the cleanup sweep.
    pub max_height: i32,
    /// Max horizontal distance of player spawns from the arena center.
    pub game_spread_distance: i32,
    /// Regions around the arena center preloaded on start.
    pub preload_radius: i32,
    /// Regions loaded per tick while preloading.
    pub regions_per_tick: usize,
    /// Cell columns the arena cleanup may scan per tick.
    pub cleanup_columns_per_tick: usize,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            name: "caldera_world".to_string(),
            border_initial_size: 200,
            border_final_size: 20,
            shrink_delay: 120,
            shrink_duration: 600,
            spawn_height: 100,
            max_height: 256,
            game_spread_distance: 50,
            preload_radius: 1,
            regions_per_tick: 4,
            cleanup_columns_per_tick: 256,
        }
    }
}

/// Lobby spawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbySection {
    /// Lobby world name.
    pub world: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl LobbySection {
    /// Lobby spawn as a location.
    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.world.clone(), self.x, self.y, self.z)
    }
}

impl Default for LobbySection {
    fn default() -> Self {
        Self {
            world: "world".to_string(),
            x: 0.0,
            y: 100.0,
            z: 0.0,
        }
    }
}

/// Periodic status refresh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSection {
    /// Publish status snapshots at all.
    pub enabled: bool,
    /// Ticks between snapshots.
    pub update_interval: u64,
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            enabled: true,
            update_interval: 20,
        }
    }
}

/// Arena provisioning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningSection {
    /// Registry file path.
    pub registry_file: String,
    /// Arenas requested per provisioning run.
    pub arenas_per_run: usize,
    /// Candidate sites generated per run.
    pub attempt_budget: usize,
    /// Candidates are drawn from `[-range, range)` on both axes.
    pub coordinate_range: i32,
    /// Distance of the outer sample points from the candidate center.
    pub sample_offset: i32,
    /// Surface below this elevation counts as ocean.
    pub min_elevation: i32,
    /// Candidates at or above this unsuitable fraction are rejected.
    pub max_unsuitable_fraction: f64,
    /// Candidates validated per tick.
    pub candidates_per_tick: usize,
}

impl Default for ProvisioningSection {
    fn default() -> Self {
        Self {
            registry_file: "arenas.toml".to_string(),
            arenas_per_run: 4,
            attempt_budget: 100,
            coordinate_range: 4000,
            sample_offset: 10,
            min_elevation: 60,
            max_unsuitable_fraction: 0.3,
            candidates_per_tick: 1,
        }
    }
}

impl GameConfig {
    /// Parses a config from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Invalid` for inconsistent values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`GameConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.tick_rate == 0 {
            return invalid("tick_rate must be positive");
        }
        if self.game.min_players == 0 {
            return invalid("game.min_players must be at least 1");
        }
        if self.game.hazard_rise_amount <= 0 {
            return invalid("game.hazard_rise_amount must be positive");
        }
        if self.game.hazard_rise_interval == 0 {
            return invalid("game.hazard_rise_interval must be positive");
        }
        if self.game.sweep_blocks_per_tick == 0 {
            return invalid("game.sweep_blocks_per_tick must be positive");
        }
        if self.game.starting_hazard_level >= self.world.max_height {
            return invalid("game.starting_hazard_level must be below world.max_height");
        }
        if self.world.border_final_size > self.world.border_initial_size {
            return invalid("world.border_final_size must not exceed world.border_initial_size");
        }
        if self.world.regions_per_tick == 0 || self.world.cleanup_columns_per_tick == 0 {
            return invalid("world per-tick budgets must be positive");
        }
        if !(0.0..=1.0).contains(&self.provisioning.max_unsuitable_fraction) {
            return invalid("provisioning.max_unsuitable_fraction must be within [0, 1]");
        }
        if self.provisioning.coordinate_range <= 0 {
            return invalid("provisioning.coordinate_range must be positive");
        }
        if self.provisioning.candidates_per_tick == 0 {
            return invalid("provisioning.candidates_per_tick must be positive");
        }
        if self.status.update_interval == 0 {
            return invalid("status.update_interval must be positive");
        }
        Ok(())
    }

    /// Converts seconds to scheduler ticks.
    #[inline]
    #[must_use]
    pub fn ticks(&self, seconds: u32) -> u64 {
        u64::from(seconds) * u64::from(self.tick_rate)
    }
}
