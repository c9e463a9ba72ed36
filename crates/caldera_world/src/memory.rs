//! # Memory World
//!
//! A complete `WorldService` that keeps everything in process memory.
//!
//! ## Storage
//!
//! ```text
//! MemoryWorld
//! ├── worlds: name -> WorldState
//! │   ├── terrain     (base columns, recomputed on demand)
//! │   ├── overrides   (cells written through set_cell)
//! │   ├── loaded      (resident regions)
//! │   └── border      (center + timed size transition)
//! └── players: id -> PlayerState
//! ```
//!
//! The boundary transition is driven by the tick clock: `on_tick` advances
//! the clock by one, and a shrink requested over `d` seconds completes after
//! `d * tick_rate` ticks.

use std::collections::{BTreeMap, HashMap, HashSet};

use caldera_core::{
    BlockPos, GameMode, Location, Material, PlayerId, RegionCoord, WorldError, WorldResult,
    WorldService, WorldSettings,
};
use tracing::debug;

use crate::terrain::{Terrain, MAX_ELEVATION};

/// Boundary size a world starts with before anything sets it.
const DEFAULT_BORDER: f64 = 60_000_000.0;

/// Timed boundary transition.
#[derive(Clone, Debug)]
struct Border {
    center: (f64, f64),
    from: f64,
    to: f64,
    start_tick: u64,
    duration_ticks: u64,
}

impl Border {
    fn fixed(size: f64) -> Self {
        Self {
            center: (0.0, 0.0),
            from: size,
            to: size,
            start_tick: 0,
            duration_ticks: 0,
        }
    }

    fn size_at(&self, now: u64) -> f64 {
        let elapsed = now.saturating_sub(self.start_tick);
        if self.duration_ticks == 0 || elapsed >= self.duration_ticks {
            return self.to;
        }
        let t = elapsed as f64 / self.duration_ticks as f64;
        self.from + (self.to - self.from) * t
    }
}

/// State of one world.
#[derive(Debug)]
struct WorldState {
    terrain: Terrain,
    overrides: HashMap<BlockPos, Material>,
    loaded: HashSet<RegionCoord>,
    failing: HashSet<RegionCoord>,
    border: Border,
    pvp: bool,
}

impl WorldState {
    fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            overrides: HashMap::new(),
            loaded: HashSet::new(),
            failing: HashSet::new(),
            border: Border::fixed(DEFAULT_BORDER),
            pvp: true,
        }
    }

    fn material(&self, pos: BlockPos) -> Material {
        self.overrides
            .get(&pos)
            .copied()
            .unwrap_or_else(|| self.terrain.material_at(pos.x, pos.y, pos.z))
    }
}

/// State of one player.
#[derive(Clone, Debug)]
struct PlayerState {
    location: Option<Location>,
    mode: GameMode,
    online: bool,
}

/// In-memory world backend.
#[derive(Debug)]
pub struct MemoryWorld {
    worlds: HashMap<String, WorldState>,
    players: BTreeMap<PlayerId, PlayerState>,
    next_player: u64,
    tick_rate: u32,
    now: u64,
    strict_regions: bool,
    generator: Option<Terrain>,
}

impl MemoryWorld {
    /// Creates an empty backend whose clock runs at `tick_rate` ticks per
    /// second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            worlds: HashMap::new(),
            players: BTreeMap::new(),
            next_player: 1,
            tick_rate: tick_rate.max(1),
            now: 0,
            strict_regions: false,
            generator: None,
        }
    }

    /// Terrain used by `create_world`. Without one, created worlds get
    /// rolling terrain from the settings seed.
    #[must_use]
    pub fn with_generator(mut self, terrain: Terrain) -> Self {
        self.generator = Some(terrain);
        self
    }

    /// Adds (or replaces) a world directly.
    pub fn insert_world(&mut self, name: impl Into<String>, terrain: Terrain) {
        self.worlds.insert(name.into(), WorldState::new(terrain));
    }

    /// Requires regions to be loaded before their cells can be read or
    /// written.
    pub fn set_strict_regions(&mut self, strict: bool) {
        self.strict_regions = strict;
    }

    /// Makes every cell and elevation query inside `region` fail.
    pub fn fail_reads_in(&mut self, world: &str, region: RegionCoord) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.failing.insert(region);
        }
    }

    /// Connects a new player and returns its id.
    pub fn add_player(&mut self) -> PlayerId {
        let id = PlayerId(self.next_player);
        self.next_player += 1;
        self.players.insert(
            id,
            PlayerState {
                location: None,
                mode: GameMode::Survival,
                online: true,
            },
        );
        id
    }

    /// Marks a player offline.
    pub fn disconnect_player(&mut self, player: PlayerId) {
        if let Some(state) = self.players.get_mut(&player) {
            state.online = false;
        }
    }

    /// Last location a player was teleported to.
    #[must_use]
    pub fn player_location(&self, player: PlayerId) -> Option<&Location> {
        self.players.get(&player).and_then(|p| p.location.as_ref())
    }

    /// Current game mode of a player.
    #[must_use]
    pub fn game_mode(&self, player: PlayerId) -> Option<GameMode> {
        self.players.get(&player).map(|p| p.mode)
    }

    /// Returns true if PvP is enabled in `world`.
    #[must_use]
    pub fn pvp_enabled(&self, world: &str) -> bool {
        self.worlds.get(world).is_some_and(|w| w.pvp)
    }

    /// Number of resident regions in `world`.
    #[must_use]
    pub fn loaded_regions(&self, world: &str) -> usize {
        self.worlds.get(world).map_or(0, |w| w.loaded.len())
    }

    /// Returns true if `region` is resident in `world`.
    #[must_use]
    pub fn is_region_loaded(&self, world: &str, region: RegionCoord) -> bool {
        self.worlds
            .get(world)
            .is_some_and(|w| w.loaded.contains(&region))
    }

    /// Reads a cell without region or failure checks.
    #[must_use]
    pub fn cell(&self, world: &str, pos: BlockPos) -> Option<Material> {
        self.worlds.get(world).map(|w| w.material(pos))
    }

    /// Counts overridden cells of one material.
    ///
    /// Lava only ever exists as an override, so this is the number of lava
    /// cells when `material` is `Lava`.
    #[must_use]
    pub fn count_material(&self, world: &str, material: Material) -> usize {
        self.worlds.get(world).map_or(0, |w| {
            w.overrides.values().filter(|m| **m == material).count()
        })
    }

    /// Ticks elapsed since creation.
    #[inline]
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    fn world(&self, name: &str) -> WorldResult<&WorldState> {
        self.worlds
            .get(name)
            .ok_or_else(|| WorldError::WorldUnavailable(name.to_string()))
    }

    fn world_mut(&mut self, name: &str) -> WorldResult<&mut WorldState> {
        self.worlds
            .get_mut(name)
            .ok_or_else(|| WorldError::WorldUnavailable(name.to_string()))
    }

    fn check_access(&self, state: &WorldState, pos: BlockPos) -> WorldResult<()> {
        if !(0..=MAX_ELEVATION).contains(&pos.y) {
            return Err(WorldError::OutOfRange(pos.y));
        }
        let region = pos.region();
        if state.failing.contains(&region) {
            return Err(WorldError::Backend(format!(
                "injected failure in region ({}, {})",
                region.x, region.z
            )));
        }
        if self.strict_regions && !state.loaded.contains(&region) {
            return Err(WorldError::RegionNotLoaded(region));
        }
        Ok(())
    }
}

impl WorldService for MemoryWorld {
    fn highest_solid_elevation(&self, world: &str, x: i32, z: i32) -> WorldResult<i32> {
        let state = self.world(world)?;
        let region = RegionCoord::from_block_pos(x, z);
        if state.failing.contains(&region) {
            return Err(WorldError::Backend(format!(
                "injected failure in region ({}, {})",
                region.x, region.z
            )));
        }
        if self.strict_regions && !state.loaded.contains(&region) {
            return Err(WorldError::RegionNotLoaded(region));
        }

        // Overrides may sit above the base terrain
        let base = state.terrain.top_height(x, z);
        let top = state
            .overrides
            .iter()
            .filter(|(pos, m)| pos.x == x && pos.z == z && !m.is_air())
            .map(|(pos, _)| pos.y)
            .fold(base, i32::max);

        let mut y = top;
        while y > 0 && state.material(BlockPos::new(x, y, z)).is_air() {
            y -= 1;
        }
        Ok(y)
    }

    fn read_cell(&self, world: &str, pos: BlockPos) -> WorldResult<Material> {
        let state = self.world(world)?;
        self.check_access(state, pos)?;
        Ok(state.material(pos))
    }

    fn set_cell(&mut self, world: &str, pos: BlockPos, material: Material) -> WorldResult<()> {
        self.check_access(self.world(world)?, pos)?;
        let state = self.world_mut(world)?;
        if state.terrain.material_at(pos.x, pos.y, pos.z) == material {
            state.overrides.remove(&pos);
        } else {
            state.overrides.insert(pos, material);
        }
        Ok(())
    }

    fn load_region(&mut self, world: &str, region: RegionCoord) -> WorldResult<()> {
        self.world_mut(world)?.loaded.insert(region);
        Ok(())
    }

    fn unload_region(&mut self, world: &str, region: RegionCoord) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.loaded.remove(&region);
        }
    }

    fn world_exists(&self, world: &str) -> bool {
        self.worlds.contains_key(world)
    }

    fn create_world(&mut self, name: &str, settings: &WorldSettings) -> WorldResult<()> {
        if self.worlds.contains_key(name) {
            return Err(WorldError::WorldExists(name.to_string()));
        }
        let terrain = self
            .generator
            .clone()
            .unwrap_or_else(|| Terrain::rolling(settings.seed));
        debug!(world = name, ?terrain, "Creating world");
        self.worlds.insert(name.to_string(), WorldState::new(terrain));
        Ok(())
    }

    fn delete_world(&mut self, name: &str) -> WorldResult<()> {
        if self.worlds.remove(name).is_none() {
            return Err(WorldError::WorldUnavailable(name.to_string()));
        }
        debug!(world = name, "Deleted world");
        Ok(())
    }

    fn set_containment_center(&mut self, world: &str, x: f64, z: f64) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.border.center = (x, z);
        }
    }

    fn set_containment_size(&mut self, world: &str, size: f64) {
        if let Some(state) = self.worlds.get_mut(world) {
            let center = state.border.center;
            state.border = Border::fixed(size);
            state.border.center = center;
        }
    }

    fn shrink_containment(&mut self, world: &str, size: f64, duration_secs: u32) {
        let now = self.now;
        let duration_ticks = u64::from(duration_secs) * u64::from(self.tick_rate);
        if let Some(state) = self.worlds.get_mut(world) {
            let from = state.border.size_at(now);
            state.border = Border {
                center: state.border.center,
                from,
                to: size,
                start_tick: now,
                duration_ticks,
            };
        }
    }

    fn containment_size(&self, world: &str) -> f64 {
        self.worlds
            .get(world)
            .map_or(DEFAULT_BORDER, |w| w.border.size_at(self.now))
    }

    fn containment_center(&self, world: &str) -> (f64, f64) {
        self.worlds
            .get(world)
            .map_or((0.0, 0.0), |w| w.border.center)
    }

    fn spawn_location(&self, world: &str) -> Option<Location> {
        let state = self.worlds.get(world)?;
        let y = state.terrain.top_height(0, 0) + 1;
        Some(Location::new(world, 0.5, f64::from(y), 0.5))
    }

    fn teleport(&mut self, player: PlayerId, location: &Location) -> WorldResult<()> {
        if !self.worlds.contains_key(&location.world) {
            return Err(WorldError::WorldUnavailable(location.world.clone()));
        }
        match self.players.get_mut(&player) {
            Some(state) if state.online => {
                state.location = Some(location.clone());
                Ok(())
            }
            _ => Err(WorldError::UnknownPlayer(player.0)),
        }
    }

    fn set_game_mode(&mut self, player: PlayerId, mode: GameMode) {
        if let Some(state) = self.players.get_mut(&player) {
            if state.online {
                state.mode = mode;
            }
        }
    }

    fn set_pvp(&mut self, world: &str, enabled: bool) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.pvp = enabled;
        }
    }

    fn online_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|(_, p)| p.online)
            .map(|(id, _)| *id)
            .collect()
    }

    fn on_tick(&mut self) {
        self.now += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new(20);
        world.insert_world("arena", Terrain::flat(64));
        world
    }

    #[test]
    fn test_cells_and_overrides() {
        let mut w = world();
        let pos = BlockPos::new(3, 65, -4);
        assert_eq!(w.read_cell("arena", pos).unwrap(), Material::Air);

        w.set_cell("arena", pos, Material::Lava).unwrap();
        assert_eq!(w.read_cell("arena", pos).unwrap(), Material::Lava);
        assert_eq!(w.count_material("arena", Material::Lava), 1);
        assert_eq!(w.highest_solid_elevation("arena", 3, -4).unwrap(), 65);

        w.set_cell("arena", pos, Material::Air).unwrap();
        assert_eq!(w.count_material("arena", Material::Lava), 0);
        assert_eq!(w.highest_solid_elevation("arena", 3, -4).unwrap(), 64);
    }

    #[test]
    fn test_out_of_range() {
        let w = world();
        let result = w.read_cell("arena", BlockPos::new(0, MAX_ELEVATION + 1, 0));
        assert_eq!(result, Err(WorldError::OutOfRange(MAX_ELEVATION + 1)));
        assert!(w.read_cell("nowhere", BlockPos::new(0, 1, 0)).is_err());
    }

    #[test]
    fn test_strict_regions() {
        let mut w = world();
        w.set_strict_regions(true);
        let pos = BlockPos::new(20, 70, 20);
        assert!(matches!(
            w.read_cell("arena", pos),
            Err(WorldError::RegionNotLoaded(_))
        ));

        w.load_region("arena", pos.region()).unwrap();
        assert!(w.read_cell("arena", pos).is_ok());
        assert_eq!(w.loaded_regions("arena"), 1);

        w.unload_region("arena", pos.region());
        assert_eq!(w.loaded_regions("arena"), 0);
    }

    #[test]
    fn test_injected_failures() {
        let mut w = world();
        w.fail_reads_in("arena", RegionCoord::new(0, 0));
        assert!(w.highest_solid_elevation("arena", 5, 5).is_err());
        assert!(w.read_cell("arena", BlockPos::new(5, 64, 5)).is_err());
        assert!(w.highest_solid_elevation("arena", 16, 5).is_ok());
    }

    #[test]
    fn test_border_transition_follows_clock() {
        let mut w = world();
        w.set_containment_size("arena", 200.0);
        w.shrink_containment("arena", 20.0, 10);

        assert!((w.containment_size("arena") - 200.0).abs() < f64::EPSILON);
        for _ in 0..100 {
            w.on_tick();
        }
        assert!((w.containment_size("arena") - 110.0).abs() < 1e-9);
        for _ in 0..100 {
            w.on_tick();
        }
        assert!((w.containment_size("arena") - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_players() {
        let mut w = world();
        w.insert_world("lobby", Terrain::flat(64));
        let a = w.add_player();
        let b = w.add_player();
        assert_eq!(w.online_players(), vec![a, b]);

        let dest = Location::new("lobby", 0.0, 100.0, 0.0);
        w.teleport(a, &dest).unwrap();
        assert_eq!(w.player_location(a), Some(&dest));

        w.disconnect_player(b);
        assert_eq!(w.online_players(), vec![a]);
        assert!(w.teleport(b, &dest).is_err());

        w.set_game_mode(a, GameMode::Spectator);
        assert_eq!(w.game_mode(a), Some(GameMode::Spectator));
    }

    #[test]
    fn test_create_and_delete() {
        let mut w = MemoryWorld::new(20).with_generator(Terrain::flat(70));
        let settings = WorldSettings::default();
        w.create_world("fresh", &settings).unwrap();
        assert!(w.world_exists("fresh"));
        assert_eq!(
            w.create_world("fresh", &settings),
            Err(WorldError::WorldExists("fresh".to_string()))
        );
        assert_eq!(w.spawn_location("fresh").map(|l| l.y), Some(71.0));

        w.delete_world("fresh").unwrap();
        assert!(!w.world_exists("fresh"));
    }
}
