//! # Arena Cleanup
//!
//! Turns a released arena back into plain terrain.
//!
//! Every lava cell within the arena radius, for `y` in `0..=max_height`, is
//! replaced with air. The scan runs column by column in bounded slices;
//! when it finishes, the arena footprint is unloaded.

use caldera_core::{Arena, ArenaId, BlockPos, Material, RegionCoord, WorldService};
use tracing::{debug, info};

/// Progress of one cleanup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanupStats {
    /// Columns scanned so far.
    pub columns: usize,
    /// Lava cells turned into air.
    pub cleared: usize,
    /// Cells that could not be read or written.
    pub failures: usize,
}

/// A chunked cleanup of one arena.
#[derive(Debug)]
pub struct CleanupJob {
    arena: ArenaId,
    world: String,
    center_x: i32,
    center_z: i32,
    radius: i32,
    max_height: i32,
    /// Index of the next column within the `(2r + 1)^2` square.
    cursor: usize,
    regions: Vec<RegionCoord>,
    loaded: bool,
    stats: CleanupStats,
}

impl CleanupJob {
    /// Creates a cleanup job for `arena`.
    #[must_use]
    pub fn new(arena: &Arena, max_height: i32) -> Self {
        let center = arena.origin.block();
        Self {
            arena: arena.id.clone(),
            world: arena.world().to_string(),
            center_x: center.x,
            center_z: center.z,
            radius: arena.radius(),
            max_height,
            cursor: 0,
            regions: arena.footprint(),
            loaded: false,
            stats: CleanupStats::default(),
        }
    }

    /// Arena being cleaned.
    #[must_use]
    pub fn arena(&self) -> &ArenaId {
        &self.arena
    }

    /// Progress so far.
    #[must_use]
    pub fn stats(&self) -> &CleanupStats {
        &self.stats
    }

    #[inline]
    fn side(&self) -> usize {
        (2 * self.radius + 1) as usize
    }

    #[inline]
    fn total_columns(&self) -> usize {
        self.side() * self.side()
    }

    /// Returns true once every column has been scanned and the footprint
    /// released.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.total_columns() && !self.loaded
    }

    /// Scans up to `column_budget` columns. Returns true when the job is
    /// complete.
    pub fn step<W: WorldService + ?Sized>(&mut self, world: &mut W, column_budget: usize) -> bool {
        if self.is_done() {
            return true;
        }

        if !world.world_exists(&self.world) {
            debug!(arena = %self.arena, world = %self.world, "World gone, cleanup skipped");
            self.cursor = self.total_columns();
            self.loaded = false;
            return true;
        }

        if !self.loaded && self.cursor == 0 {
            for region in &self.regions {
                if world.load_region(&self.world, *region).is_err() {
                    self.stats.failures += 1;
                }
            }
            self.loaded = true;
        }

        let side = self.side();
        let end = self
            .cursor
            .saturating_add(column_budget.max(1))
            .min(self.total_columns());
        while self.cursor < end {
            let x = self.center_x - self.radius + (self.cursor / side) as i32;
            let z = self.center_z - self.radius + (self.cursor % side) as i32;
            self.clear_column(world, x, z);
            self.cursor += 1;
            self.stats.columns += 1;
        }

        if self.cursor >= self.total_columns() && self.loaded {
            for region in &self.regions {
                world.unload_region(&self.world, *region);
            }
            self.loaded = false;
            info!(
                arena = %self.arena,
                cleared = self.stats.cleared,
                failures = self.stats.failures,
                "Cleaned up arena"
            );
        }

        self.is_done()
    }

    fn clear_column<W: WorldService + ?Sized>(&mut self, world: &mut W, x: i32, z: i32) {
        for y in 0..=self.max_height {
            let pos = BlockPos::new(x, y, z);
            match world.read_cell(&self.world, pos) {
                Ok(Material::Lava) => {
                    if world.set_cell(&self.world, pos, Material::Air).is_ok() {
                        self.stats.cleared += 1;
                    } else {
                        self.stats.failures += 1;
                    }
                }
                Ok(_) => {}
                Err(_) => self.stats.failures += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caldera_core::Location;
    use caldera_world::{MemoryWorld, Terrain};

    #[test]
    fn test_cleanup_clears_lava_in_slices() {
        let mut world = MemoryWorld::new(20);
        world.insert_world("w", Terrain::flat(64));
        world.set_strict_regions(true);

        let arena = Arena::new(ArenaId::new("a"), Location::new("w", 0.0, 65.0, 0.0), 10);
        for region in arena.footprint() {
            world.load_region("w", region).unwrap();
        }
        for x in -5..=5 {
            world.set_cell("w", BlockPos::new(x, 65, 3), Material::Lava).unwrap();
        }
        // Outside the radius; must survive
        world.set_cell("w", BlockPos::new(9, 65, 0), Material::Lava).unwrap();

        let mut job = CleanupJob::new(&arena, 100);
        let mut ticks = 0;
        while !job.step(&mut world, 20) {
            ticks += 1;
        }

        // 11 x 11 columns at 20 per tick
        assert_eq!(ticks, 6);
        assert_eq!(job.stats().cleared, 11);
        assert_eq!(job.stats().failures, 0);
        assert_eq!(world.count_material("w", Material::Lava), 1);
        assert_eq!(world.loaded_regions("w"), 0);
    }

    #[test]
    fn test_unbounded_step_after_partial_slice() {
        let mut world = MemoryWorld::new(20);
        world.insert_world("w", Terrain::flat(64));
        let arena = Arena::new(ArenaId::new("a"), Location::new("w", 0.0, 65.0, 0.0), 10);
        world.set_cell("w", BlockPos::new(4, 65, -4), Material::Lava).unwrap();

        let mut job = CleanupJob::new(&arena, 100);
        assert!(!job.step(&mut world, 1));
        assert!(job.step(&mut world, usize::MAX));
        assert_eq!(job.stats().columns, 11 * 11);
        assert_eq!(world.count_material("w", Material::Lava), 0);
    }

    #[test]
    fn test_cleanup_of_missing_world_completes() {
        let mut world = MemoryWorld::new(20);
        let arena = Arena::new(ArenaId::new("a"), Location::new("gone", 0.0, 65.0, 0.0), 10);
        let mut job = CleanupJob::new(&arena, 100);
        assert!(job.step(&mut world, 1));
    }
}
