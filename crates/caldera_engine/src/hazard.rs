//! # Hazard Engine
//!
//! The rising lava.
//!
//! ## Raise
//!
//! ```text
//! new = min(current + step, max_height)
//! for y in current..new:
//!     every cell within radius of the center, in 16x16 blocks:
//!         lava, unless indestructible
//! current = new
//! ```
//!
//! The level never goes down until `reset`. A raise is a sweep of
//! `(new - current) * blocks` units of work; `step` performs a bounded number
//! of them per call so a tick never does unbounded work.

use caldera_core::{BlockPos, GameConfig, Material, WorldService, REGION_SIZE};
use tracing::debug;

/// A finished raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HazardRaise {
    /// Level before the raise.
    pub from: i32,
    /// Level after the raise.
    pub to: i32,
    /// Cells turned into lava.
    pub converted: usize,
    /// Cells that could not be read or written.
    pub failures: usize,
}

/// In-flight sweep of one raise.
#[derive(Debug)]
struct Sweep {
    world: String,
    center_x: i32,
    center_z: i32,
    radius: i32,
    from: i32,
    to: i32,
    /// Origins of the 16x16 blocks covering the circle.
    blocks: Vec<(i32, i32)>,
    /// Next unit; unit `u` is layer `u / blocks.len()`, block `u % blocks.len()`.
    cursor: usize,
    converted: usize,
    failures: usize,
}

impl Sweep {
    fn new(world: &str, center: (f64, f64), radius: f64, from: i32, to: i32) -> Self {
        let center_x = center.0.floor() as i32;
        let center_z = center.1.floor() as i32;
        let radius = radius.max(0.0).floor() as i32;

        let mut blocks = Vec::new();
        let mut bx = center_x - radius;
        while bx <= center_x + radius {
            let mut bz = center_z - radius;
            while bz <= center_z + radius {
                blocks.push((bx, bz));
                bz += REGION_SIZE;
            }
            bx += REGION_SIZE;
        }

        Self {
            world: world.to_string(),
            center_x,
            center_z,
            radius,
            from,
            to,
            blocks,
            cursor: 0,
            converted: 0,
            failures: 0,
        }
    }

    fn total_units(&self) -> usize {
        (self.to - self.from).max(0) as usize * self.blocks.len()
    }

    fn is_done(&self) -> bool {
        self.cursor >= self.total_units()
    }

    fn run<W: WorldService + ?Sized>(&mut self, world: &mut W, budget: usize) {
        let end = self.cursor.saturating_add(budget.max(1)).min(self.total_units());
        while self.cursor < end {
            let layer = self.cursor / self.blocks.len();
            let (bx, bz) = self.blocks[self.cursor % self.blocks.len()];
            self.fill_block(world, self.from + layer as i32, bx, bz);
            self.cursor += 1;
        }
    }

    fn fill_block<W: WorldService + ?Sized>(&mut self, world: &mut W, y: i32, bx: i32, bz: i32) {
        let r2 = i64::from(self.radius) * i64::from(self.radius);
        let x_end = (bx + REGION_SIZE).min(self.center_x + self.radius + 1);
        let z_end = (bz + REGION_SIZE).min(self.center_z + self.radius + 1);

        for x in bx..x_end {
            let dx = i64::from(x - self.center_x);
            for z in bz..z_end {
                let dz = i64::from(z - self.center_z);
                if dx * dx + dz * dz > r2 {
                    continue;
                }

                let pos = BlockPos::new(x, y, z);
                match world.read_cell(&self.world, pos) {
                    Ok(material) if material.is_indestructible() || material == Material::Lava => {}
                    Ok(_) => match world.set_cell(&self.world, pos, Material::Lava) {
                        Ok(()) => self.converted += 1,
                        Err(_) => self.failures += 1,
                    },
                    Err(_) => self.failures += 1,
                }
            }
        }
    }
}

/// Monotonic hazard level plus its pending sweep.
#[derive(Debug)]
pub struct HazardEngine {
    start_level: i32,
    step: i32,
    max_height: i32,
    current: i32,
    sweep: Option<Sweep>,
}

impl HazardEngine {
    /// Creates an engine at `start_level`, rising `step` per raise up to
    /// `max_height`.
    #[must_use]
    pub const fn new(start_level: i32, step: i32, max_height: i32) -> Self {
        Self {
            start_level,
            step,
            max_height,
            current: start_level,
            sweep: None,
        }
    }

    /// Engine with the configured start level, rise amount and ceiling.
    #[must_use]
    pub const fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.game.starting_hazard_level,
            config.game.hazard_rise_amount,
            config.world.max_height,
        )
    }

    /// Current level.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> i32 {
        self.current
    }

    /// Ceiling.
    #[inline]
    #[must_use]
    pub const fn max_height(&self) -> i32 {
        self.max_height
    }

    /// Returns true while a raise is being swept.
    #[inline]
    #[must_use]
    pub const fn is_sweeping(&self) -> bool {
        self.sweep.is_some()
    }

    /// Returns true once the ceiling is reached and nothing is pending.
    #[inline]
    #[must_use]
    pub const fn is_peaked(&self) -> bool {
        self.current >= self.max_height && self.sweep.is_none()
    }

    /// Starts a raise over the circle of `radius` around `center`.
    ///
    /// Returns the level the raise will end at, or `None` if a sweep is
    /// already pending or the ceiling is reached.
    pub fn begin_raise(&mut self, world: &str, center: (f64, f64), radius: f64) -> Option<i32> {
        if self.sweep.is_some() {
            return None;
        }
        let target = self.current.saturating_add(self.step).min(self.max_height);
        if target <= self.current {
            return None;
        }
        self.sweep = Some(Sweep::new(world, center, radius, self.current, target));
        Some(target)
    }

    /// Sweeps up to `block_budget` 16x16 blocks of the pending raise.
    ///
    /// Returns the raise once its last block is done; the level is updated
    /// at that point.
    pub fn step<W: WorldService + ?Sized>(
        &mut self,
        world: &mut W,
        block_budget: usize,
    ) -> Option<HazardRaise> {
        let sweep = self.sweep.as_mut()?;
        sweep.run(world, block_budget);
        if !sweep.is_done() {
            return None;
        }

        let sweep = self.sweep.take()?;
        self.current = sweep.to;
        debug!(
            from = sweep.from,
            to = sweep.to,
            converted = sweep.converted,
            failures = sweep.failures,
            "Hazard raised"
        );
        Some(HazardRaise {
            from: sweep.from,
            to: sweep.to,
            converted: sweep.converted,
            failures: sweep.failures,
        })
    }

    /// Raises one step and sweeps it to completion, inside the world's
    /// current containment boundary.
    ///
    /// A sweep already in progress is finished first and returned instead.
    pub fn raise_level<W: WorldService + ?Sized>(
        &mut self,
        world: &mut W,
        world_name: &str,
    ) -> Option<HazardRaise> {
        if self.sweep.is_none() {
            let center = world.containment_center(world_name);
            let radius = world.containment_size(world_name) / 2.0;
            self.begin_raise(world_name, center, radius)?;
        }
        self.step(world, usize::MAX)
    }

    /// Back to the start level; any pending sweep is dropped.
    pub fn reset(&mut self) {
        self.current = self.start_level;
        self.sweep = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caldera_world::{MemoryWorld, Terrain};

    fn flat_world() -> MemoryWorld {
        let mut world = MemoryWorld::new(20);
        world.insert_world("w", Terrain::flat(4));
        world.set_containment_center("w", 0.5, 0.5);
        world.set_containment_size("w", 10.0);
        world
    }

    #[test]
    fn test_raise_is_monotonic_and_capped() {
        let mut world = flat_world();
        let mut hazard = HazardEngine::new(0, 1, 10);

        for expected in 1..=10 {
            let raise = hazard.raise_level(&mut world, "w").unwrap();
            assert_eq!(raise.to, expected);
            assert_eq!(hazard.current(), expected);
        }
        assert!(hazard.raise_level(&mut world, "w").is_none());
        assert_eq!(hazard.current(), 10);
        assert!(hazard.is_peaked());
    }

    #[test]
    fn test_fill_is_circular_and_skips_bedrock() {
        let mut world = flat_world();
        let mut hazard = HazardEngine::new(0, 2, 10);
        let raise = hazard.raise_level(&mut world, "w").unwrap();

        // y = 0 is bedrock everywhere; only y = 1 converts
        assert_eq!(world.cell("w", BlockPos::new(0, 0, 0)), Some(Material::Bedrock));
        assert_eq!(world.cell("w", BlockPos::new(0, 1, 0)), Some(Material::Lava));
        assert_eq!(world.cell("w", BlockPos::new(5, 1, 0)), Some(Material::Lava));
        // Corner of the square, outside the circle
        assert_eq!(world.cell("w", BlockPos::new(5, 1, 5)), Some(Material::Solid));

        let lava = world.count_material("w", Material::Lava);
        assert_eq!(raise.converted, lava);
        assert_eq!(raise.failures, 0);
    }

    #[test]
    fn test_sweep_respects_budget() {
        let mut world = flat_world();
        world.set_containment_size("w", 40.0);
        let mut hazard = HazardEngine::new(0, 1, 10);

        // Radius 20 spans 41 cells, three 16-wide blocks per axis
        hazard.begin_raise("w", (0.5, 0.5), 20.0).unwrap();
        let mut calls = 1;
        while hazard.step(&mut world, 2).is_none() {
            calls += 1;
        }
        assert_eq!(calls, 5);
        assert_eq!(hazard.current(), 1);
        assert!(!hazard.is_sweeping());
    }

    #[test]
    fn test_unbounded_step_finishes_partial_sweep() {
        let mut world = flat_world();
        world.set_containment_size("w", 40.0);
        let mut hazard = HazardEngine::new(0, 1, 10);

        hazard.begin_raise("w", (0.5, 0.5), 20.0).unwrap();
        assert!(hazard.step(&mut world, 1).is_none());

        let raise = hazard.step(&mut world, usize::MAX).unwrap();
        assert_eq!((raise.from, raise.to), (0, 1));
        assert_eq!(hazard.current(), 1);

        // raise_level on top of a half-done task sweep finishes it first
        hazard.begin_raise("w", (0.5, 0.5), 20.0).unwrap();
        assert!(hazard.step(&mut world, 3).is_none());
        let raise = hazard.raise_level(&mut world, "w").unwrap();
        assert_eq!(raise.to, 2);
        assert!(!hazard.is_sweeping());
    }

    #[test]
    fn test_reset_drops_pending_sweep() {
        let mut hazard = HazardEngine::new(3, 1, 10);
        hazard.begin_raise("w", (0.0, 0.0), 5.0).unwrap();
        assert!(hazard.begin_raise("w", (0.0, 0.0), 5.0).is_none());
        hazard.reset();
        assert_eq!(hazard.current(), 3);
        assert!(!hazard.is_sweeping());
    }
}
