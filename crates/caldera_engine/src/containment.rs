//! # Containment Engine
//!
//! The shrinking boundary around the arena.
//!
//! The world backend owns the actual transition; this engine only requests
//! it (once) and watches for it to finish. Once the shrink has started the
//! observed size never goes up.

use caldera_core::{GameConfig, WorldService};
use tracing::{debug, info};

/// Distance from the target at which the shrink counts as finished.
pub const SETTLE_TOLERANCE: f64 = 1.0;

/// Result of polling the boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContainmentPoll {
    /// The shrink has not been requested yet.
    Idle,
    /// Still moving; smallest size observed so far.
    Shrinking(f64),
    /// Within tolerance of the final size.
    Settled(f64),
}

/// Boundary lifecycle.
#[derive(Clone, Debug)]
pub struct ContainmentEngine {
    final_size: f64,
    duration_secs: u32,
    initial_size: Option<f64>,
    shrink_started: bool,
    settled: bool,
    /// Smallest size observed since the shrink began.
    low_water: f64,
}

impl ContainmentEngine {
    /// Creates an engine shrinking to `final_size` over `duration_secs`.
    #[must_use]
    pub const fn new(final_size: f64, duration_secs: u32) -> Self {
        Self {
            final_size,
            duration_secs,
            initial_size: None,
            shrink_started: false,
            settled: false,
            low_water: f64::INFINITY,
        }
    }

    /// Engine with the configured final size and shrink duration.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            f64::from(config.world.border_final_size),
            config.world.shrink_duration,
        )
    }

    /// Target size.
    #[inline]
    #[must_use]
    pub const fn final_size(&self) -> f64 {
        self.final_size
    }

    /// Shrink length in seconds.
    #[inline]
    #[must_use]
    pub const fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Returns true once the shrink was requested.
    #[inline]
    #[must_use]
    pub const fn shrink_started(&self) -> bool {
        self.shrink_started
    }

    /// Returns true once the boundary reached its final size.
    #[inline]
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.settled
    }

    /// Size the boundary was configured with.
    #[inline]
    #[must_use]
    pub const fn initial_size(&self) -> Option<f64> {
        self.initial_size
    }

    /// Centers the boundary and sets its starting size.
    pub fn configure<W: WorldService + ?Sized>(
        &mut self,
        world: &mut W,
        world_name: &str,
        center: (f64, f64),
        size: f64,
    ) {
        world.set_containment_center(world_name, center.0, center.1);
        world.set_containment_size(world_name, size);
        self.initial_size = Some(size);
        self.shrink_started = false;
        self.settled = false;
        self.low_water = size;
        debug!(world = world_name, x = center.0, z = center.1, size, "Boundary configured");
    }

    /// Requests the shrink. Returns false if it was already requested.
    pub fn begin_shrink<W: WorldService + ?Sized>(&mut self, world: &mut W, world_name: &str) -> bool {
        if self.shrink_started {
            return false;
        }
        world.shrink_containment(world_name, self.final_size, self.duration_secs);
        self.shrink_started = true;
        info!(
            world = world_name,
            target = self.final_size,
            duration_secs = self.duration_secs,
            "Boundary shrinking"
        );
        true
    }

    /// Reads the current size and checks for completion.
    pub fn poll<W: WorldService + ?Sized>(&mut self, world: &W, world_name: &str) -> ContainmentPoll {
        if !self.shrink_started {
            return ContainmentPoll::Idle;
        }

        let size = world.containment_size(world_name);
        self.low_water = self.low_water.min(size);

        if size <= self.final_size + SETTLE_TOLERANCE {
            if !self.settled {
                info!(world = world_name, size, "Boundary settled");
            }
            self.settled = true;
            ContainmentPoll::Settled(size)
        } else {
            ContainmentPoll::Shrinking(self.low_water)
        }
    }

    /// Forgets the arena; the next session configures again.
    pub fn reset(&mut self) {
        self.initial_size = None;
        self.shrink_started = false;
        self.settled = false;
        self.low_water = f64::INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caldera_world::{MemoryWorld, Terrain};

    #[test]
    fn test_shrink_lifecycle() {
        let mut world = MemoryWorld::new(20);
        world.insert_world("w", Terrain::flat(64));
        let mut engine = ContainmentEngine::new(20.0, 10);

        engine.configure(&mut world, "w", (100.5, -50.5), 200.0);
        assert_eq!(world.containment_center("w"), (100.5, -50.5));
        assert_eq!(engine.poll(&world, "w"), ContainmentPoll::Idle);

        assert!(engine.begin_shrink(&mut world, "w"));
        assert!(!engine.begin_shrink(&mut world, "w"));

        let mut last = f64::INFINITY;
        for _ in 0..200 {
            world.on_tick();
            match engine.poll(&world, "w") {
                ContainmentPoll::Shrinking(size) => {
                    assert!(size <= last);
                    last = size;
                }
                ContainmentPoll::Settled(size) => {
                    assert!(size <= 21.0);
                    break;
                }
                ContainmentPoll::Idle => unreachable!(),
            }
        }
        assert!(engine.is_settled());

        engine.reset();
        assert!(!engine.shrink_started());
        assert_eq!(engine.initial_size(), None);
    }
}
