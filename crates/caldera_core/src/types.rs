//! # Core Types
//!
//! Identities and coordinates shared by every CALDERA crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Region edge length in blocks.
///
/// Regions are the unit the world backend loads and unloads.
pub const REGION_SIZE: i32 = 16;

/// Opaque player identity assigned by the host platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Integer cell position in a world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (elevation).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the region containing this cell.
    #[inline]
    #[must_use]
    pub const fn region(self) -> RegionCoord {
        RegionCoord::from_block_pos(self.x, self.z)
    }
}

/// Region coordinate (identifies a 16x16 column of cells).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionCoord {
    /// X coordinate (in regions, not blocks).
    pub x: i32,
    /// Z coordinate (in regions, not blocks).
    pub z: i32,
}

impl RegionCoord {
    /// Creates a new region coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts world block coordinates to a region coordinate.
    #[inline]
    #[must_use]
    pub const fn from_block_pos(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(REGION_SIZE),
            z: block_z.div_euclid(REGION_SIZE),
        }
    }

    /// Returns every region within `radius` regions of this one (a square).
    #[must_use]
    pub fn square(self, radius: i32) -> Vec<Self> {
        let side = (2 * radius + 1).max(0) as usize;
        let mut out = Vec::with_capacity(side * side);
        for x in self.x - radius..=self.x + radius {
            for z in self.z - radius..=self.z + radius {
                out.push(Self::new(x, z));
            }
        }
        out
    }
}

/// A point in a named world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// World name.
    pub world: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Returns the containing cell.
    #[inline]
    #[must_use]
    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.block();
        write!(f, "{}({}, {}, {})", self.world, b.x, b.y, b.z)
    }
}

/// Cell material as seen by the session core.
///
/// Backends map their own block palettes onto this set; anything the core does
/// not care about is `Solid`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Material {
    /// Empty cell.
    #[default]
    Air,
    /// Water (arena sites with too much of it are rejected).
    Water,
    /// The rising hazard.
    Lava,
    /// Natural solid terrain.
    Solid,
    /// Bottom-of-world layer.
    Bedrock,
    /// Invisible wall.
    Barrier,
    /// Scripting block.
    CommandBlock,
    /// Structure template block.
    StructureBlock,
}

impl Material {
    /// Materials the hazard sweep must never overwrite.
    pub const INDESTRUCTIBLE: [Self; 4] = [
        Self::Bedrock,
        Self::Barrier,
        Self::CommandBlock,
        Self::StructureBlock,
    ];

    /// Returns true if the hazard sweep leaves this material alone.
    #[inline]
    #[must_use]
    pub fn is_indestructible(self) -> bool {
        Self::INDESTRUCTIBLE.contains(&self)
    }

    /// Returns true for empty cells.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Air)
    }
}

/// Player game mode the session forces on roster members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// Normal play.
    Survival,
    /// Fly-through observer; cannot interact.
    Spectator,
}
