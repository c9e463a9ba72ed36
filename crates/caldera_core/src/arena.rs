//! # Arena
//!
//! A reserved patch of world space that hosts exactly one session at a time.

use std::fmt;

use crate::types::{Location, RegionCoord};

/// Arena identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaId(pub String);

impl ArenaId {
    /// Creates an arena id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An arena site.
///
/// `origin` is the surface point the boundary is centered on; `size` is the
/// initial boundary edge length.
#[derive(Clone, Debug, PartialEq)]
pub struct Arena {
    /// Arena identity.
    pub id: ArenaId,
    /// Boundary center on the surface.
    pub origin: Location,
    /// Initial boundary size in blocks.
    pub size: u32,
    /// Set once the arena has hosted a session.
    pub used: bool,
}

impl Arena {
    /// Creates a fresh, unused arena.
    #[must_use]
    pub fn new(id: ArenaId, origin: Location, size: u32) -> Self {
        Self {
            id,
            origin,
            size,
            used: false,
        }
    }

    /// World the arena lives in.
    #[inline]
    #[must_use]
    pub fn world(&self) -> &str {
        &self.origin.world
    }

    /// Half the boundary size, in blocks.
    #[inline]
    #[must_use]
    pub const fn radius(&self) -> i32 {
        (self.size / 2) as i32
    }

    /// Region holding the arena center.
    #[inline]
    #[must_use]
    pub fn center_region(&self) -> RegionCoord {
        self.origin.block().region()
    }

    /// Regions covering the whole boundary plus a margin of two regions.
    #[must_use]
    pub fn footprint(&self) -> Vec<RegionCoord> {
        let reach = self.radius() / crate::types::REGION_SIZE + 2;
        self.center_region().square(reach)
    }
}

impl fmt::Display for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Arena{{id='{}', center={}, size={}, used={}}}",
            self.id, self.origin, self.size, self.used
        )
    }
}
