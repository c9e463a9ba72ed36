//! # Terrain
//!
//! Base column shapes for in-memory worlds.
//!
//! A column is bedrock at `y = 0`, solid up to the surface, water up to the
//! sea level when the surface is below it, and air above.

use crate::noise::{SimplexNoise, WorldSeed};

/// Highest valid elevation in a `MemoryWorld`.
pub const MAX_ELEVATION: i32 = 319;

/// Sea level used by rolling terrain.
pub const SEA_LEVEL: i32 = 62;

/// Base terrain of a world.
#[derive(Clone)]
pub enum Terrain {
    /// Every column has the same surface.
    Flat {
        /// Surface elevation.
        surface: i32,
    },
    /// Sea floor covered by water everywhere.
    Ocean {
        /// Sea floor elevation.
        floor: i32,
        /// Water surface elevation.
        sea_level: i32,
    },
    /// Noise hills around elevation 64, some of them flooded.
    Rolling {
        /// Height noise.
        noise: SimplexNoise,
    },
}

impl Terrain {
    /// Horizontal noise scale (one feature every ~128 blocks).
    const ROLLING_SCALE: f64 = 1.0 / 128.0;
    /// Peak deviation from the base elevation.
    const ROLLING_AMPLITUDE: f64 = 24.0;
    /// Base elevation of rolling terrain.
    const ROLLING_BASE: f64 = 64.0;

    /// Flat terrain.
    #[must_use]
    pub const fn flat(surface: i32) -> Self {
        Self::Flat { surface }
    }

    /// Open ocean.
    #[must_use]
    pub const fn ocean(floor: i32, sea_level: i32) -> Self {
        Self::Ocean { floor, sea_level }
    }

    /// Rolling hills from a seed.
    #[must_use]
    pub fn rolling(seed: u64) -> Self {
        Self::Rolling {
            noise: SimplexNoise::new(WorldSeed::new(seed).derive(0x7e77_a1e5)),
        }
    }

    /// Elevation of the topmost solid cell in a column.
    #[must_use]
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let height = match self {
            Self::Flat { surface } => *surface,
            Self::Ocean { floor, .. } => *floor,
            Self::Rolling { noise } => {
                let value = noise.fractal(
                    f64::from(x) * Self::ROLLING_SCALE,
                    f64::from(z) * Self::ROLLING_SCALE,
                    4,
                );
                (Self::ROLLING_BASE + value * Self::ROLLING_AMPLITUDE) as i32
            }
        };
        height.clamp(1, MAX_ELEVATION)
    }

    /// Water surface, if the terrain has one.
    #[must_use]
    pub const fn sea_level(&self) -> Option<i32> {
        match self {
            Self::Flat { .. } => None,
            Self::Ocean { sea_level, .. } => Some(*sea_level),
            Self::Rolling { .. } => Some(SEA_LEVEL),
        }
    }

    /// Elevation of the topmost non-air cell in a column (water counts).
    #[must_use]
    pub fn top_height(&self, x: i32, z: i32) -> i32 {
        let surface = self.surface_height(x, z);
        match self.sea_level() {
            Some(sea) if sea > surface => sea,
            _ => surface,
        }
    }

    /// Base material of a cell. `y` must be within `0..=MAX_ELEVATION`.
    #[must_use]
    pub fn material_at(&self, x: i32, y: i32, z: i32) -> caldera_core::Material {
        use caldera_core::Material;

        let surface = self.surface_height(x, z);
        if y == 0 {
            Material::Bedrock
        } else if y <= surface {
            Material::Solid
        } else if self.sea_level().is_some_and(|sea| y <= sea) {
            Material::Water
        } else {
            Material::Air
        }
    }
}

impl std::fmt::Debug for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat { surface } => write!(f, "Flat({surface})"),
            Self::Ocean { floor, sea_level } => write!(f, "Ocean({floor}..{sea_level})"),
            Self::Rolling { .. } => f.write_str("Rolling"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caldera_core::Material;

    #[test]
    fn test_flat_column() {
        let terrain = Terrain::flat(64);
        assert_eq!(terrain.material_at(5, 0, 5), Material::Bedrock);
        assert_eq!(terrain.material_at(5, 64, 5), Material::Solid);
        assert_eq!(terrain.material_at(5, 65, 5), Material::Air);
        assert_eq!(terrain.top_height(-300, 12), 64);
    }

    #[test]
    fn test_ocean_column() {
        let terrain = Terrain::ocean(40, 62);
        assert_eq!(terrain.material_at(0, 40, 0), Material::Solid);
        assert_eq!(terrain.material_at(0, 41, 0), Material::Water);
        assert_eq!(terrain.material_at(0, 62, 0), Material::Water);
        assert_eq!(terrain.material_at(0, 63, 0), Material::Air);
        assert_eq!(terrain.top_height(0, 0), 62);
    }

    #[test]
    fn test_rolling_is_deterministic_and_bounded() {
        let a = Terrain::rolling(7);
        let b = Terrain::rolling(7);
        for i in -50..50 {
            let (x, z) = (i * 37, i * -53);
            let h = a.surface_height(x, z);
            assert_eq!(h, b.surface_height(x, z));
            assert!((40..=88).contains(&h), "height {h} out of band");
        }
    }
}
