//! # Terrain Quality Tests
//!
//! Rolling terrain must offer both arena sites and sites the provisioner
//! rejects: dry walkable land, and flooded lowlands.

use caldera_core::{BlockPos, Material, WorldService};
use caldera_world::{MemoryWorld, Terrain};
use caldera_world::terrain::SEA_LEVEL;

/// Test: Rolling terrain mixes dry land and water.
#[test]
fn test_terrain_has_land_and_water() {
    let terrain = Terrain::rolling(42);

    let mut water = 0;
    let mut total = 0;
    for z in (-2000..2000).step_by(40) {
        for x in (-2000..2000).step_by(40) {
            if terrain.surface_height(x, z) < SEA_LEVEL {
                water += 1;
            }
            total += 1;
        }
    }

    let water_percentage = f64::from(water) / f64::from(total) * 100.0;
    println!("Flooded columns: {water_percentage:.1}%");

    assert!(water_percentage > 5.0, "Too little water: {water_percentage:.1}%");
    assert!(water_percentage < 80.0, "Too little land: {water_percentage:.1}%");
}

/// Test: Most of the terrain is gentle enough to spawn on.
#[test]
fn test_terrain_is_mostly_walkable() {
    let terrain = Terrain::rolling(42);

    let mut gentle = 0;
    let mut total = 0;
    for z in (-500..500).step_by(10) {
        for x in (-500..500).step_by(10) {
            let h1 = terrain.surface_height(x, z);
            let h2 = terrain.surface_height(x + 5, z);
            let h3 = terrain.surface_height(x, z + 5);

            let max_diff = (h1 - h2).abs().max((h1 - h3).abs()).max((h2 - h3).abs());
            if max_diff <= 4 {
                gentle += 1;
            }
            total += 1;
        }
    }

    let gentle_percentage = f64::from(gentle) / f64::from(total) * 100.0;
    println!("Gentle slopes: {gentle_percentage:.1}%");
    assert!(gentle_percentage > 25.0, "Terrain too rough: {gentle_percentage:.1}%");
}

/// Test: The same seed builds the same world.
#[test]
fn test_generated_worlds_are_deterministic() {
    let a = Terrain::rolling(7);
    let b = Terrain::rolling(7);
    let c = Terrain::rolling(8);

    let mut differs = false;
    for i in -50..50 {
        let (x, z) = (i * 37, i * -53);
        assert_eq!(a.surface_height(x, z), b.surface_height(x, z));
        differs |= a.surface_height(x, z) != c.surface_height(x, z);
    }
    assert!(differs, "Different seeds produced identical terrain");
}

/// Test: The world service reports what the terrain describes.
#[test]
fn test_world_queries_match_terrain() {
    let terrain = Terrain::rolling(42);
    let mut world = MemoryWorld::new(20);
    world.insert_world("w", terrain.clone());

    for i in -20..20 {
        let (x, z) = (i * 97, i * 31);
        let top = terrain.top_height(x, z);
        assert_eq!(world.highest_solid_elevation("w", x, z).unwrap(), top);

        let surface_material = world.read_cell("w", BlockPos::new(x, top, z)).unwrap();
        if terrain.surface_height(x, z) < SEA_LEVEL {
            assert_eq!(surface_material, Material::Water);
        } else {
            assert_eq!(surface_material, Material::Solid);
        }
        assert_eq!(
            world.read_cell("w", BlockPos::new(x, top + 1, z)).unwrap(),
            Material::Air
        );
    }
}
