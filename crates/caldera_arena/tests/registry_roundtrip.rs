//! Integration test for the arena registry and pool persistence.

use caldera_arena::{ArenaPool, ArenaRegistry, PoolSettings, ProvisionRequest};
use caldera_core::{Arena, ArenaId, GameConfig, Location};
use caldera_world::{MemoryWorld, Terrain};

fn temp_registry_path(tag: &str) -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_arenas_{tag}_{id}.toml"))
}

fn arena(id: &str, x: f64, used: bool) -> Arena {
    let mut arena = Arena::new(
        ArenaId::new(id),
        Location::new("caldera_world", x, 71.0, -x),
        200,
    );
    arena.used = used;
    arena
}

#[test]
fn test_registry_roundtrip_preserves_order() {
    let path = temp_registry_path("roundtrip");
    let registry = ArenaRegistry::new(&path);

    // More than ten entries so lexical key order would differ
    let available: Vec<Arena> = (0..12)
        .map(|i| arena(&format!("a{i}"), f64::from(i) * 100.0, false))
        .collect();
    let used = vec![arena("u0", 5.0, true), arena("u1", -5.0, true)];

    registry.save(&available, &used).unwrap();
    let contents = registry.load().unwrap();

    assert_eq!(contents.available, available);
    assert_eq!(contents.used, used);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_pool_survives_restart() {
    let path = temp_registry_path("restart");
    let mut config = GameConfig::default();
    config.seed = Some(7);
    config.world.border_initial_size = 20;
    config.provisioning.registry_file = path.to_string_lossy().into_owned();
    let settings = PoolSettings::from_config(&config);

    let mut world = MemoryWorld::new(20).with_generator(Terrain::flat(70));

    let released = {
        let mut pool = ArenaPool::open(settings.clone()).unwrap();
        let report = pool
            .provision_blocking(&mut world, ProvisionRequest::inline(3, 20))
            .unwrap();
        assert_eq!(report.accepted, 3);

        let first = pool.acquire().unwrap();
        pool.release(&first.id);
        first.id
    };

    let pool = ArenaPool::open(settings).unwrap();
    assert_eq!(pool.available_count(), 2);
    assert_eq!(pool.used_count(), 1);
    assert_eq!(pool.used()[0].id, released);
    assert!(pool.used()[0].used);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_in_use_arena_is_persisted_as_used() {
    let path = temp_registry_path("inuse");
    let mut config = GameConfig::default();
    config.provisioning.registry_file = path.to_string_lossy().into_owned();
    let settings = PoolSettings::from_config(&config);

    {
        let mut pool = ArenaPool::open(settings.clone()).unwrap();
        pool.add_available([arena("a", 0.0, false), arena("b", 1.0, false)])
            .unwrap();
        pool.acquire().unwrap();
        // Dropped mid-game without release
    }

    let pool = ArenaPool::open(settings).unwrap();
    assert_eq!(pool.available_count(), 1);
    assert_eq!(pool.used_count(), 1);
    assert_eq!(pool.used()[0].id.as_str(), "a");

    std::fs::remove_file(&path).ok();
}
