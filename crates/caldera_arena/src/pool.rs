//! # Arena Pool
//!
//! The inventory of arenas and the only owner of arena records.
//!
//! ## Invariants
//!
//! - Every arena is in exactly one of `available`, `in_use`, `used`
//! - At most one arena is in use
//! - Every mutation is persisted before the call returns
//!
//! ## Tick Work
//!
//! `pump` advances the background jobs (one cleanup slice, one provisioning
//! step). It is called once per scheduler tick whether or not a session is
//! running.

use std::collections::VecDeque;
use std::path::PathBuf;

use caldera_core::{Arena, ArenaId, GameConfig, ProvisioningSection, WorldService, WorldSettings};
use tracing::{error, info, warn};

use crate::cleanup::CleanupJob;
use crate::error::{ArenaError, ArenaResult};
use crate::provision::{CandidateFeed, CandidateGenerator, ProvisionReport, ProvisionRun};
use crate::registry::ArenaRegistry;

/// Pool settings, derived from `GameConfig`.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolSettings {
    /// World new arenas are provisioned in.
    pub world_name: String,
    /// Boundary size given to new arenas.
    pub arena_size: u32,
    /// Top of the cleanup sweep.
    pub max_height: i32,
    /// Columns the cleanup scans per tick.
    pub cleanup_columns_per_tick: usize,
    /// Fixed seed for candidates and world creation.
    pub seed: Option<u64>,
    /// Provisioning parameters.
    pub provisioning: ProvisioningSection,
}

impl PoolSettings {
    /// Extracts the pool settings from a config.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            world_name: config.world.name.clone(),
            arena_size: config.world.border_initial_size,
            max_height: config.world.max_height,
            cleanup_columns_per_tick: config.world.cleanup_columns_per_tick,
            seed: config.seed,
            provisioning: config.provisioning.clone(),
        }
    }

    /// Registry path from the config.
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        PathBuf::from(&self.provisioning.registry_file)
    }
}

/// A provisioning request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Arenas wanted.
    pub count: usize,
    /// Candidates to examine at most.
    pub attempt_budget: usize,
    /// Delete and recreate the arena world first.
    pub fresh_world: bool,
    /// Generate candidates on a worker thread.
    pub background: bool,
}

impl ProvisionRequest {
    /// Background request for `count` arenas with the configured budget.
    #[must_use]
    pub fn background(count: usize, settings: &PoolSettings) -> Self {
        Self {
            count,
            attempt_budget: settings.provisioning.attempt_budget,
            fresh_world: false,
            background: true,
        }
    }

    /// Inline request, for blocking runs.
    #[must_use]
    pub const fn inline(count: usize, attempt_budget: usize) -> Self {
        Self {
            count,
            attempt_budget,
            fresh_world: false,
            background: false,
        }
    }

    /// Recreates the arena world before provisioning.
    #[must_use]
    pub const fn with_fresh_world(mut self) -> Self {
        self.fresh_world = true;
        self
    }
}

/// The arena pool.
#[derive(Debug)]
pub struct ArenaPool {
    settings: PoolSettings,
    registry: Option<ArenaRegistry>,
    available: Vec<Arena>,
    in_use: Option<Arena>,
    used: Vec<Arena>,
    cleanup: VecDeque<CleanupJob>,
    provisioning: Option<ProvisionRun>,
    runs: u64,
}

impl ArenaPool {
    /// Opens the pool backed by the registry at `settings.registry_path()`.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the file exists but cannot be read.
    pub fn open(settings: PoolSettings) -> ArenaResult<Self> {
        let registry = ArenaRegistry::new(settings.registry_path());
        let contents = registry.load()?;

        let pool = Self {
            settings,
            registry: Some(registry),
            available: contents.available,
            in_use: None,
            used: contents.used,
            cleanup: VecDeque::new(),
            provisioning: None,
            runs: 0,
        };
        info!(
            available = pool.available.len(),
            used = pool.used.len(),
            "Loaded arena registry"
        );
        pool.check_inventory();
        Ok(pool)
    }

    /// Creates a pool that never touches the disk.
    #[must_use]
    pub fn in_memory(settings: PoolSettings) -> Self {
        Self {
            settings,
            registry: None,
            available: Vec::new(),
            in_use: None,
            used: Vec::new(),
            cleanup: VecDeque::new(),
            provisioning: None,
            runs: 0,
        }
    }

    /// Pool settings.
    #[must_use]
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Arenas that can be acquired, in acquisition order.
    #[must_use]
    pub fn available(&self) -> &[Arena] {
        &self.available
    }

    /// Arenas that have hosted a session.
    #[must_use]
    pub fn used(&self) -> &[Arena] {
        &self.used
    }

    /// The arena currently in use.
    #[must_use]
    pub fn in_use(&self) -> Option<&Arena> {
        self.in_use.as_ref()
    }

    /// Number of available arenas.
    #[inline]
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Number of used arenas.
    #[inline]
    #[must_use]
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Returns true while a provisioning run is active.
    #[inline]
    #[must_use]
    pub fn is_provisioning(&self) -> bool {
        self.provisioning.is_some()
    }

    /// Cleanups not yet finished.
    #[inline]
    #[must_use]
    pub fn pending_cleanups(&self) -> usize {
        self.cleanup.len()
    }

    /// Adds arenas to the end of the available collection.
    ///
    /// # Errors
    ///
    /// Returns the registry error if persisting fails.
    pub fn add_available(&mut self, arenas: impl IntoIterator<Item = Arena>) -> ArenaResult<()> {
        self.available.extend(arenas);
        self.persist()
    }

    /// Takes the first available arena and marks it in use.
    ///
    /// # Errors
    ///
    /// `AlreadyInUse` if an arena is in use, `ResourceExhausted` if none is
    /// available. Neither changes the pool.
    pub fn acquire(&mut self) -> ArenaResult<Arena> {
        if let Some(current) = &self.in_use {
            return Err(ArenaError::AlreadyInUse(current.id.clone()));
        }
        if self.available.is_empty() {
            return Err(ArenaError::ResourceExhausted);
        }

        let arena = self.available.remove(0);
        info!(arena = %arena.id, "Arena acquired");
        self.in_use = Some(arena.clone());
        self.persist_logged();
        Ok(arena)
    }

    /// Puts the in-use arena back at the front of the available collection.
    ///
    /// Returns false if `id` is not the arena in use.
    pub fn restore(&mut self, id: &ArenaId) -> bool {
        match self.in_use.take() {
            Some(arena) if &arena.id == id => {
                info!(arena = %arena.id, "Arena returned unused");
                self.available.insert(0, arena);
                self.persist_logged();
                true
            }
            other => {
                self.in_use = other;
                false
            }
        }
    }

    /// Moves the in-use arena to `used` and queues its cleanup.
    ///
    /// Releasing an arena that is already used is a no-op. Returns true if
    /// the arena was released by this call.
    pub fn release(&mut self, id: &ArenaId) -> bool {
        let mut arena = match self.in_use.take() {
            Some(arena) if &arena.id == id => arena,
            other => {
                self.in_use = other;
                if !self.used.iter().any(|a| &a.id == id) {
                    warn!(arena = %id, "Release of an arena that is not in use");
                }
                return false;
            }
        };

        arena.used = true;
        info!(arena = %arena.id, "Arena marked as used");
        self.cleanup
            .push_back(CleanupJob::new(&arena, self.settings.max_height));
        self.used.push(arena);
        self.persist_logged();
        self.check_inventory();
        true
    }

    /// Starts a provisioning run. Its progress is driven by `pump`.
    ///
    /// The arena world is created when missing. With `fresh_world` it is
    /// deleted first, and every available arena that lived in it is retired
    /// into `used`.
    ///
    /// # Errors
    ///
    /// `ProvisioningInProgress` if a run is active; world errors if the world
    /// cannot be created.
    pub fn begin_provisioning<W: WorldService + ?Sized>(
        &mut self,
        world: &mut W,
        request: ProvisionRequest,
    ) -> ArenaResult<()> {
        if self.provisioning.is_some() {
            return Err(ArenaError::ProvisioningInProgress);
        }

        let name = self.settings.world_name.clone();
        if request.fresh_world && world.world_exists(&name) {
            world.delete_world(&name)?;
            self.retire_world(&name);
        }
        if !world.world_exists(&name) {
            let settings = WorldSettings {
                seed: self.settings.seed.unwrap_or_else(rand::random),
                ..WorldSettings::default()
            };
            world.create_world(&name, &settings)?;
            info!(world = %name, "Created arena world");
        }

        let run = self.runs;
        self.runs += 1;
        let seed = self.settings.seed.map(|s| s.wrapping_add(run));
        let generator = CandidateGenerator::new(
            seed,
            self.settings.provisioning.coordinate_range,
            request.attempt_budget,
        );
        let feed = if request.background {
            CandidateFeed::spawn(generator)
        } else {
            CandidateFeed::Inline(generator)
        };

        info!(
            world = %name,
            requested = request.count,
            budget = request.attempt_budget,
            "Provisioning arenas"
        );
        self.provisioning = Some(ProvisionRun::new(
            name,
            self.settings.arena_size,
            request.count,
            run,
            feed,
            self.settings.provisioning.clone(),
        ));
        Ok(())
    }

    /// Runs a provisioning request to completion on the calling thread.
    ///
    /// # Errors
    ///
    /// As [`ArenaPool::begin_provisioning`].
    pub fn provision_blocking<W: WorldService + ?Sized>(
        &mut self,
        world: &mut W,
        request: ProvisionRequest,
    ) -> ArenaResult<ProvisionReport> {
        self.begin_provisioning(world, ProvisionRequest { background: false, ..request })?;
        loop {
            if let Some(report) = self.step_provisioning(world, usize::MAX) {
                return Ok(report);
            }
        }
    }

    /// Advances background work by one tick.
    ///
    /// Returns the report of a provisioning run that finished during this
    /// call.
    pub fn pump<W: WorldService + ?Sized>(&mut self, world: &mut W) -> Option<ProvisionReport> {
        if let Some(job) = self.cleanup.front_mut() {
            if job.step(world, self.settings.cleanup_columns_per_tick) {
                self.cleanup.pop_front();
            }
        }
        let candidates = self.settings.provisioning.candidates_per_tick;
        self.step_provisioning(world, candidates)
    }

    fn step_provisioning<W: WorldService + ?Sized>(
        &mut self,
        world: &mut W,
        candidates: usize,
    ) -> Option<ProvisionReport> {
        let run = self.provisioning.as_mut()?;
        if !run.step(world, candidates) {
            return None;
        }

        let run = self.provisioning.take()?;
        let (arenas, report) = run.finish();
        if report.is_partial() {
            warn!(
                accepted = report.accepted,
                requested = report.requested,
                attempts = report.attempts,
                "Could only create {} arenas out of {}",
                report.accepted,
                report.requested
            );
        }
        self.available.extend(arenas);
        self.persist_logged();
        info!(
            created = report.accepted,
            available = self.available.len(),
            "Provisioning complete"
        );
        Some(report)
    }

    /// Runs every pending cleanup to completion.
    pub fn finish_cleanups<W: WorldService + ?Sized>(&mut self, world: &mut W) {
        while let Some(mut job) = self.cleanup.pop_front() {
            while !job.step(world, usize::MAX) {}
        }
    }

    /// Logs how many arenas are left.
    pub fn check_inventory(&self) {
        match self.available.len() {
            0 => warn!("No arenas available! Provision new arenas before the next game"),
            n @ 1..=2 => warn!(available = n, "Only {} arenas remaining", n),
            n => info!(available = n, "Arenas available"),
        }
    }

    fn retire_world(&mut self, world: &str) {
        let (retired, kept): (Vec<Arena>, Vec<Arena>) = self
            .available
            .drain(..)
            .partition(|arena| arena.world() == world);
        self.available = kept;
        if !retired.is_empty() {
            info!(count = retired.len(), world, "Retired arenas of deleted world");
        }
        self.used.extend(retired.into_iter().map(|mut arena| {
            arena.used = true;
            arena
        }));
    }

    /// Used collection as persisted: the in-use arena counts as used so a
    /// crash mid-game never hands it out again.
    fn persisted_used(&self) -> Vec<Arena> {
        let mut used = self.used.clone();
        if let Some(current) = &self.in_use {
            let mut current = current.clone();
            current.used = true;
            used.push(current);
        }
        used
    }

    fn persist(&self) -> ArenaResult<()> {
        match &self.registry {
            Some(registry) => registry.save(&self.available, &self.persisted_used()),
            None => Ok(()),
        }
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            error!(error = %e, "Could not save arena registry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caldera_core::{Location, Material};
    use caldera_world::{MemoryWorld, Terrain};
    use std::collections::HashSet;

    fn settings() -> PoolSettings {
        let mut config = GameConfig::default();
        config.seed = Some(42);
        config.world.border_initial_size = 20;
        PoolSettings::from_config(&config)
    }

    fn arena(id: &str) -> Arena {
        Arena::new(ArenaId::new(id), Location::new("caldera_world", 0.0, 65.0, 0.0), 20)
    }

    fn pool_with(ids: &[&str]) -> ArenaPool {
        let mut pool = ArenaPool::in_memory(settings());
        pool.add_available(ids.iter().map(|id| arena(id))).unwrap();
        pool
    }

    #[test]
    fn test_acquire_takes_first() {
        let mut pool = pool_with(&["a", "b"]);
        let first = pool.acquire().unwrap();
        assert_eq!(first.id.as_str(), "a");
        assert_eq!(pool.available_count(), 1);
        assert_eq!(pool.in_use().map(|a| a.id.as_str()), Some("a"));
    }

    #[test]
    fn test_acquire_exclusive() {
        let mut pool = pool_with(&["a", "b"]);
        pool.acquire().unwrap();
        assert!(matches!(pool.acquire(), Err(ArenaError::AlreadyInUse(_))));
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_acquire_empty() {
        let mut pool = pool_with(&[]);
        assert!(matches!(pool.acquire(), Err(ArenaError::ResourceExhausted)));
        assert!(pool.in_use().is_none());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut pool = pool_with(&["a"]);
        let a = pool.acquire().unwrap();
        assert!(pool.release(&a.id));
        assert!(!pool.release(&a.id));
        assert_eq!(pool.used_count(), 1);
        assert!(pool.used()[0].used);
        assert_eq!(pool.pending_cleanups(), 1);
    }

    #[test]
    fn test_restore_puts_arena_back_first() {
        let mut pool = pool_with(&["a", "b"]);
        let a = pool.acquire().unwrap();
        assert!(pool.restore(&a.id));
        assert_eq!(pool.available()[0].id.as_str(), "a");
        assert_eq!(pool.available_count(), 2);
        assert!(!pool.restore(&a.id));
    }

    #[test]
    fn test_pump_runs_cleanup() {
        let mut world = MemoryWorld::new(20);
        world.insert_world("caldera_world", Terrain::flat(64));
        world
            .set_cell("caldera_world", caldera_core::BlockPos::new(1, 65, 1), Material::Lava)
            .unwrap();

        let mut pool = pool_with(&["a"]);
        let a = pool.acquire().unwrap();
        pool.release(&a.id);
        while pool.pending_cleanups() > 0 {
            pool.pump(&mut world);
        }
        assert_eq!(world.count_material("caldera_world", Material::Lava), 0);
    }

    #[test]
    fn test_finish_cleanups_after_partial_pump() {
        let mut world = MemoryWorld::new(20);
        world.insert_world("caldera_world", Terrain::flat(64));
        world
            .set_cell("caldera_world", caldera_core::BlockPos::new(-3, 66, 2), Material::Lava)
            .unwrap();

        let mut settings = settings();
        settings.cleanup_columns_per_tick = 1;
        let mut pool = ArenaPool::in_memory(settings);
        pool.add_available([arena("a")]).unwrap();

        let a = pool.acquire().unwrap();
        pool.release(&a.id);
        assert!(pool.pump(&mut world).is_none());
        assert_eq!(pool.pending_cleanups(), 1);

        pool.finish_cleanups(&mut world);
        assert_eq!(pool.pending_cleanups(), 0);
        assert_eq!(world.count_material("caldera_world", Material::Lava), 0);
    }

    #[test]
    fn test_provision_creates_world() {
        let mut world = MemoryWorld::new(20).with_generator(Terrain::flat(70));
        let mut pool = ArenaPool::in_memory(settings());

        let report = pool
            .provision_blocking(&mut world, ProvisionRequest::inline(4, 100))
            .unwrap();
        assert!(world.world_exists("caldera_world"));
        assert_eq!(report.accepted, 4);
        assert_eq!(pool.available_count(), 4);
        assert!(pool.available().iter().all(|a| a.size == 20));
    }

    #[test]
    fn test_back_to_back_runs_get_distinct_ids() {
        let mut world = MemoryWorld::new(20).with_generator(Terrain::flat(70));
        let mut pool = ArenaPool::in_memory(settings());

        for _ in 0..2 {
            let report = pool
                .provision_blocking(&mut world, ProvisionRequest::inline(2, 100))
                .unwrap();
            assert_eq!(report.accepted, 2);
        }

        let ids: HashSet<&str> = pool.available().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_fresh_world_retires_old_arenas() {
        let mut world = MemoryWorld::new(20).with_generator(Terrain::flat(70));
        world.insert_world("caldera_world", Terrain::flat(70));
        let mut pool = pool_with(&["old"]);

        let report = pool
            .provision_blocking(&mut world, ProvisionRequest::inline(2, 10).with_fresh_world())
            .unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(pool.used_count(), 1);
        assert_eq!(pool.used()[0].id.as_str(), "old");
        assert!(pool.available().iter().all(|a| a.id.as_str() != "old"));
    }

    #[test]
    fn test_second_run_rejected_while_active() {
        let mut world = MemoryWorld::new(20).with_generator(Terrain::flat(70));
        let mut pool = ArenaPool::in_memory(settings());
        pool.begin_provisioning(&mut world, ProvisionRequest::inline(1, 10))
            .unwrap();
        assert!(matches!(
            pool.begin_provisioning(&mut world, ProvisionRequest::inline(1, 10)),
            Err(ArenaError::ProvisioningInProgress)
        ));
        assert!(pool.pump(&mut world).is_some());
        assert!(!pool.is_provisioning());
    }
}
