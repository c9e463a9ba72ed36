//! # Game Session
//!
//! One game run, from lobby to lobby.
//!
//! ## Ownership
//!
//! ```text
//! Session
//! ├── Scheduler<SessionCore>        countdown, hazard, boundary, preload, status, pvp, ending
//! └── SessionCore
//!     ├── world: W (WorldService)
//!     ├── pool: ArenaPool
//!     ├── roster, hazard, containment
//!     └── state + pending triggers
//! ```
//!
//! Tasks only touch `SessionCore`. When a task wants a state change it
//! queues a `Trigger`; `Session::tick` applies queued triggers after the
//! scheduler step, through `fire`, which is the only place `state` changes.
//!
//! ## Tick Order
//!
//! 1. `world.on_tick()`
//! 2. Pool background work (cleanup slice, one provisioning step)
//! 3. Scheduled tasks (gated on the session running)
//! 4. Queued triggers

use std::collections::VecDeque;

use caldera_arena::{ArenaPool, ArenaResult, PoolSettings, ProvisionReport, ProvisionRequest};
use caldera_core::{
    Arena, ArenaId, GameConfig, GameMode, Location, PlayerId, RegionCoord, WorldService,
};
use crossbeam_channel::Receiver;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::containment::{ContainmentEngine, ContainmentPoll};
use crate::error::{StartError, TransitionError};
use crate::events::{should_announce, EventBus, SessionEvent};
use crate::hazard::{HazardEngine, HazardRaise};
use crate::roster::{Elimination, Roster};
use crate::scheduler::{Countdown, CountdownListener, Gate, Scheduler, TaskControl};
use crate::state::{next_state, SessionState, Trigger};
use crate::status::{StatusBoard, StatusSnapshot};

/// Lowest spawn elevation before the `+ 1`.
const MIN_SPAWN_ELEVATION: i32 = 64;

/// Everything scheduled tasks may touch.
struct SessionCore<W> {
    config: GameConfig,
    world: W,
    pool: ArenaPool,
    roster: Roster,
    hazard: HazardEngine,
    containment: ContainmentEngine,
    state: SessionState,
    arena: Option<Arena>,
    pvp: bool,
    elapsed_ticks: u64,
    pending: VecDeque<Trigger>,
    events: EventBus,
    status: StatusBoard,
    rng: ChaCha8Rng,
}

impl<W> Gate for SessionCore<W> {
    fn is_live(&self) -> bool {
        self.state.is_running()
    }
}

impl<W: WorldService> SessionCore<W> {
    /// World of the active arena, or the configured arena world.
    fn world_name(&self) -> String {
        self.arena
            .as_ref()
            .map_or_else(|| self.config.world.name.clone(), |a| a.world().to_string())
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            arena: self.arena.as_ref().map(|a| a.id.clone()),
            alive: self.roster.alive_count(),
            spectators: self.roster.spectator_count(),
            hazard_level: self.hazard.current(),
            elapsed_secs: self.elapsed_ticks / u64::from(self.config.tick_rate.max(1)),
            pvp: self.pvp,
            border_size: self.world.containment_size(&self.world_name()),
        }
    }

    fn publish_status(&self) {
        self.status.publish(self.snapshot());
    }

    /// World, center and radius the next hazard raise covers: the current
    /// boundary, never wider than the arena. `None` without an arena.
    fn hazard_area(&self) -> Option<(String, (f64, f64), f64)> {
        let arena = self.arena.as_ref()?;
        let world_name = arena.world().to_string();
        let center = self.world.containment_center(&world_name);
        let radius = (self.world.containment_size(&world_name) / 2.0)
            .min(f64::from(arena.radius()));
        Some((world_name, center, radius))
    }

    /// Random point within the spread distance of the arena center, on top
    /// of the terrain.
    fn spawn_point(&mut self, arena: &Arena) -> Location {
        let center = arena.origin.block();
        let spread = self.config.world.game_spread_distance.max(0);
        let x = center.x + self.rng.gen_range(-spread..=spread);
        let z = center.z + self.rng.gen_range(-spread..=spread);

        let ceiling = (self.config.world.max_height - 10).max(MIN_SPAWN_ELEVATION);
        let top = self
            .world
            .highest_solid_elevation(arena.world(), x, z)
            .unwrap_or(MIN_SPAWN_ELEVATION);
        let y = top.clamp(MIN_SPAWN_ELEVATION, ceiling) + 1;

        Location::new(
            arena.world(),
            f64::from(x) + 0.5,
            f64::from(y),
            f64::from(z) + 0.5,
        )
    }
}

/// Countdown output: one event per second, then the transition.
struct CountdownDisplay;

impl<W> CountdownListener<SessionCore<W>> for CountdownDisplay {
    fn on_tick(&mut self, core: &mut SessionCore<W>, remaining: u32) {
        core.events.emit(SessionEvent::CountdownTick {
            remaining,
            announce: should_announce(remaining),
        });
    }

    fn on_finish(&mut self, core: &mut SessionCore<W>) {
        core.pending.push_back(Trigger::CountdownFinished);
    }
}

/// The game session.
pub struct Session<W: WorldService + 'static> {
    scheduler: Scheduler<SessionCore<W>>,
    core: SessionCore<W>,
}

impl<W: WorldService + 'static> std::fmt::Debug for Session<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.core.state)
            .field("arena", &self.core.arena.as_ref().map(|a| &a.id))
            .field("alive", &self.core.roster.alive_count())
            .field("hazard", &self.core.hazard.current())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl<W: WorldService + 'static> Session<W> {
    /// Creates a session in `WAITING` over an existing pool.
    #[must_use]
    pub fn new(config: GameConfig, world: W, pool: ArenaPool) -> Self {
        let rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let core = SessionCore {
            hazard: HazardEngine::from_config(&config),
            containment: ContainmentEngine::from_config(&config),
            config,
            world,
            pool,
            roster: Roster::new(),
            state: SessionState::Waiting,
            arena: None,
            pvp: false,
            elapsed_ticks: 0,
            pending: VecDeque::new(),
            events: EventBus::default(),
            status: StatusBoard::new(),
            rng,
        };
        core.publish_status();
        Self {
            scheduler: Scheduler::new(),
            core,
        }
    }

    /// Creates a session whose pool is backed by the configured registry
    /// file.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the file exists but cannot be read.
    pub fn open(config: GameConfig, world: W) -> ArenaResult<Self> {
        let pool = ArenaPool::open(PoolSettings::from_config(&config))?;
        Ok(Self::new(config, world, pool))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts a session. Returns false if a guard fails; see `try_start`.
    pub fn start(&mut self) -> bool {
        match self.try_start() {
            Ok(()) => true,
            Err(e) => {
                info!(error = %e, "Session not started");
                false
            }
        }
    }

    /// Starts a session, reporting why it could not.
    ///
    /// # Errors
    ///
    /// Every `StartError` leaves the session in `WAITING` with the pool as
    /// it was.
    pub fn try_start(&mut self) -> Result<(), StartError> {
        if self.core.state != SessionState::Waiting {
            return Err(StartError::NotWaiting(self.core.state));
        }

        let online = self.core.world.online_players();
        let required = self.core.config.game.min_players;
        if online.len() < required {
            return Err(StartError::NotEnoughPlayers {
                online: online.len(),
                required,
            });
        }

        let arena = self.core.pool.acquire()?;
        if !self.core.world.world_exists(arena.world()) {
            self.core.pool.restore(&arena.id);
            return Err(StartError::WorldUnavailable(arena.world().to_string()));
        }

        self.core.arena = Some(arena);
        self.core.roster.begin(online);
        if let Err(rejected) = self.fire(Trigger::Start) {
            return Err(StartError::NotWaiting(rejected.from));
        }
        Ok(())
    }

    /// Ends the session and returns everyone to the lobby.
    ///
    /// Returns false when nothing is running.
    pub fn stop(&mut self) -> bool {
        if !self.core.state.is_running() {
            return false;
        }
        if self.fire(Trigger::Stop).is_err() {
            return false;
        }
        self.fire(Trigger::Reset).is_ok()
    }

    /// Runs one scheduler tick.
    pub fn tick(&mut self) {
        self.core.world.on_tick();

        if let Some(report) = self.core.pool.pump(&mut self.core.world) {
            self.core.events.emit(SessionEvent::ArenasProvisioned(report));
        }

        if self.core.state.is_running() {
            self.core.elapsed_ticks += 1;
        }
        self.scheduler.tick(&mut self.core);
        self.drain_pending();
    }

    /// Applies every queued trigger.
    fn drain_pending(&mut self) {
        while let Some(trigger) = self.core.pending.pop_front() {
            if trigger == Trigger::Stop {
                self.stop();
            } else {
                // Rejections are logged by fire
                let _ = self.fire(trigger);
            }
        }
    }

    /// The single transition dispatcher.
    fn fire(&mut self, trigger: Trigger) -> Result<SessionState, TransitionError> {
        let from = self.core.state;
        let Some(to) = next_state(from, trigger) else {
            warn!(state = %from, ?trigger, "Transition rejected");
            return Err(TransitionError { from, trigger });
        };

        info!(from = %from, to = %to, ?trigger, "Session state change");
        self.core.state = to;

        match to {
            SessionState::Starting => self.enter_starting(),
            SessionState::Active => self.enter_active(),
            SessionState::PvpEnabled => self.enter_pvp(),
            SessionState::Ending => self.enter_ending(),
            SessionState::Ended => self.enter_ended(),
            SessionState::Waiting => self.core.publish_status(),
        }
        Ok(to)
    }

    // =========================================================================
    // State entry actions
    // =========================================================================

    fn enter_starting(&mut self) {
        let Some(arena) = self.core.arena.clone() else {
            warn!("Entered STARTING without an arena");
            self.core.pending.push_back(Trigger::Stop);
            return;
        };
        let world_name = arena.world().to_string();
        let core = &mut self.core;

        core.elapsed_ticks = 0;
        core.pvp = false;
        core.hazard.reset();
        core.world.set_pvp(&world_name, false);
        core.containment.configure(
            &mut core.world,
            &world_name,
            (arena.origin.x, arena.origin.z),
            f64::from(arena.size),
        );

        for player in core.roster.alive_ids() {
            let spawn = core.spawn_point(&arena);
            if let Err(e) = core.world.teleport(player, &spawn) {
                warn!(%player, error = %e, "Could not move player into the arena");
            }
            core.world.set_game_mode(player, GameMode::Survival);
        }

        let second = u64::from(core.config.tick_rate);
        let shrink_delay = core.config.ticks(core.config.world.shrink_delay);
        let countdown = core.config.game.initial_countdown;
        let regions_per_tick = core.config.world.regions_per_tick;
        let regions = arena
            .center_region()
            .square(core.config.world.preload_radius.max(0));

        self.scheduler.schedule_repeating(
            "countdown",
            0,
            second,
            Countdown::new(countdown, CountdownDisplay),
        );
        self.scheduler.schedule_repeating(
            "containment",
            shrink_delay,
            second,
            |core: &mut SessionCore<W>| containment_task(core),
        );
        self.schedule_preload(world_name, regions, regions_per_tick);
        if self.core.config.status.enabled {
            self.scheduler.schedule_repeating(
                "status",
                0,
                self.core.config.status.update_interval,
                |core: &mut SessionCore<W>| {
                    core.publish_status();
                    TaskControl::Continue
                },
            );
        }

        self.core.events.emit(SessionEvent::SessionStarted {
            arena: arena.id.clone(),
            players: self.core.roster.alive_count(),
        });
        info!(
            arena = %arena.id,
            players = self.core.roster.alive_count(),
            "Game starting"
        );
        self.core.publish_status();
    }

    fn schedule_preload(&mut self, world_name: String, regions: Vec<RegionCoord>, per_tick: usize) {
        let mut next = 0;
        self.scheduler.schedule_repeating(
            "preload",
            0,
            1,
            move |core: &mut SessionCore<W>| {
                let end = (next + per_tick).min(regions.len());
                for region in &regions[next..end] {
                    if let Err(e) = core.world.load_region(&world_name, *region) {
                        debug!(x = region.x, z = region.z, error = %e, "Region preload failed");
                    }
                }
                next = end;
                if next >= regions.len() {
                    debug!(regions = regions.len(), "Arena regions preloaded");
                    TaskControl::Cancel
                } else {
                    TaskControl::Continue
                }
            },
        );
    }

    fn enter_active(&mut self) {
        self.core.events.emit(SessionEvent::CountdownCleared);
        self.core.events.emit(SessionEvent::HazardRising {
            level: self.core.hazard.current(),
        });
        info!(level = self.core.hazard.current(), "Lava is rising");

        let interval = self.core.config.ticks(self.core.config.game.hazard_rise_interval);
        let budget = self.core.config.game.sweep_blocks_per_tick;
        let mut until_next = 0u64;
        self.scheduler.schedule_repeating(
            "hazard",
            0,
            1,
            move |core: &mut SessionCore<W>| hazard_task(core, &mut until_next, interval, budget),
        );

        let pvp_delay = self.core.config.ticks(self.core.config.game.pvp_countdown);
        self.scheduler
            .schedule_once("pvp", pvp_delay, |core: &mut SessionCore<W>| {
                if core.state == SessionState::Active {
                    core.pending.push_back(Trigger::PvpTimerElapsed);
                }
                TaskControl::Cancel
            });

        // Players may have dropped out during the countdown
        match self.core.roster.outcome() {
            Elimination::Winner(_) => self.core.pending.push_back(Trigger::WinnerDetected),
            Elimination::NoSurvivors => self.core.pending.push_back(Trigger::Stop),
            Elimination::Continue(_) | Elimination::NotAlive => {}
        }
        self.core.publish_status();
    }

    fn enter_pvp(&mut self) {
        let world_name = self.core.world_name();
        self.core.world.set_pvp(&world_name, true);
        self.core.pvp = true;
        self.core.events.emit(SessionEvent::PvpEnabled);
        info!(world = %world_name, "PvP enabled");
        self.core.publish_status();
    }

    fn enter_ending(&mut self) {
        if let Elimination::Winner(player) = self.core.roster.outcome() {
            self.core.events.emit(SessionEvent::Winner { player });
            info!(%player, "Winner");
        }
        let delay = self.core.config.game.ending_delay_ticks;
        self.scheduler
            .schedule_once("ending", delay, |core: &mut SessionCore<W>| {
                core.pending.push_back(Trigger::Stop);
                TaskControl::Cancel
            });
        self.core.publish_status();
    }

    fn enter_ended(&mut self) {
        self.scheduler.cancel_all();
        let core = &mut self.core;
        core.pending.clear();

        if let Some(arena) = core.arena.take() {
            core.world.set_pvp(arena.world(), false);
            core.pool.release(&arena.id);
        }

        let lobby = core.config.lobby.location();
        for player in core.roster.all_ids() {
            if let Err(e) = core.world.teleport(player, &lobby) {
                debug!(%player, error = %e, "Could not return player to the lobby");
            }
            core.world.set_game_mode(player, GameMode::Survival);
        }

        core.roster.reset();
        core.hazard.reset();
        core.containment.reset();
        core.pvp = false;
        core.elapsed_ticks = 0;
        core.events.emit(SessionEvent::SessionEnded);
        info!("Game stopped");
    }

    // =========================================================================
    // Players
    // =========================================================================

    /// Eliminates an alive player. Returns false if the player was not
    /// alive.
    pub fn eliminate(&mut self, player: PlayerId) -> bool {
        let outcome = self.core.roster.eliminate(player);
        if outcome == Elimination::NotAlive {
            return false;
        }

        self.core.world.set_game_mode(player, GameMode::Spectator);
        let remaining = self.core.roster.alive_count();
        self.core
            .events
            .emit(SessionEvent::PlayerEliminated { player, remaining });
        info!(%player, remaining, "Player eliminated");

        match outcome {
            Elimination::NoSurvivors => {
                self.stop();
            }
            Elimination::Winner(_) if self.core.state.is_playing() => {
                let _ = self.fire(Trigger::WinnerDetected);
            }
            _ => {}
        }
        true
    }

    /// Adds a spectator to the running session.
    ///
    /// Returns false when nothing is running or the player is already in
    /// the roster.
    pub fn add_spectator(&mut self, player: PlayerId) -> bool {
        if !self.core.state.is_running() || !self.core.roster.add_spectator(player) {
            return false;
        }

        let world_name = self.core.world_name();
        match self.core.world.spawn_location(&world_name) {
            Some(spawn) => {
                if let Err(e) = self.core.world.teleport(player, &spawn) {
                    warn!(%player, error = %e, "Could not move spectator");
                }
            }
            None => warn!(world = %world_name, "Arena world has no spawn point"),
        }
        self.core.world.set_game_mode(player, GameMode::Spectator);
        self.core.events.emit(SessionEvent::SpectatorJoined { player });
        true
    }

    /// A player left the server. Alive players are eliminated first.
    ///
    /// Returns false if the player was not in the roster.
    pub fn disconnect(&mut self, player: PlayerId) -> bool {
        let was_alive = self.core.roster.is_alive(player);
        if was_alive {
            self.eliminate(player);
        }
        let removed = self.core.roster.remove(player);
        was_alive || removed
    }

    // =========================================================================
    // Arenas
    // =========================================================================

    /// Takes an arena out of the pool by hand.
    ///
    /// # Errors
    ///
    /// As [`ArenaPool::acquire`].
    pub fn acquire_arena(&mut self) -> ArenaResult<Arena> {
        self.core.pool.acquire()
    }

    /// Releases a hand-acquired arena. The arena hosting the running session
    /// is released by `stop` and refused here.
    pub fn release_arena(&mut self, id: &ArenaId) -> bool {
        if self.core.arena.as_ref().is_some_and(|a| &a.id == id) {
            warn!(arena = %id, "Arena is hosting the running session");
            return false;
        }
        self.core.pool.release(id)
    }

    /// Starts a background provisioning run for `count` arenas.
    ///
    /// Returns false if a run is already active or the world cannot be
    /// created.
    pub fn provision_arenas(&mut self, count: usize) -> bool {
        let request = ProvisionRequest::background(count, self.core.pool.settings());
        match self.core.pool.begin_provisioning(&mut self.core.world, request) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Provisioning not started");
                false
            }
        }
    }

    /// Provisions on the calling thread and waits for the result.
    ///
    /// # Errors
    ///
    /// As [`ArenaPool::provision_blocking`].
    pub fn provision_arenas_now(
        &mut self,
        count: usize,
        attempt_budget: usize,
    ) -> ArenaResult<ProvisionReport> {
        let report = self.core.pool.provision_blocking(
            &mut self.core.world,
            ProvisionRequest::inline(count, attempt_budget),
        )?;
        self.core
            .events
            .emit(SessionEvent::ArenasProvisioned(report.clone()));
        Ok(report)
    }

    /// Runs every pending arena cleanup to completion, for shutdown.
    pub fn finish_cleanups(&mut self) {
        self.core.pool.finish_cleanups(&mut self.core.world);
    }

    // =========================================================================
    // Hazard
    // =========================================================================

    /// Raises the hazard one step and sweeps it to completion. A sweep the
    /// hazard task has in progress is finished instead.
    ///
    /// Returns `None` when no session holds an arena or the ceiling is
    /// reached.
    pub fn raise_hazard(&mut self) -> Option<HazardRaise> {
        if !self.core.state.is_running() {
            return None;
        }
        if !self.core.hazard.is_sweeping() {
            let (world_name, center, radius) = self.core.hazard_area()?;
            self.core.hazard.begin_raise(&world_name, center, radius)?;
        }
        let raise = self.core.hazard.step(&mut self.core.world, usize::MAX)?;
        self.core.events.emit(SessionEvent::HazardRaised {
            level: raise.to,
            converted: raise.converted,
            failures: raise.failures,
        });
        Some(raise)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.core.state
    }

    /// Current hazard level.
    #[must_use]
    pub fn hazard_level(&self) -> i32 {
        self.core.hazard.current()
    }

    /// Sorted alive players.
    #[must_use]
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.core.roster.alive_ids()
    }

    /// Sorted spectators.
    #[must_use]
    pub fn spectator_ids(&self) -> Vec<PlayerId> {
        self.core.roster.spectator_ids()
    }

    /// Arenas left in the pool.
    #[must_use]
    pub fn available_arena_count(&self) -> usize {
        self.core.pool.available_count()
    }

    /// Arenas that have hosted a session.
    #[must_use]
    pub fn used_arena_count(&self) -> usize {
        self.core.pool.used_count()
    }

    /// Boundary size of the arena world.
    #[must_use]
    pub fn containment_size(&self) -> f64 {
        self.core.world.containment_size(&self.core.world_name())
    }

    /// Returns true while PvP damage is on.
    #[must_use]
    pub fn is_pvp_enabled(&self) -> bool {
        self.core.pvp
    }

    /// Arena hosting the session.
    #[must_use]
    pub fn arena(&self) -> Option<&Arena> {
        self.core.arena.as_ref()
    }

    /// A fresh status snapshot.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.core.snapshot()
    }

    /// Shared status board, refreshed by the status task.
    #[must_use]
    pub fn status_board(&self) -> StatusBoard {
        self.core.status.clone()
    }

    /// Receiving end of the event bus.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.core.events.subscribe()
    }

    /// Removes and returns every queued event.
    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.core.events.drain()
    }

    /// Returns true if a task with this name is scheduled.
    #[must_use]
    pub fn has_task(&self, name: &str) -> bool {
        self.scheduler.has_task(name)
    }

    /// Number of scheduled tasks.
    #[must_use]
    pub fn scheduled_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.core.config
    }

    /// The arena pool.
    #[must_use]
    pub fn pool(&self) -> &ArenaPool {
        &self.core.pool
    }

    /// Mutable arena pool, for seeding and maintenance.
    pub fn pool_mut(&mut self) -> &mut ArenaPool {
        &mut self.core.pool
    }

    /// The world backend.
    #[must_use]
    pub fn world(&self) -> &W {
        &self.core.world
    }

    /// Mutable world backend.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.core.world
    }
}

/// Requests the shrink on its first run, then watches for it to finish.
fn containment_task<W: WorldService>(core: &mut SessionCore<W>) -> TaskControl {
    let world_name = core.world_name();
    if core.containment.begin_shrink(&mut core.world, &world_name) {
        core.events.emit(SessionEvent::ShrinkStarted {
            target: core.containment.final_size(),
            duration_secs: core.containment.duration_secs(),
        });
    }

    match core.containment.poll(&core.world, &world_name) {
        ContainmentPoll::Settled(size) => {
            core.events.emit(SessionEvent::ContainmentSettled { size });
            TaskControl::Cancel
        }
        ContainmentPoll::Shrinking(_) | ContainmentPoll::Idle => TaskControl::Continue,
    }
}

/// Starts a raise every `interval` ticks and sweeps `budget` blocks per
/// tick until the ceiling.
fn hazard_task<W: WorldService>(
    core: &mut SessionCore<W>,
    until_next: &mut u64,
    interval: u64,
    budget: usize,
) -> TaskControl {
    if !core.state.is_playing() {
        return TaskControl::Cancel;
    }

    if !core.hazard.is_sweeping() {
        if core.hazard.is_peaked() {
            core.events.emit(SessionEvent::HazardPeaked {
                level: core.hazard.current(),
            });
            return TaskControl::Cancel;
        }
        if *until_next == 0 {
            let Some((world_name, center, radius)) = core.hazard_area() else {
                return TaskControl::Cancel;
            };
            if core.hazard.begin_raise(&world_name, center, radius).is_some() {
                *until_next = interval;
            }
        }
    }
    *until_next = until_next.saturating_sub(1);

    if let Some(raise) = core.hazard.step(&mut core.world, budget) {
        core.events.emit(SessionEvent::HazardRaised {
            level: raise.to,
            converted: raise.converted,
            failures: raise.failures,
        });
        if core.hazard.is_peaked() {
            info!(level = raise.to, "Lava reached the maximum height");
            core.events.emit(SessionEvent::HazardPeaked { level: raise.to });
            return TaskControl::Cancel;
        }
    }
    TaskControl::Continue
}
