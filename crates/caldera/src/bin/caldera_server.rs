//! # CALDERA Server
//!
//! Headless server over the in-memory world.
//!
//! Provisions arenas if the registry is short, connects a handful of
//! simulated players, runs one game to completion and exits. Players die
//! when the lava reaches the cell they stand in.
//!
//! ```bash
//! # Defaults
//! ./caldera_server
//!
//! # With a config file and more logging
//! RUST_LOG=debug ./caldera_server caldera.toml
//! ```

use caldera::engine::SessionEvent;
use caldera::{init_logging, GameConfig, MemoryWorld, PlayerId, Session, SessionState, Terrain, TickLoop};
use tracing::{error, info, warn};

/// Seconds between progress lines.
const REPORT_EVERY_SECS: u64 = 30;

fn load_config() -> Option<GameConfig> {
    let Some(path) = std::env::args().nth(1) else {
        info!("No config file given, using defaults");
        return Some(GameConfig::default());
    };
    match GameConfig::load(&path) {
        Ok(config) => {
            info!(path = %path, "Config loaded");
            Some(config)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Cannot load config");
            None
        }
    }
}

fn build_world(config: &GameConfig) -> MemoryWorld {
    let seed = config.seed.unwrap_or(0x00ca_1de4);
    let mut world = MemoryWorld::new(config.tick_rate).with_generator(Terrain::rolling(seed));
    let lobby = config.lobby.location();
    world.insert_world(lobby.world.clone(), Terrain::flat(lobby.block().y - 1));
    world
}

/// Alive players standing in a lava cell.
fn players_in_lava(session: &Session<MemoryWorld>) -> Vec<PlayerId> {
    let level = session.hazard_level();
    session
        .alive_ids()
        .into_iter()
        .filter(|player| {
            session
                .world()
                .player_location(*player)
                .is_some_and(|loc| loc.block().y < level)
        })
        .collect()
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::CountdownTick { remaining, announce: true } => {
            info!("Game starts in {remaining}s");
        }
        SessionEvent::HazardRaised { level, converted, .. } => {
            info!(level, converted, "Lava rose");
        }
        SessionEvent::PlayerEliminated { player, remaining } => {
            info!(%player, remaining, "Burned");
        }
        SessionEvent::Winner { player } => info!(%player, "WINNER"),
        SessionEvent::CountdownTick { .. } => {}
        other => info!(event = ?other, "Session event"),
    }
}

fn main() {
    init_logging();

    info!("═══════════════════════════════════════════════════════════════════");
    info!("                    CALDERA SERVER v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════════════════════════════");

    let Some(config) = load_config() else {
        std::process::exit(1);
    };
    let tick_rate = config.tick_rate;
    let wanted = config.provisioning.arenas_per_run;
    let budget = config.provisioning.attempt_budget;
    let players = config.game.min_players.max(2) + 1;

    let world = build_world(&config);
    let mut session = match Session::open(config, world) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Cannot open arena registry");
            std::process::exit(1);
        }
    };

    if session.available_arena_count() == 0 {
        match session.provision_arenas_now(wanted, budget) {
            Ok(report) => info!(
                accepted = report.accepted,
                attempts = report.attempts,
                "Provisioning finished"
            ),
            Err(e) => {
                error!(error = %e, "Provisioning failed");
                std::process::exit(1);
            }
        }
    }

    for _ in 0..players {
        session.world_mut().add_player();
    }
    info!(players, "Simulated players connected");

    if let Err(e) = session.try_start() {
        warn!(error = %e, "Game could not start");
        return;
    }

    let events = session.subscribe();
    let mut tick_loop = TickLoop::new(tick_rate);
    let report_every = REPORT_EVERY_SECS * u64::from(tick_rate);

    tick_loop.run_while(|tick| {
        session.tick();

        for player in players_in_lava(&session) {
            session.eliminate(player);
        }
        for event in events.try_iter() {
            log_event(&event);
        }

        if tick % report_every == 0 {
            let status = session.status();
            info!(
                state = %status.state,
                time = %status.elapsed_clock(),
                alive = status.alive,
                lava = status.hazard_level,
                border = status.border_size,
                "Status"
            );
        }
        session.state() != SessionState::Waiting
    });

    // Leave the arena world free of lava before exiting
    session.finish_cleanups();

    let stats = tick_loop.stats();
    info!(
        ticks = tick_loop.tick_count(),
        avg_tick_us = stats.avg_tick_us,
        max_tick_us = stats.max_tick_us,
        late_ticks = stats.late_ticks,
        arenas_left = session.available_arena_count(),
        "Server shutting down"
    );
}
