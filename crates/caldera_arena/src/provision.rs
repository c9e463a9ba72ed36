//! # Arena Provisioning
//!
//! Finds new arena sites on land.
//!
//! ## Pipeline
//!
//! ```text
//! worker thread                    scheduling thread (one pump per tick)
//! ┌────────────────────┐  bounded  ┌──────────────────────────────────┐
//! │ CandidateGenerator │ ────────> │ try_recv -> survey_site -> Arena │
//! └────────────────────┘  channel  └──────────────────────────────────┘
//! ```
//!
//! Candidates are plain coordinates, so the worker never touches the world.
//! Each candidate is judged by sampling a 3x3 grid around it: a sample is
//! unsuitable when its surface is water, lies below the minimum elevation,
//! or cannot be queried at all.

use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use caldera_core::{
    Arena, ArenaId, BlockPos, Location, Material, ProvisioningSection, RegionCoord, WorldService,
};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Candidates buffered between the worker and the scheduling thread.
const FEED_CAPACITY: usize = 16;

/// A candidate arena center.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// X coordinate.
    pub x: i32,
    /// Z coordinate.
    pub z: i32,
}

/// Lazy, finite stream of uniformly random candidates.
#[derive(Debug)]
pub struct CandidateGenerator {
    rng: ChaCha8Rng,
    range: i32,
    remaining: usize,
}

impl CandidateGenerator {
    /// Creates a generator yielding `budget` candidates in `[-range, range)`.
    #[must_use]
    pub fn new(seed: Option<u64>, range: i32, budget: usize) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            range: range.max(1),
            remaining: budget,
        }
    }
}

impl Iterator for CandidateGenerator {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Candidate {
            x: self.rng.gen_range(-self.range..self.range),
            z: self.rng.gen_range(-self.range..self.range),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// What the feed had for this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedItem {
    /// A candidate is ready.
    Ready(Candidate),
    /// The worker has not produced the next candidate yet.
    Pending,
    /// No more candidates.
    Exhausted,
}

/// Source of candidates for a provisioning run.
#[derive(Debug)]
pub enum CandidateFeed {
    /// Generated on the calling thread.
    Inline(CandidateGenerator),
    /// Generated on a worker thread.
    Worker {
        /// Receiving end of the bounded channel.
        rx: Receiver<Candidate>,
        /// Worker handle, joined on drop.
        handle: Option<JoinHandle<()>>,
    },
}

impl CandidateFeed {
    /// Spawns a worker that drains `generator` into a bounded channel.
    #[must_use]
    pub fn spawn(generator: CandidateGenerator) -> Self {
        let (tx, rx) = bounded(FEED_CAPACITY);
        let handle = thread::spawn(move || {
            for candidate in generator {
                // Receiver dropped: the run was abandoned
                if tx.send(candidate).is_err() {
                    break;
                }
            }
        });
        Self::Worker {
            rx,
            handle: Some(handle),
        }
    }

    /// Takes the next candidate without blocking.
    pub fn next_item(&mut self) -> FeedItem {
        match self {
            Self::Inline(generator) => generator.next().map_or(FeedItem::Exhausted, FeedItem::Ready),
            Self::Worker { rx, .. } => match rx.try_recv() {
                Ok(candidate) => FeedItem::Ready(candidate),
                Err(TryRecvError::Empty) => FeedItem::Pending,
                Err(TryRecvError::Disconnected) => FeedItem::Exhausted,
            },
        }
    }
}

impl Drop for CandidateFeed {
    fn drop(&mut self) {
        if let Self::Worker { rx, handle } = self {
            // Unblock a worker waiting on a full channel
            let (_, dummy) = bounded(0);
            drop(std::mem::replace(rx, dummy));
            if let Some(handle) = handle.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Verdict on one candidate site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SiteSurvey {
    /// Samples taken.
    pub samples: usize,
    /// Samples that were water, too low, or failed.
    pub unsuitable: usize,
    /// Surface elevation at the candidate center, if it could be read.
    pub center_elevation: Option<i32>,
}

impl SiteSurvey {
    /// Fraction of unsuitable samples.
    #[must_use]
    pub fn unsuitable_fraction(&self) -> f64 {
        if self.samples == 0 {
            return 1.0;
        }
        self.unsuitable as f64 / self.samples as f64
    }

    /// Returns true when the site can host an arena.
    #[must_use]
    pub fn is_suitable(&self, max_fraction: f64) -> bool {
        self.center_elevation.is_some() && self.unsuitable_fraction() < max_fraction
    }
}

/// Samples the 3x3 grid around `candidate`.
///
/// Every region touched by a sample is loaded first and left loaded.
pub fn survey_site<W: WorldService + ?Sized>(
    world: &mut W,
    world_name: &str,
    candidate: Candidate,
    settings: &ProvisioningSection,
) -> SiteSurvey {
    let offset = settings.sample_offset;
    let offsets = [-offset, 0, offset];

    let mut regions: Vec<RegionCoord> = offsets
        .iter()
        .flat_map(|dx| {
            offsets
                .iter()
                .map(move |dz| RegionCoord::from_block_pos(candidate.x + dx, candidate.z + dz))
        })
        .collect();
    regions.sort_unstable();
    regions.dedup();
    for region in regions {
        if let Err(e) = world.load_region(world_name, region) {
            debug!(x = region.x, z = region.z, error = %e, "Region load failed");
        }
    }

    let mut survey = SiteSurvey {
        samples: 0,
        unsuitable: 0,
        center_elevation: None,
    };

    for dx in offsets {
        for dz in offsets {
            let (x, z) = (candidate.x + dx, candidate.z + dz);
            survey.samples += 1;

            let sample = world.highest_solid_elevation(world_name, x, z).and_then(|y| {
                world
                    .read_cell(world_name, BlockPos::new(x, y, z))
                    .map(|material| (y, material))
            });

            match sample {
                Ok((y, material)) => {
                    if dx == 0 && dz == 0 {
                        survey.center_elevation = Some(y);
                    }
                    if material == Material::Water || y < settings.min_elevation {
                        survey.unsuitable += 1;
                    }
                }
                Err(_) => survey.unsuitable += 1,
            }
        }
    }

    survey
}

/// Outcome of a provisioning run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Arenas asked for.
    pub requested: usize,
    /// Arenas accepted.
    pub accepted: usize,
    /// Candidates examined.
    pub attempts: usize,
}

impl ProvisionReport {
    /// Returns true if fewer arenas than requested were found.
    #[inline]
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.accepted < self.requested
    }
}

/// An in-flight provisioning run.
#[derive(Debug)]
pub struct ProvisionRun {
    world: String,
    arena_size: u32,
    requested: usize,
    attempts: usize,
    stamp: u128,
    run: u64,
    feed: CandidateFeed,
    accepted: Vec<Arena>,
    settings: ProvisioningSection,
}

impl ProvisionRun {
    /// Starts a run in `world` looking for `requested` arenas.
    ///
    /// `run` tells apart the ids of runs started in the same millisecond.
    #[must_use]
    pub fn new(
        world: impl Into<String>,
        arena_size: u32,
        requested: usize,
        run: u64,
        feed: CandidateFeed,
        settings: ProvisioningSection,
    ) -> Self {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        Self {
            world: world.into(),
            arena_size,
            requested,
            attempts: 0,
            stamp,
            run,
            feed,
            accepted: Vec::new(),
            settings,
        }
    }

    /// World the run provisions in.
    #[must_use]
    pub fn world(&self) -> &str {
        &self.world
    }

    /// Arenas accepted so far.
    #[must_use]
    pub fn accepted(&self) -> &[Arena] {
        &self.accepted
    }

    /// Validates up to `candidates` candidates. Returns true once the run is
    /// finished (enough arenas, or no candidates left).
    pub fn step<W: WorldService + ?Sized>(&mut self, world: &mut W, candidates: usize) -> bool {
        for _ in 0..candidates.max(1) {
            if self.accepted.len() >= self.requested {
                return true;
            }

            let candidate = match self.feed.next_item() {
                FeedItem::Ready(candidate) => candidate,
                FeedItem::Pending => return false,
                FeedItem::Exhausted => return true,
            };
            self.attempts += 1;

            let survey = survey_site(world, &self.world, candidate, &self.settings);
            match survey.center_elevation {
                Some(y) if survey.is_suitable(self.settings.max_unsuitable_fraction) => {
                    let id = ArenaId(format!(
                        "arena_{}_{}_{}",
                        self.stamp,
                        self.run,
                        self.accepted.len()
                    ));
                    let origin = Location::new(
                        self.world.clone(),
                        f64::from(candidate.x),
                        f64::from(y),
                        f64::from(candidate.z),
                    );
                    let arena = Arena::new(id, origin, self.arena_size);
                    info!(
                        arena = %arena.id,
                        x = candidate.x,
                        z = candidate.z,
                        progress = %format!("{}/{}", self.accepted.len() + 1, self.requested),
                        "Arena site accepted"
                    );
                    self.accepted.push(arena);
                }
                _ => {
                    debug!(
                        x = candidate.x,
                        z = candidate.z,
                        unsuitable = survey.unsuitable,
                        samples = survey.samples,
                        "Arena site rejected"
                    );
                }
            }
        }

        self.accepted.len() >= self.requested
    }

    /// Consumes the run, returning the accepted arenas and the report.
    #[must_use]
    pub fn finish(self) -> (Vec<Arena>, ProvisionReport) {
        let report = ProvisionReport {
            requested: self.requested,
            accepted: self.accepted.len(),
            attempts: self.attempts,
        };
        (self.accepted, report)
    }
}
