//! # CALDERA Arena Pool
//!
//! Reusable arena sites for the rising-lava minigame.
//!
//! ## Design Principles
//!
//! 1. **One owner** - the pool is the only place arena records live
//! 2. **Durable** - every mutation rewrites the TOML registry
//! 3. **Chunked** - provisioning and cleanup advance a slice per tick
//! 4. **Soft failure** - a short provisioning run is a report, not an error
//!
//! ## Lifecycle
//!
//! ```text
//! provision ──> available ──acquire──> in use ──release──> used
//!                   ^                    │
//!                   └──────restore───────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use caldera_arena::{ArenaPool, PoolSettings, ProvisionRequest};
//!
//! let settings = PoolSettings::from_config(&config);
//! let mut pool = ArenaPool::open(settings)?;
//! pool.begin_provisioning(&mut world, ProvisionRequest::background(4, pool.settings()))?;
//!
//! // once per tick
//! if let Some(report) = pool.pump(&mut world) {
//!     println!("{} new arenas", report.accepted);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cleanup;
pub mod error;
pub mod pool;
pub mod provision;
pub mod registry;

pub use cleanup::{CleanupJob, CleanupStats};
pub use error::{ArenaError, ArenaResult};
pub use pool::{ArenaPool, PoolSettings, ProvisionRequest};
pub use provision::{
    survey_site, Candidate, CandidateFeed, CandidateGenerator, FeedItem, ProvisionReport,
    ProvisionRun, SiteSurvey,
};
pub use registry::{ArenaRegistry, RegistryContents};
