//! # Core Error Types
//!
//! Errors raised by world backends and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::RegionCoord;

/// Errors a `WorldService` backend can report.
///
/// The session core never treats these as fatal. A failing cell or sample is
/// counted and skipped; a missing world aborts `start()` and nothing else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The named world does not exist or could not be loaded.
    #[error("world not available: {0}")]
    WorldUnavailable(String),

    /// The world already exists (on create).
    #[error("world already exists: {0}")]
    WorldExists(String),

    /// A cell was queried in a region that is not loaded.
    #[error("region ({}, {}) not loaded", .0.x, .0.z)]
    RegionNotLoaded(RegionCoord),

    /// The elevation is outside the world's vertical range.
    #[error("elevation {0} out of range")]
    OutOfRange(i32),

    /// The player is not online.
    #[error("unknown player: {0}")]
    UnknownPlayer(u64),

    /// Backend-specific failure.
    #[error("world backend failure: {0}")]
    Backend(String),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors that can occur while loading a `GameConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `GameConfig`.
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but are inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
