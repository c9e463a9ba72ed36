//! # Arena Error Types
//!
//! All errors that can occur in the arena pool.

use std::path::PathBuf;

use caldera_core::{ArenaId, WorldError};
use thiserror::Error;

/// Errors that can occur in the arena pool.
#[derive(Error, Debug)]
pub enum ArenaError {
    /// No arena is available.
    #[error("no arenas available")]
    ResourceExhausted,

    /// An arena is already in use; only one session runs at a time.
    #[error("arena {0} is already in use")]
    AlreadyInUse(ArenaId),

    /// A provisioning run is already in progress.
    #[error("provisioning already in progress")]
    ProvisioningInProgress,

    /// The registry file could not be read or written.
    #[error("registry I/O failed for {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The registry file is not valid TOML.
    #[error("cannot parse registry: {0}")]
    Parse(#[from] toml::de::Error),

    /// The registry could not be serialized.
    #[error("cannot serialize registry: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The world backend refused an operation.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Result type for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
