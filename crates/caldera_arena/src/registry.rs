//! # Arena Registry
//!
//! Durable storage for the pool, one TOML file:
//!
//! ```toml
//! [available.arena0]
//! id = "arena_1718000000000_0"
//! world = "caldera_world"
//! x = 1204.0
//! y = 71.0
//! z = -388.0
//! size = 200
//! used = false
//!
//! [used.arena0]
//! # ...
//! ```
//!
//! Keys are positional (`arena0`, `arena1`, ...) and rewritten on every save,
//! so they carry no identity. The file is replaced atomically: written next
//! to the target, then renamed over it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use caldera_core::{Arena, ArenaId, Location};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ArenaError, ArenaResult};

/// Section holding arenas that can still be acquired.
const AVAILABLE: &str = "available";
/// Section holding arenas that have hosted a session.
const USED: &str = "used";

/// One persisted arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct ArenaRecord {
    id: String,
    world: String,
    x: f64,
    y: f64,
    z: f64,
    size: u32,
    used: bool,
}

impl From<&Arena> for ArenaRecord {
    fn from(arena: &Arena) -> Self {
        Self {
            id: arena.id.0.clone(),
            world: arena.origin.world.clone(),
            x: arena.origin.x,
            y: arena.origin.y,
            z: arena.origin.z,
            size: arena.size,
            used: arena.used,
        }
    }
}

impl From<ArenaRecord> for Arena {
    fn from(record: ArenaRecord) -> Self {
        Self {
            id: ArenaId(record.id),
            origin: Location::new(record.world, record.x, record.y, record.z),
            size: record.size,
            used: record.used,
        }
    }
}

/// Serialized layout of the whole file.
#[derive(Serialize)]
struct RegistryFile {
    available: BTreeMap<String, ArenaRecord>,
    used: BTreeMap<String, ArenaRecord>,
}

/// Both collections as read from disk, in index order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegistryContents {
    /// Arenas that can be acquired.
    pub available: Vec<Arena>,
    /// Arenas that have hosted a session.
    pub used: Vec<Arena>,
}

/// TOML-backed arena registry.
#[derive(Clone, Debug)]
pub struct ArenaRegistry {
    path: PathBuf,
}

impl ArenaRegistry {
    /// Creates a registry bound to `path`. Nothing is read until `load`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Registry file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads both collections.
    ///
    /// A missing file is an empty registry and is created on the spot.
    /// Records that do not parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::Io` if the file exists but cannot be read and
    /// `ArenaError::Parse` if it is not TOML at all.
    pub fn load(&self) -> ArenaResult<RegistryContents> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Registry missing, creating empty one");
            self.save(&[], &[])?;
            return Ok(RegistryContents::default());
        }

        let text = fs::read_to_string(&self.path).map_err(|source| ArenaError::Io {
            path: self.path.clone(),
            source,
        })?;
        let table: toml::Table = text.parse()?;

        Ok(RegistryContents {
            available: read_section(&table, AVAILABLE),
            used: read_section(&table, USED),
        })
    }

    /// Rewrites the file with the given collections.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::Io` if the file cannot be written or renamed.
    pub fn save(&self, available: &[Arena], used: &[Arena]) -> ArenaResult<()> {
        let file = RegistryFile {
            available: index_records(available),
            used: index_records(used),
        };
        let text = toml::to_string_pretty(&file)?;

        let io_err = |source| ArenaError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

fn index_records(arenas: &[Arena]) -> BTreeMap<String, ArenaRecord> {
    arenas
        .iter()
        .enumerate()
        .map(|(i, arena)| (format!("arena{i}"), ArenaRecord::from(arena)))
        .collect()
}

/// Numeric suffix of `arenaN`; anything else sorts last.
fn key_index(key: &str) -> u64 {
    key.strip_prefix("arena")
        .and_then(|n| n.parse().ok())
        .unwrap_or(u64::MAX)
}

fn read_section(table: &toml::Table, section: &str) -> Vec<Arena> {
    let Some(entries) = table.get(section).and_then(toml::Value::as_table) else {
        return Vec::new();
    };

    let mut keyed: Vec<(&String, &toml::Value)> = entries.iter().collect();
    keyed.sort_by(|(a, _), (b, _)| key_index(a).cmp(&key_index(b)).then_with(|| a.cmp(b)));

    keyed
        .into_iter()
        .filter_map(|(key, value)| match value.clone().try_into::<ArenaRecord>() {
            Ok(record) => Some(Arena::from(record)),
            Err(e) => {
                warn!(section, key = %key, error = %e, "Skipping malformed arena record");
                None
            }
        })
        .collect()
}
