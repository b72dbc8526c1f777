//! Engine configuration.
//!
//! Environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `DYNO_MAX_QUEUE_DEPTH` | 256 | queue bound before `QueueFull` |
//! | `DYNO_COMPATIBILITY_PATH` | built-in table | JSON compatibility table |
//! | `DYNO_CATALOG_PATH` | none | JSON catalog snapshot |
//! | `DYNO_LOG_LEVEL` | `info` | tracing filter when `RUST_LOG` is unset |

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::matcher::CompatibilityTable;

/// Default bound on waiting requests
pub const DEFAULT_MAX_QUEUE_DEPTH: usize = 256;

/// Allocation engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of requests waiting for a dyno
    pub max_queue_depth: usize,

    /// Traction → dyno type compatibility
    pub compatibility: CompatibilityTable,

    /// Catalog snapshot to load, if any
    pub catalog_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            compatibility: CompatibilityTable::default(),
            catalog_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Builder-style queue bound
    pub fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Builder-style compatibility table
    pub fn with_compatibility(mut self, compatibility: CompatibilityTable) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_queue_depth = match lookup("DYNO_MAX_QUEUE_DEPTH") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue {
                    name: "DYNO_MAX_QUEUE_DEPTH",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_MAX_QUEUE_DEPTH,
        };

        let compatibility = match lookup("DYNO_COMPATIBILITY_PATH") {
            Some(path) => CompatibilityTable::load(path)?,
            None => CompatibilityTable::default(),
        };

        let catalog_path = lookup("DYNO_CATALOG_PATH").map(PathBuf::from);

        let log_level = lookup("DYNO_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            max_queue_depth,
            compatibility,
            catalog_path,
            log_level,
        })
    }
}
