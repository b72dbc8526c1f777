//! Data-driven compatibility table.
//!
//! Maps each vehicle traction type to the set of dyno types that can test
//! it. New equipment is added by extending the table (in code or from a
//! JSON file), never by adding branches to the matcher.
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "two-wheel":  ["two-wheel", "any"],
//!   "four-wheel": ["four-wheel", "any"],
//!   "all-wheel":  ["all-wheel", "four-wheel", "any"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{DynoType, TractionType};

/// Traction type → accepted dyno types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompatibilityTable {
    entries: BTreeMap<TractionType, BTreeSet<DynoType>>,
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::empty()
            .allow(TractionType::two_wheel(), [DynoType::two_wheel(), DynoType::any()])
            .allow(TractionType::four_wheel(), [DynoType::four_wheel(), DynoType::any()])
            .allow(
                TractionType::all_wheel(),
                [DynoType::all_wheel(), DynoType::four_wheel(), DynoType::any()],
            )
    }
}

impl CompatibilityTable {
    /// A table that accepts nothing
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Builder-style: let `traction` run on each of `dyno_types`
    pub fn allow(
        mut self,
        traction: TractionType,
        dyno_types: impl IntoIterator<Item = DynoType>,
    ) -> Self {
        self.insert(traction, dyno_types);
        self
    }

    /// Add accepted dyno types for a traction type
    pub fn insert(&mut self, traction: TractionType, dyno_types: impl IntoIterator<Item = DynoType>) {
        self.entries.entry(traction).or_default().extend(dyno_types);
    }

    /// Whether `traction` may run on a `dyno_type` dyno
    #[inline]
    pub fn accepts(&self, traction: &TractionType, dyno_type: &DynoType) -> bool {
        self.entries
            .get(traction)
            .is_some_and(|accepted| accepted.contains(dyno_type))
    }

    /// Dyno types accepted for `traction`, empty if the traction is unknown
    pub fn accepted(&self, traction: &TractionType) -> impl Iterator<Item = &DynoType> {
        self.entries.get(traction).into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a table from JSON text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a table from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = CompatibilityTable::default();

        assert!(table.accepts(&TractionType::all_wheel(), &DynoType::all_wheel()));
        assert!(table.accepts(&TractionType::all_wheel(), &DynoType::four_wheel()));
        assert!(table.accepts(&TractionType::two_wheel(), &DynoType::two_wheel()));
        assert!(table.accepts(&TractionType::two_wheel(), &DynoType::any()));

        assert!(!table.accepts(&TractionType::two_wheel(), &DynoType::four_wheel()));
        assert!(!table.accepts(&TractionType::four_wheel(), &DynoType::all_wheel()));
    }

    #[test]
    fn test_unknown_traction_accepts_nothing() {
        let table = CompatibilityTable::default();
        let hybrid = TractionType::new("e-axle");

        assert!(!table.accepts(&hybrid, &DynoType::any()));
        assert_eq!(table.accepted(&hybrid).count(), 0);
    }

    #[test]
    fn test_new_pairs_are_additive() {
        let mut table = CompatibilityTable::default();
        table.insert(TractionType::new("e-axle"), [DynoType::new("hub")]);

        assert!(table.accepts(&TractionType::new("e-axle"), &DynoType::new("hub")));
        // existing entries untouched
        assert!(table.accepts(&TractionType::four_wheel(), &DynoType::four_wheel()));
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"{ "Two-Wheel": ["two-wheel"], "all-wheel": ["ALL-WHEEL", "four-wheel"] }"#;
        let table = CompatibilityTable::from_json(json).unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.accepts(&TractionType::two_wheel(), &DynoType::two_wheel()));
        assert!(table.accepts(&TractionType::all_wheel(), &DynoType::all_wheel()));
        assert!(!table.accepts(&TractionType::two_wheel(), &DynoType::any()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = CompatibilityTable::load("/nonexistent/compat.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
