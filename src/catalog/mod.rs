//! Immutable catalog snapshot of dynos and vehicles.
//!
//! ## Slot Layout
//!
//! Dynos are stored in a fixed arena sorted by `(max_weight, id)`. A dyno's
//! position in that arena is its *slot*; the [`Ledger`](crate::ledger::Ledger)
//! keeps one reservation cell per slot. Because the arena is already in
//! tightest-fit order, candidate selection never needs to sort.
//!
//! ```text
//! slot:        0         1         2         3
//! dyno:   [800 #5]  [2000 #1] [2000 #3] [5000 #2]
//! ```
//!
//! ## Snapshot Format
//!
//! [`CatalogSnapshot`] mirrors the persisted schema
//! (`vehicles(id, name, weight, traction)`,
//! `dynos(id, name, max_weight, type, enabled, available_from, available_to)`)
//! as JSON. Dyno id 0 is reserved: events use it to mean "no dyno".

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AllocationError, ConfigError};
use crate::types::{Dyno, DynoId, Vehicle, VehicleId};

/// Serialized form of a catalog, as exported by the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub dynos: Vec<Dyno>,

    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
}

impl CatalogSnapshot {
    /// Load a snapshot from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Read-only view of dyno resources and vehicles.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Dynos in tightest-fit order; index = slot
    dynos: Vec<Dyno>,

    /// Dyno ID to slot
    slots: HashMap<DynoId, usize>,

    vehicles: HashMap<VehicleId, Vehicle>,
}

impl Catalog {
    /// Build a catalog, validating ids and weights.
    ///
    /// # Errors
    ///
    /// `InvalidCatalog` for duplicate dyno or vehicle ids, dyno id 0, an
    /// inverted availability window, a zero `max_weight`, or a zero vehicle
    /// weight.
    pub fn new(mut dynos: Vec<Dyno>, vehicles: Vec<Vehicle>) -> Result<Self, AllocationError> {
        let mut seen = HashSet::with_capacity(dynos.len());
        for dyno in &dynos {
            if !seen.insert(dyno.id) {
                return Err(AllocationError::InvalidCatalog(format!(
                    "duplicate dyno id {}",
                    dyno.id
                )));
            }
            if dyno.id == 0 {
                return Err(AllocationError::InvalidCatalog(
                    "dyno id 0 is reserved".to_string(),
                ));
            }
            if let (Some(from), Some(to)) = (dyno.available_from, dyno.available_to) {
                if from > to {
                    return Err(AllocationError::InvalidCatalog(format!(
                        "dyno {} is available from {from} after {to}",
                        dyno.id
                    )));
                }
            }
            if dyno.max_weight == 0 {
                return Err(AllocationError::InvalidCatalog(format!(
                    "dyno {} has zero max_weight",
                    dyno.id
                )));
            }
        }

        dynos.sort_by_key(|d| (d.max_weight, d.id));
        let slots = dynos
            .iter()
            .enumerate()
            .map(|(slot, dyno)| (dyno.id, slot))
            .collect();

        let mut by_id = HashMap::with_capacity(vehicles.len());
        for vehicle in vehicles {
            if vehicle.weight == 0 {
                return Err(AllocationError::InvalidCatalog(format!(
                    "vehicle {} has zero weight",
                    vehicle.id
                )));
            }
            let id = vehicle.id;
            if by_id.insert(id, vehicle).is_some() {
                return Err(AllocationError::InvalidCatalog(format!(
                    "duplicate vehicle id {id}"
                )));
            }
        }

        Ok(Self {
            dynos,
            slots,
            vehicles: by_id,
        })
    }

    /// Build a catalog from a deserialized snapshot
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, AllocationError> {
        Self::new(snapshot.dynos, snapshot.vehicles)
    }

    /// Load and validate a catalog from a JSON snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::from_snapshot(CatalogSnapshot::load(path)?)?)
    }

    // ========================================================================
    // Dynos
    // ========================================================================

    /// All dynos in slot (tightest-fit) order, disabled ones included
    #[inline]
    pub fn dynos(&self) -> &[Dyno] {
        &self.dynos
    }

    pub fn dyno(&self, id: DynoId) -> Option<&Dyno> {
        self.slot_of(id).map(|slot| &self.dynos[slot])
    }

    #[inline]
    pub fn slot_of(&self, id: DynoId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn dyno_count(&self) -> usize {
        self.dynos.len()
    }

    pub fn enabled_dyno_count(&self) -> usize {
        self.dynos.iter().filter(|d| d.enabled).count()
    }

    // ========================================================================
    // Vehicles
    // ========================================================================

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// Registered vehicles, in no particular order
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> + '_ {
        self.vehicles.values()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
