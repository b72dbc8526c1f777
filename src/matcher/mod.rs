//! Compatibility matcher.
//!
//! Pure decisions about which dynos can serve a vehicle:
//!
//! - [`Matcher::is_compatible`]: enabled, inside its availability window,
//!   weight ceiling, then table lookup
//! - [`Matcher::could_ever_fit`]: any compatible dyno, ignoring occupancy
//! - [`Matcher::candidate_dynos`]: compatible dynos that are free right now,
//!   in tightest-fit order
//!
//! The catalog keeps dynos sorted by `(max_weight, id)`, so tightest-fit
//! ordering with the ascending-id tie-break is a filter over that order.

mod compat;

pub use compat::CompatibilityTable;

use crate::catalog::Catalog;
use crate::ledger::Ledger;
use crate::types::{Dyno, Vehicle};

/// Matches vehicles against dynos under a compatibility table.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    table: CompatibilityTable,
}

impl Matcher {
    pub fn new(table: CompatibilityTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CompatibilityTable {
        &self.table
    }

    /// True iff the dyno is enabled and in its availability window at
    /// `now_ms`, can carry the vehicle's weight, and its type accepts the
    /// vehicle's traction.
    #[inline]
    pub fn is_compatible(&self, vehicle: &Vehicle, dyno: &Dyno, now_ms: u64) -> bool {
        dyno.enabled
            && dyno.is_available_at(now_ms)
            && dyno.supports_weight(vehicle.weight)
            && self.table.accepts(&vehicle.traction, &dyno.kind)
    }

    /// Whether any dyno in the catalog could take this vehicle once free
    pub fn could_ever_fit(&self, vehicle: &Vehicle, catalog: &Catalog, now_ms: u64) -> bool {
        catalog
            .dynos()
            .iter()
            .any(|dyno| self.is_compatible(vehicle, dyno, now_ms))
    }

    /// Compatible, currently free dynos ordered by tightest fit, ties by
    /// ascending id.
    ///
    /// Occupancy is a snapshot: a returned dyno may be taken before the
    /// caller reserves it, which `Ledger::try_reserve` reports.
    pub fn candidate_dynos<'c>(
        &self,
        vehicle: &Vehicle,
        catalog: &'c Catalog,
        ledger: &Ledger,
        now_ms: u64,
    ) -> Vec<&'c Dyno> {
        catalog
            .dynos()
            .iter()
            .enumerate()
            .filter(|(slot, dyno)| {
                self.is_compatible(vehicle, dyno, now_ms) && ledger.is_free_slot(*slot)
            })
            .map(|(_, dyno)| dyno)
            .collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
