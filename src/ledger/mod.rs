//! Allocation ledger: the sole authority over which dyno is free.
//!
//! ## Slots
//!
//! One `AtomicU64` per catalog slot holds the id of the request that
//! reserved the dyno, or [`FREE`] (0). There is no ledger-wide lock:
//!
//! - `try_reserve` is a single `compare_exchange(FREE -> request)`, so two
//!   callers racing for the same dyno can never both win
//! - `release` is a single `swap(FREE)`, returning the previous holder
//! - operations on different dynos never contend
//!
//! Linearizability holds per dyno only; nothing orders operations across
//! dynos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

use crate::catalog::Catalog;
use crate::error::AllocationError;
use crate::types::{DynoId, RequestId};

/// Slot value of an unreserved dyno. Request ids start at 1.
pub const FREE: RequestId = 0;

/// Per-dyno reservation state.
#[derive(Debug)]
pub struct Ledger {
    /// Reservation cells, indexed by catalog slot
    slots: Box<[AtomicU64]>,

    /// Dyno id per slot
    ids: Vec<DynoId>,

    /// Dyno id to slot
    index: HashMap<DynoId, usize>,
}

impl Ledger {
    /// Create a ledger with one free slot per catalog dyno
    pub fn new(catalog: &Catalog) -> Self {
        let ids: Vec<DynoId> = catalog.dynos().iter().map(|d| d.id).collect();
        let slots = ids.iter().map(|_| AtomicU64::new(FREE)).collect();
        let index = ids.iter().enumerate().map(|(slot, id)| (*id, slot)).collect();

        Self { slots, ids, index }
    }

    fn slot(&self, dyno: DynoId) -> Result<usize, AllocationError> {
        self.index
            .get(&dyno)
            .copied()
            .ok_or(AllocationError::UnknownDyno(dyno))
    }

    // ========================================================================
    // Reservation
    // ========================================================================

    /// Atomically reserve `dyno` for `request` iff it is currently free.
    ///
    /// Returns `Ok(false)` without side effects if the dyno is held by anyone,
    /// including `request` itself.
    pub fn try_reserve(&self, dyno: DynoId, request: RequestId) -> Result<bool, AllocationError> {
        let slot = self.slot(dyno)?;
        Ok(self.try_reserve_slot(slot, request))
    }

    /// Clear the reservation on `dyno`, returning the previous holder.
    ///
    /// Releasing a free dyno is a no-op and returns `Ok(None)`.
    pub fn release(&self, dyno: DynoId) -> Result<Option<RequestId>, AllocationError> {
        let slot = self.slot(dyno)?;
        let previous = self.slots[slot].swap(FREE, Ordering::AcqRel);
        Ok((previous != FREE).then_some(previous))
    }

    /// Snapshot read of a dyno's occupancy
    pub fn is_free(&self, dyno: DynoId) -> Result<bool, AllocationError> {
        let slot = self.slot(dyno)?;
        Ok(self.is_free_slot(slot))
    }

    /// Request currently holding `dyno`
    pub fn holder(&self, dyno: DynoId) -> Result<Option<RequestId>, AllocationError> {
        let slot = self.slot(dyno)?;
        let held = self.slots[slot].load(Ordering::Acquire);
        Ok((held != FREE).then_some(held))
    }

    #[inline]
    pub(crate) fn try_reserve_slot(&self, slot: usize, request: RequestId) -> bool {
        if request == FREE {
            return false;
        }
        self.slots[slot]
            .compare_exchange(FREE, request, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub(crate) fn is_free_slot(&self, slot: usize) -> bool {
        self.slots[slot].load(Ordering::Acquire) == FREE
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Number of dynos tracked
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of dynos currently reserved
    pub fn reserved_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|cell| cell.load(Ordering::Acquire) != FREE)
            .count()
    }

    /// `(dyno, holder)` for every reserved dyno, in slot order
    pub fn reservations(&self) -> Vec<(DynoId, RequestId)> {
        self.ids
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(id, cell)| {
                let held = cell.load(Ordering::Acquire);
                (held != FREE).then_some((*id, held))
            })
            .collect()
    }

    /// SHA-256 over `(dyno id, holder)` little-endian pairs in slot order.
    ///
    /// Deterministic for a given occupancy; only meaningful while no other
    /// thread is mutating the ledger.
    pub fn compute_state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (id, cell) in self.ids.iter().zip(self.slots.iter()) {
            hasher.update(id.to_le_bytes());
            hasher.update(cell.load(Ordering::Acquire).to_le_bytes());
        }

        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        root
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
