//! Ledger receipt summarizing dyno occupancy at a point in time.
//!
//! The receipt pairs occupancy counters with the ledger state root, so the
//! persistence layer can verify that its recorded reservations match what
//! the engine holds without shipping the whole ledger.

use ssz_rs::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::AllocationError;

/// Snapshot of ledger occupancy.
///
/// ## State Root
///
/// The 32-byte state root is a SHA-256 hash over every
/// `(dyno id, holding request id)` pair in slot order. Two engines that
/// processed the same sequence of operations produce the same root.
///
/// ## Example
///
/// ```
/// use dyno_allocator::types::LedgerReceipt;
///
/// let receipt = LedgerReceipt::new(
///     12,         // last event sequence
///     4,          // dynos in the catalog
///     3,          // dynos reserved
///     2,          // queue depth
///     [0u8; 32],  // state root (would be computed)
///     1703577600000,
/// );
/// assert_eq!(receipt.utilization(), Some(0.75));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct LedgerReceipt {
    /// Sequence number of the last emitted event
    pub sequence: u64,

    /// Number of enabled dynos tracked by the ledger
    pub dynos_total: u64,

    /// Number of dynos currently reserved
    pub dynos_reserved: u64,

    /// Requests waiting in the queue
    pub queue_depth: u64,

    /// Ledger state root (SHA-256, 32 bytes)
    pub state_root: [u8; 32],

    /// Snapshot timestamp in milliseconds
    pub timestamp: u64,
}

impl LedgerReceipt {
    pub fn new(
        sequence: u64,
        dynos_total: u64,
        dynos_reserved: u64,
        queue_depth: u64,
        state_root: [u8; 32],
        timestamp: u64,
    ) -> Self {
        Self {
            sequence,
            dynos_total,
            dynos_reserved,
            queue_depth,
            state_root,
            timestamp,
        }
    }

    /// SSZ-encode for the persistence layer
    pub fn encode(&self) -> Result<Vec<u8>, AllocationError> {
        ssz_rs::serialize(self).map_err(|e| AllocationError::Encoding(format!("{e:?}")))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, AllocationError> {
        ssz_rs::deserialize(bytes).map_err(|e| AllocationError::Encoding(format!("{e:?}")))
    }

    /// SHA-256 over the encoded receipt; identifies it in audit logs
    pub fn digest(&self) -> Result<[u8; 32], AllocationError> {
        Ok(Sha256::digest(self.encode()?).into())
    }

    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }

    /// Fraction of dynos reserved, `None` for an empty catalog
    pub fn utilization(&self) -> Option<f64> {
        if self.dynos_total == 0 {
            None
        } else {
            Some(self.dynos_reserved as f64 / self.dynos_total as f64)
        }
    }

    /// True when no dyno is reserved and nothing is waiting
    pub fn is_idle(&self) -> bool {
        self.dynos_reserved == 0 && self.queue_depth == 0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
