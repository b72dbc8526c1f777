//! Lifecycle event emitted on every request status change.
//!
//! ## SSZ Serialization
//!
//! Events are handed to the persistence layer, which records them durably.
//! They derive `SimpleSerialize` so every consumer sees identical bytes for
//! an identical transition.

use ssz_rs::prelude::*;

use crate::error::AllocationError;
use crate::types::{AllocationRequest, DynoId, RejectReason, RequestId, RequestStatus, VehicleId};

/// A single status transition of an allocation request.
///
/// ## SSZ Layout
///
/// Fixed-size container: 8+8+8+8+1+1+1+8+8 = 51 bytes.
///
/// `dyno_id == 0` means "no dyno" and `reason_raw == 0` means "no reject
/// reason"; catalog ids start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct AllocationEvent {
    /// Engine-wide sequence number, strictly increasing
    pub sequence: u64,

    pub request_id: RequestId,

    pub vehicle_id: VehicleId,

    /// Dyno involved in the transition (allocated or released), 0 if none
    pub dyno_id: DynoId,

    /// Status before the transition as u8
    pub previous_raw: u8,

    /// Status after the transition as u8
    pub status_raw: u8,

    /// Reject reason as u8 (0 = none)
    pub reason_raw: u8,

    /// Submission time of the request (ms)
    pub submitted_at: u64,

    /// Time of the transition (ms)
    pub timestamp: u64,
}

impl AllocationEvent {
    /// Build an event describing `request` after a transition from `previous`.
    ///
    /// `dyno` is passed explicitly because a completed or cancelled request no
    /// longer references the dyno it just released.
    pub fn transition(
        sequence: u64,
        request: &AllocationRequest,
        previous: RequestStatus,
        dyno: Option<DynoId>,
        timestamp: u64,
    ) -> Self {
        Self {
            sequence,
            request_id: request.id,
            vehicle_id: request.vehicle.id,
            dyno_id: dyno.unwrap_or(0),
            previous_raw: previous.to_u8(),
            status_raw: request.status.to_u8(),
            reason_raw: request.reject_reason.map_or(0, RejectReason::to_u8),
            submitted_at: request.submitted_at,
            timestamp,
        }
    }

    /// Status after the transition
    pub fn status(&self) -> RequestStatus {
        RequestStatus::from_u8(self.status_raw).unwrap_or_default()
    }

    /// Status before the transition
    pub fn previous(&self) -> RequestStatus {
        RequestStatus::from_u8(self.previous_raw).unwrap_or_default()
    }

    pub fn dyno(&self) -> Option<DynoId> {
        (self.dyno_id != 0).then_some(self.dyno_id)
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        RejectReason::from_u8(self.reason_raw)
    }

    /// Submission-to-allocation latency, for `Allocated` events only
    pub fn allocation_duration_ms(&self) -> Option<u64> {
        (self.status() == RequestStatus::Allocated)
            .then(|| self.timestamp.saturating_sub(self.submitted_at))
    }

    /// SSZ-encode for the persistence layer
    pub fn encode(&self) -> Result<Vec<u8>, AllocationError> {
        ssz_rs::serialize(self).map_err(|e| AllocationError::Encoding(format!("{e:?}")))
    }

    /// Decode an SSZ-encoded event
    pub fn decode(bytes: &[u8]) -> Result<Self, AllocationError> {
        ssz_rs::deserialize(bytes).map_err(|e| AllocationError::Encoding(format!("{e:?}")))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
