//! Allocation request types.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──► Allocated ──► Completed
//!    │            │
//!    │            └───────► Cancelled
//!    ├──────────────────► Cancelled
//!    └──────────────────► Rejected
//! ```
//!
//! `Completed`, `Cancelled` and `Rejected` are terminal. A request holds a
//! dyno exactly while it is `Allocated`.
//!
//! Status and reject reason carry `u8` codes so they fit the SSZ layout of
//! [`AllocationEvent`](crate::types::AllocationEvent).

use std::fmt;

use crate::types::{DynoId, Vehicle};

/// Request identifier, assigned by the engine starting at 1
pub type RequestId = u64;

// ============================================================================
// RequestStatus
// ============================================================================

/// Status of an allocation request.
///
/// Represented as u8 for SSZ compatibility:
/// - Pending = 0
/// - Allocated = 1
/// - Completed = 2
/// - Cancelled = 3
/// - Rejected = 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestStatus {
    /// Created, possibly waiting in the queue
    #[default]
    Pending,
    /// Holding a dyno
    Allocated,
    /// Test finished, dyno released
    Completed,
    /// Withdrawn by the caller
    Cancelled,
    /// Permanently refused
    Rejected,
}

impl RequestStatus {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::Allocated => 1,
            RequestStatus::Completed => 2,
            RequestStatus::Cancelled => 3,
            RequestStatus::Rejected => 4,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RequestStatus::Pending),
            1 => Some(RequestStatus::Allocated),
            2 => Some(RequestStatus::Completed),
            3 => Some(RequestStatus::Cancelled),
            4 => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    /// No further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Cancelled | RequestStatus::Rejected
        )
    }

    /// Whether the state machine permits `self -> next`
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Allocated)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Allocated, Completed)
                | (Allocated, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Allocated => "allocated",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RejectReason
// ============================================================================

/// Why a request was rejected.
///
/// Encoded as u8 (0 is reserved for "no reason" in events):
/// - NoCompatibleDyno = 1
/// - QueueFull = 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// No dyno in the catalog could ever take this vehicle
    NoCompatibleDyno,
    /// The waiting queue was at its maximum depth
    QueueFull,
}

impl RejectReason {
    pub fn to_u8(self) -> u8 {
        match self {
            RejectReason::NoCompatibleDyno => 1,
            RejectReason::QueueFull => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(RejectReason::NoCompatibleDyno),
            2 => Some(RejectReason::QueueFull),
            _ => None,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoCompatibleDyno => f.write_str("no compatible dyno"),
            RejectReason::QueueFull => f.write_str("queue full"),
        }
    }
}

// ============================================================================
// AllocationRequest
// ============================================================================

/// A vehicle's request for dyno time.
///
/// Timestamps are Unix milliseconds from the engine's clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Unique request identifier
    pub id: RequestId,

    /// The vehicle to test (snapshot taken at submission)
    pub vehicle: Vehicle,

    /// When the request was created
    pub submitted_at: u64,

    /// Current lifecycle status
    pub status: RequestStatus,

    /// Dyno held while `Allocated`, `None` otherwise
    pub dyno: Option<DynoId>,

    /// When the request was allocated, if it ever was
    pub allocated_at: Option<u64>,

    /// When the request reached a terminal status
    pub finished_at: Option<u64>,

    /// Set only for `Rejected` requests
    pub reject_reason: Option<RejectReason>,
}

impl AllocationRequest {
    /// Create a new pending request
    pub fn new(id: RequestId, vehicle: Vehicle, submitted_at: u64) -> Self {
        Self {
            id,
            vehicle,
            submitted_at,
            status: RequestStatus::Pending,
            dyno: None,
            allocated_at: None,
            finished_at: None,
            reject_reason: None,
        }
    }

    /// Milliseconds from submission to allocation
    pub fn wait_time_ms(&self) -> Option<u64> {
        self.allocated_at
            .map(|at| at.saturating_sub(self.submitted_at))
    }

    pub(crate) fn mark_allocated(&mut self, dyno: DynoId, at: u64) {
        self.status = RequestStatus::Allocated;
        self.dyno = Some(dyno);
        self.allocated_at = Some(at);
    }

    /// Move to a terminal status; returns the dyno that was held, if any
    pub(crate) fn mark_finished(&mut self, status: RequestStatus, at: u64) -> Option<DynoId> {
        self.status = status;
        self.finished_at = Some(at);
        self.dyno.take()
    }

    pub(crate) fn mark_rejected(&mut self, reason: RejectReason, at: u64) {
        self.mark_finished(RequestStatus::Rejected, at);
        self.reject_reason = Some(reason);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
