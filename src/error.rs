//! Error types for the dyno allocation engine.
//!
//! Every error is reported synchronously to the caller of the operation that
//! triggered it. The engine never retries internally, and a failed call
//! leaves no reservation behind.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{DynoId, RequestId, RequestStatus, VehicleId};

/// Errors returned by engine, ledger and catalog operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// No dyno in the catalog can ever take this vehicle (weight or type).
    /// The request was recorded as rejected.
    #[error("request {request_id}: no compatible dyno for vehicle {vehicle_id}")]
    NoCompatibleDyno {
        request_id: RequestId,
        vehicle_id: VehicleId,
    },

    /// The waiting queue is at its maximum depth. The request was recorded
    /// as rejected; the caller may resubmit later.
    #[error("request {request_id}: queue full (max depth {max_depth})")]
    QueueFull {
        request_id: RequestId,
        max_depth: usize,
    },

    /// `complete`/`cancel` on a request that is not in an eligible status
    #[error("request {request_id}: cannot {operation} from status {from}")]
    InvalidStateTransition {
        request_id: RequestId,
        from: RequestStatus,
        operation: &'static str,
    },

    #[error("unknown request {0}")]
    UnknownRequest(RequestId),

    #[error("unknown dyno {0}")]
    UnknownDyno(DynoId),

    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),

    /// Submitted vehicle fails validation; no request was recorded
    #[error("invalid vehicle {vehicle_id}: {reason}")]
    InvalidVehicle {
        vehicle_id: VehicleId,
        reason: &'static str,
    },

    /// Catalog snapshot violates a structural rule (duplicate id, zero weight)
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// SSZ encoding or decoding failed
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl AllocationError {
    /// Rejections that were recorded against a request id
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AllocationError::NoCompatibleDyno { .. } | AllocationError::QueueFull { .. }
        )
    }
}

/// Errors raised while loading configuration or catalog snapshots.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{name} has invalid value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Catalog(#[from] AllocationError),
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, AllocationError>;
