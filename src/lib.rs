//! # Dyno Allocator
//!
//! Assigns vehicles to dynamometer test stations.
//!
//! ## Architecture
//!
//! - **Types**: Vehicle, Dyno, AllocationRequest, AllocationEvent, LedgerReceipt
//! - **Catalog**: read-only dynos and vehicles, ordered tightest-fit first
//! - **Matcher**: compatibility rules and candidate selection
//! - **Ledger**: one atomic reservation cell per dyno
//! - **Queue**: bounded FIFO of requests waiting for a dyno
//! - **Engine**: submit / complete / cancel, re-evaluation and events
//!
//! ## Guarantees
//!
//! 1. A dyno is reserved by at most one request at any instant
//! 2. Allocations only go to compatible dynos
//! 3. Waiting requests are served first-come-first-served among those a
//!    freed dyno fits
//! 4. A vehicle no dyno could ever take is rejected, never queued

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Vehicle, Dyno, AllocationRequest, events and receipts
pub mod types;

/// Error types
pub mod error;

/// Environment-driven configuration
pub mod config;

/// Dyno and vehicle catalog
pub mod catalog;

/// Compatibility rules and candidate selection
pub mod matcher;

/// Per-dyno reservation cells
pub mod ledger;

/// Bounded FIFO of waiting requests
pub mod queue;

/// Allocation engine
pub mod engine;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use types::{
    AllocationEvent, AllocationRequest, Dyno, DynoType, LedgerReceipt, RejectReason,
    RequestStatus, TractionType, Vehicle,
};
pub use error::{AllocationError, ConfigError};
pub use config::EngineConfig;
pub use catalog::{Catalog, CatalogSnapshot};
pub use matcher::{CompatibilityTable, Matcher};
pub use ledger::Ledger;
pub use queue::RequestQueue;
pub use engine::{AllocationEngine, Conflict, StatsSnapshot};
