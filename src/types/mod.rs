//! Core data types for the dyno allocation engine
//!
//! ## Types
//!
//! - [`Vehicle`] / [`TractionType`]: a vehicle and its drivetrain tag
//! - [`Dyno`] / [`DynoType`]: a test resource and its equipment tag
//! - [`AllocationRequest`]: a vehicle's request for dyno time
//! - [`RequestStatus`] / [`RejectReason`]: request lifecycle
//! - [`AllocationEvent`]: SSZ-encoded status transition
//! - [`LedgerReceipt`]: SSZ-encoded occupancy snapshot with state root
//!
//! Identifiers are plain `u64`s matching the catalog's primary keys.

mod vehicle;
mod dyno;
mod request;
mod event;
mod receipt;

pub use vehicle::{TractionType, Vehicle, VehicleId};
pub use dyno::{Dyno, DynoId, DynoType};
pub use request::{AllocationRequest, RejectReason, RequestId, RequestStatus};
pub use event::AllocationEvent;
pub use receipt::LedgerReceipt;
