//! Allocation engine for the dyno pool.
//!
//! ## Allocation Rules
//!
//! - A vehicle fits a dyno when the dyno is enabled and inside its
//!   availability window, rated for the vehicle's weight, and its type is
//!   accepted for the vehicle's traction
//! - Among free fits the tightest one wins: smallest max weight, then
//!   lowest dyno id
//! - A vehicle that fits some dyno but finds none free waits in a FIFO
//! - A vehicle that fits no dyno at all is rejected immediately
//! - A released dyno goes to the oldest waiting request it fits
//!
//! ## Example
//!
//! ```
//! use dyno_allocator::{AllocationEngine, Catalog, EngineConfig};
//! use dyno_allocator::types::{Dyno, DynoType, RequestStatus, TractionType, Vehicle};
//!
//! let catalog = Catalog::new(
//!     vec![
//!         Dyno::new(1, "D1", 2000, DynoType::four_wheel()),
//!         Dyno::new(2, "D2", 5000, DynoType::four_wheel()),
//!     ],
//!     vec![],
//! )
//! .unwrap();
//! let engine = AllocationEngine::new(catalog, &EngineConfig::default());
//!
//! let v1 = engine.submit(Vehicle::new(1, "V1", 1800, TractionType::four_wheel())).unwrap();
//! let v2 = engine.submit(Vehicle::new(2, "V2", 1900, TractionType::four_wheel())).unwrap();
//! let v3 = engine.submit(Vehicle::new(3, "V3", 1900, TractionType::four_wheel())).unwrap();
//! assert_eq!((v1.dyno, v2.dyno), (Some(1), Some(2)));
//! assert_eq!(v3.status, RequestStatus::Pending);
//!
//! engine.complete(v1.id).unwrap();
//! assert_eq!(engine.get_request(v3.id).unwrap().dyno, Some(1));
//! ```

pub mod allocator;
pub mod clock;
pub mod notifier;
pub mod stats;

pub use allocator::{AllocationEngine, Conflict};
pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::EventNotifier;
pub use stats::{EngineStats, StatsSnapshot};
