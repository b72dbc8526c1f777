//! Request queue for the dyno allocation engine.
//!
//! ## Architecture
//!
//! - **Slab-based storage**: O(1) insert and removal of waiting requests
//! - **Intrusive linked list**: FIFO by submission
//! - **Index**: request id → slab key for O(1) cancellation
//!
//! ## Components
//!
//! - [`QueueNode`]: waiting request plus list pointers
//! - [`RequestQueue`]: bounded FIFO over the slab
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Append | O(1) |
//! | Remove by request id | O(1) |
//! | Scan front to back | O(n) |
//!
//! ## Example
//!
//! ```
//! use dyno_allocator::queue::RequestQueue;
//! use dyno_allocator::types::{TractionType, Vehicle};
//!
//! let mut queue = RequestQueue::with_max_depth(16);
//! let vehicle = Vehicle::new(1, "V1", 1900, TractionType::four_wheel());
//! queue.push_back(7, vehicle, 0).unwrap();
//!
//! assert_eq!(queue.front().map(|n| n.request_id), Some(7));
//! ```

pub mod node;
pub mod fifo;

pub use node::QueueNode;
pub use fifo::RequestQueue;
