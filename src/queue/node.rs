//! Queue node for slab-based storage.
//!
//! `QueueNode` carries a waiting request plus doubly-linked list pointers so
//! a cancelled or allocated request can be unlinked from anywhere in the
//! queue in O(1) once its slab key is known.
//!
//! - `next`: the next (younger) request
//! - `prev`: the previous (older) request

use crate::types::{RequestId, Vehicle};

/// A waiting request stored in the queue slab.
///
/// The pointers are slab keys (`usize`), not references.
#[derive(Debug, Clone)]
pub struct QueueNode {
    pub request_id: RequestId,

    /// Vehicle snapshot, so re-evaluation never touches the request table
    pub vehicle: Vehicle,

    /// Submission timestamp (ms)
    pub submitted_at: u64,

    /// Next request in the queue (slab key), `None` at the tail
    pub next: Option<usize>,

    /// Previous request in the queue (slab key), `None` at the head
    pub prev: Option<usize>,
}

impl QueueNode {
    /// Create a new, unlinked node
    #[inline]
    pub fn new(request_id: RequestId, vehicle: Vehicle, submitted_at: u64) -> Self {
        Self {
            request_id,
            vehicle,
            submitted_at,
            next: None,
            prev: None,
        }
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.next.is_some() || self.prev.is_some()
    }
}
