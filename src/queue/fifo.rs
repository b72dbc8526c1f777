//! Bounded FIFO of requests waiting for a compatible dyno.
//!
//! ## Queue Structure
//!
//! ```text
//! head (oldest) <-> req2 <-> req3 <-> tail (newest)
//! ```
//!
//! - New requests are appended at the tail
//! - Re-evaluation walks from the head
//! - Any request can be removed in O(1) through the id → slab key index
//!
//! The slab is pre-allocated to the maximum depth, so a full queue never
//! reallocates.

use std::collections::HashMap;

use slab::Slab;

use crate::error::AllocationError;
use crate::queue::QueueNode;
use crate::types::{RequestId, Vehicle};

/// FIFO request queue with a hard maximum depth.
#[derive(Debug)]
pub struct RequestQueue {
    /// Node storage
    nodes: Slab<QueueNode>,

    /// Oldest waiting request (slab key)
    head: Option<usize>,

    /// Newest waiting request (slab key)
    tail: Option<usize>,

    /// Request ID to slab key mapping
    index: HashMap<RequestId, usize>,

    max_depth: usize,
}

impl RequestQueue {
    /// Create an empty queue holding at most `max_depth` requests
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(max_depth),
            head: None,
            tail: None,
            index: HashMap::with_capacity(max_depth),
            max_depth,
        }
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.nodes.len() >= self.max_depth
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn contains(&self, request_id: RequestId) -> bool {
        self.index.contains_key(&request_id)
    }

    // ========================================================================
    // Queue Management
    // ========================================================================

    /// Append a request at the tail.
    ///
    /// Re-queuing an id that is already waiting is a no-op.
    ///
    /// # Errors
    ///
    /// `QueueFull` if the queue is at its maximum depth.
    pub fn push_back(
        &mut self,
        request_id: RequestId,
        vehicle: Vehicle,
        submitted_at: u64,
    ) -> Result<(), AllocationError> {
        if self.contains(request_id) {
            return Ok(());
        }
        if self.is_full() {
            return Err(AllocationError::QueueFull {
                request_id,
                max_depth: self.max_depth,
            });
        }

        let mut node = QueueNode::new(request_id, vehicle, submitted_at);
        node.prev = self.tail;
        let key = self.nodes.insert(node);

        match self.tail.and_then(|tail| self.nodes.get_mut(tail)) {
            Some(tail_node) => tail_node.next = Some(key),
            // Empty list - this is also the head
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.index.insert(request_id, key);

        Ok(())
    }

    /// Unlink and return a waiting request
    pub fn remove(&mut self, request_id: RequestId) -> Option<QueueNode> {
        let key = self.index.remove(&request_id)?;
        let node = self.nodes.try_remove(key)?;

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.nodes.get_mut(prev) {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.nodes.get_mut(next) {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        Some(node)
    }

    /// Waiting request by id
    pub fn get(&self, request_id: RequestId) -> Option<&QueueNode> {
        let key = *self.index.get(&request_id)?;
        self.nodes.get(key)
    }

    /// Oldest waiting request
    pub fn front(&self) -> Option<&QueueNode> {
        self.head.and_then(|key| self.nodes.get(key))
    }

    /// Waiting requests, oldest first
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    /// Drop every waiting request
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }
}

/// Front-to-back iterator over a [`RequestQueue`]
pub struct Iter<'a> {
    nodes: &'a Slab<QueueNode>,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a QueueNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.cursor?)?;
        self.cursor = node.next;
        Some(node)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
