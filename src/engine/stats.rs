//! Outcome counters for the allocation engine.
//!
//! These back the externally-owned metrics (requests by outcome, time to
//! allocation, queue depth). Counters only ever grow.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated with relaxed atomics.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub submitted: AtomicU64,
    pub allocated: AtomicU64,
    /// Times a request entered the queue
    pub queued: AtomicU64,
    pub rejected_no_compatible: AtomicU64,
    pub rejected_queue_full: AtomicU64,
    pub completed: AtomicU64,
    pub cancelled: AtomicU64,
    /// Sum of submission-to-allocation latencies
    pub total_wait_ms: AtomicU64,
}

impl EngineStats {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_allocation(&self, wait_ms: u64) {
        Self::incr(&self.allocated);
        self.total_wait_ms.fetch_add(wait_ms, Ordering::Relaxed);
    }

    /// Point-in-time copy, combined with gauges the caller provides
    pub fn snapshot(&self, queue_depth: usize, dynos_reserved: usize) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            allocated: self.allocated.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            rejected_no_compatible: self.rejected_no_compatible.load(Ordering::Relaxed),
            rejected_queue_full: self.rejected_queue_full.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            total_wait_ms: self.total_wait_ms.load(Ordering::Relaxed),
            queue_depth,
            dynos_reserved,
        }
    }
}

/// Copy of the counters plus current gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub allocated: u64,
    pub queued: u64,
    pub rejected_no_compatible: u64,
    pub rejected_queue_full: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub total_wait_ms: u64,
    pub queue_depth: usize,
    pub dynos_reserved: usize,
}

impl StatsSnapshot {
    pub fn rejected(&self) -> u64 {
        self.rejected_no_compatible + self.rejected_queue_full
    }

    /// Mean submission-to-allocation latency
    pub fn mean_wait_ms(&self) -> Option<u64> {
        (self.allocated > 0).then(|| self.total_wait_ms / self.allocated)
    }
}
