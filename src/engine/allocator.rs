//! The allocation engine.
//!
//! ## Dispatch
//!
//! Every operation that can change dyno occupancy (`submit`, `complete`,
//! `cancel`) runs its dispatch step while holding the queue lock:
//!
//! - `submit`: try the candidates, otherwise append to the queue
//! - `complete` / `cancel`: release the dyno, then rescan the queue
//!
//! That keeps append/scan/remove serialized and makes first-come-first-served
//! hold among compatible requests: a new submission cannot slip onto a dyno
//! between its release and the rescan that hands it to a waiting request.
//! The ledger's per-dyno atomics still guarantee on their own that a dyno is
//! never reserved twice.
//!
//! Lock order is queue → requests → subscribers.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::engine::{Clock, EngineStats, EventNotifier, StatsSnapshot, SystemClock};
use crate::error::{AllocationError, Result};
use crate::ledger::Ledger;
use crate::matcher::Matcher;
use crate::queue::RequestQueue;
use crate::types::{
    AllocationEvent, AllocationRequest, Dyno, DynoId, LedgerReceipt, RejectReason, RequestId,
    RequestStatus, Vehicle, VehicleId,
};

/// Inconsistency between the request table and the ledger.
///
/// A healthy engine never reports any; see [`AllocationEngine::detect_conflicts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// More than one allocated request references the same dyno
    DoubleBooked {
        dyno: DynoId,
        requests: Vec<RequestId>,
    },
    /// An allocated request's dyno is held by someone else (or nobody)
    HolderMismatch {
        dyno: DynoId,
        request: RequestId,
        holder: Option<RequestId>,
    },
    /// The ledger holds a dyno for a request that is not allocated
    OrphanReservation { dyno: DynoId, holder: RequestId },
}

/// Matches vehicles to dynos and tracks every request's lifecycle.
///
/// `AllocationEngine` is `Send + Sync`; share it behind an `Arc`.
///
/// ## Example
///
/// ```
/// use dyno_allocator::{AllocationEngine, Catalog, EngineConfig};
/// use dyno_allocator::types::{Dyno, DynoType, RequestStatus, TractionType, Vehicle};
///
/// let catalog = Catalog::new(vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel())], vec![]).unwrap();
/// let engine = AllocationEngine::new(catalog, &EngineConfig::default());
///
/// let request = engine
///     .submit(Vehicle::new(1, "V1", 1800, TractionType::four_wheel()))
///     .unwrap();
/// assert_eq!(request.status, RequestStatus::Allocated);
/// assert_eq!(request.dyno, Some(1));
/// ```
#[derive(Debug)]
pub struct AllocationEngine {
    catalog: Arc<Catalog>,
    matcher: Matcher,
    ledger: Ledger,
    queue: Mutex<RequestQueue>,
    requests: Mutex<HashMap<RequestId, AllocationRequest>>,
    next_request_id: AtomicU64,
    notifier: EventNotifier,
    stats: EngineStats,
    clock: Arc<dyn Clock>,
}

impl AllocationEngine {
    /// Create an engine over `catalog` using the wall clock
    pub fn new(catalog: impl Into<Arc<Catalog>>, config: &EngineConfig) -> Self {
        Self::with_clock(catalog, config, Arc::new(SystemClock))
    }

    /// Create an engine with an explicit time source
    pub fn with_clock(
        catalog: impl Into<Arc<Catalog>>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let catalog = catalog.into();
        let ledger = Ledger::new(&catalog);

        info!(
            dynos = catalog.dyno_count(),
            enabled = catalog.enabled_dyno_count(),
            vehicles = catalog.vehicle_count(),
            max_queue_depth = config.max_queue_depth,
            "Allocation engine ready"
        );

        Self {
            catalog,
            matcher: Matcher::new(config.compatibility.clone()),
            ledger,
            queue: Mutex::new(RequestQueue::with_max_depth(config.max_queue_depth)),
            requests: Mutex::new(HashMap::new()),
            next_request_id: AtomicU64::new(1),
            notifier: EventNotifier::new(),
            stats: EngineStats::default(),
            clock,
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Submit a vehicle for testing.
    ///
    /// Returns the request as `Allocated` when a free compatible dyno was
    /// reserved, or as `Pending` when it was queued. Never blocks waiting
    /// for a dyno; a later allocation is announced through [`subscribe`].
    ///
    /// # Errors
    ///
    /// - `InvalidVehicle`: zero weight; nothing is recorded
    /// - `NoCompatibleDyno`: no dyno could ever take the vehicle
    /// - `QueueFull`: the queue is at its maximum depth
    ///
    /// In the last two cases the request is recorded as `Rejected` and
    /// visible through [`get_request`].
    ///
    /// [`subscribe`]: AllocationEngine::subscribe
    /// [`get_request`]: AllocationEngine::get_request
    #[instrument(skip(self, vehicle), fields(vehicle_id = vehicle.id))]
    pub fn submit(&self, vehicle: Vehicle) -> Result<AllocationRequest> {
        if vehicle.weight == 0 {
            warn!("Refused vehicle with zero weight");
            return Err(AllocationError::InvalidVehicle {
                vehicle_id: vehicle.id,
                reason: "weight must be positive",
            });
        }

        let now = self.clock.now_ms();
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let mut request = AllocationRequest::new(id, vehicle, now);
        EngineStats::incr(&self.stats.submitted);

        if !self.matcher.could_ever_fit(&request.vehicle, &self.catalog, now) {
            warn!(
                request_id = id,
                weight = request.vehicle.weight,
                traction = %request.vehicle.traction,
                "Rejected: no compatible dyno"
            );
            EngineStats::incr(&self.stats.rejected_no_compatible);
            let vehicle_id = request.vehicle.id;
            request.mark_rejected(RejectReason::NoCompatibleDyno, now);
            self.record(request, None, now);
            return Err(AllocationError::NoCompatibleDyno {
                request_id: id,
                vehicle_id,
            });
        }

        let mut queue = self.queue.lock();

        if let Some(dyno) = self.try_allocate(&request.vehicle, id, now) {
            request.mark_allocated(dyno, now);
            self.stats.record_allocation(0);
            info!(request_id = id, dyno_id = dyno, "Allocated on submit");
            return Ok(self.record(request, Some(dyno), now));
        }

        match queue.push_back(id, request.vehicle.clone(), now) {
            Ok(()) => {
                EngineStats::incr(&self.stats.queued);
                debug!(request_id = id, queue_depth = queue.len(), "Queued");
                Ok(self.record(request, None, now))
            }
            Err(err) => {
                warn!(request_id = id, max_depth = queue.max_depth(), "Rejected: queue full");
                EngineStats::incr(&self.stats.rejected_queue_full);
                request.mark_rejected(RejectReason::QueueFull, now);
                self.record(request, None, now);
                Err(err)
            }
        }
    }

    /// Submit a vehicle by catalog id.
    ///
    /// # Errors
    ///
    /// `UnknownVehicle` if the catalog has no such vehicle, otherwise as
    /// [`submit`](AllocationEngine::submit).
    pub fn submit_catalog_vehicle(&self, vehicle_id: VehicleId) -> Result<AllocationRequest> {
        let vehicle = self
            .catalog
            .vehicle(vehicle_id)
            .cloned()
            .ok_or(AllocationError::UnknownVehicle(vehicle_id))?;
        self.submit(vehicle)
    }

    /// Signal test completion: release the dyno and hand it to the queue.
    ///
    /// # Errors
    ///
    /// `UnknownRequest`, or `InvalidStateTransition` unless `Allocated`.
    #[instrument(skip(self))]
    pub fn complete(&self, request_id: RequestId) -> Result<AllocationRequest> {
        let now = self.clock.now_ms();
        let mut queue = self.queue.lock();

        let (released, request) = {
            let mut requests = self.requests.lock();
            let request = requests
                .get_mut(&request_id)
                .ok_or(AllocationError::UnknownRequest(request_id))?;
            if request.status != RequestStatus::Allocated {
                return Err(AllocationError::InvalidStateTransition {
                    request_id,
                    from: request.status,
                    operation: "complete",
                });
            }

            let released = request.mark_finished(RequestStatus::Completed, now);
            self.notifier.publish(AllocationEvent::transition(
                0,
                request,
                RequestStatus::Allocated,
                released,
                now,
            ));
            (released, request.clone())
        };

        EngineStats::incr(&self.stats.completed);
        info!(request_id, dyno_id = ?released, "Completed");

        if let Some(dyno) = released {
            self.release_and_reevaluate(&mut queue, dyno, request_id, now);
        }
        Ok(request)
    }

    /// Withdraw a request.
    ///
    /// A pending request leaves the queue; an allocated one releases its
    /// dyno, which is then offered to the queue.
    ///
    /// # Errors
    ///
    /// `UnknownRequest`, or `InvalidStateTransition` from a terminal status.
    #[instrument(skip(self))]
    pub fn cancel(&self, request_id: RequestId) -> Result<AllocationRequest> {
        let now = self.clock.now_ms();
        let mut queue = self.queue.lock();

        let (previous, released, request) = {
            let mut requests = self.requests.lock();
            let request = requests
                .get_mut(&request_id)
                .ok_or(AllocationError::UnknownRequest(request_id))?;
            let previous = request.status;
            if !previous.can_transition_to(RequestStatus::Cancelled) {
                return Err(AllocationError::InvalidStateTransition {
                    request_id,
                    from: previous,
                    operation: "cancel",
                });
            }

            if previous == RequestStatus::Pending {
                queue.remove(request_id);
            }
            let released = request.mark_finished(RequestStatus::Cancelled, now);
            self.notifier.publish(AllocationEvent::transition(
                0, request, previous, released, now,
            ));
            (previous, released, request.clone())
        };

        EngineStats::incr(&self.stats.cancelled);
        info!(request_id, from = %previous, dyno_id = ?released, "Cancelled");

        if let Some(dyno) = released {
            self.release_and_reevaluate(&mut queue, dyno, request_id, now);
        }
        Ok(request)
    }

    /// Current status of a request
    pub fn get_status(&self, request_id: RequestId) -> Result<RequestStatus> {
        self.requests
            .lock()
            .get(&request_id)
            .map(|r| r.status)
            .ok_or(AllocationError::UnknownRequest(request_id))
    }

    /// Full copy of a request
    pub fn get_request(&self, request_id: RequestId) -> Result<AllocationRequest> {
        self.requests
            .lock()
            .get(&request_id)
            .cloned()
            .ok_or(AllocationError::UnknownRequest(request_id))
    }

    /// Receive every status change from now on
    pub fn subscribe(&self) -> Receiver<AllocationEvent> {
        self.notifier.subscribe()
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// First-fit over the tightest-fit candidate order
    fn try_allocate(&self, vehicle: &Vehicle, request_id: RequestId, now: u64) -> Option<DynoId> {
        let candidates = self
            .matcher
            .candidate_dynos(vehicle, &self.catalog, &self.ledger, now);
        debug!(request_id, candidates = candidates.len(), "Trying candidates");

        candidates
            .into_iter()
            .find(|dyno| matches!(self.ledger.try_reserve(dyno.id, request_id), Ok(true)))
            .map(|dyno| dyno.id)
    }

    fn release_and_reevaluate(
        &self,
        queue: &mut RequestQueue,
        dyno: DynoId,
        request_id: RequestId,
        now: u64,
    ) {
        match self.ledger.release(dyno) {
            Ok(Some(holder)) if holder == request_id => {}
            Ok(holder) => warn!(
                dyno_id = dyno,
                request_id,
                ?holder,
                "Released dyno held by another request"
            ),
            Err(err) => warn!(dyno_id = dyno, %err, "Release failed"),
        }
        self.reevaluate(queue, dyno, now);
    }

    /// Offer a freed dyno to waiting requests, oldest first.
    ///
    /// Only requests compatible with the freed dyno are attempted. The scan
    /// stops once the freed dyno is taken.
    fn reevaluate(&self, queue: &mut RequestQueue, freed: DynoId, now: u64) {
        let Some(freed_dyno) = self.catalog.dyno(freed) else {
            return;
        };

        let waiting: Vec<RequestId> = queue
            .iter()
            .filter(|node| self.matcher.is_compatible(&node.vehicle, freed_dyno, now))
            .map(|node| node.request_id)
            .collect();

        for request_id in waiting {
            if !matches!(self.ledger.is_free(freed), Ok(true)) {
                break;
            }
            let Some(node) = queue.get(request_id) else {
                continue;
            };
            let Some(dyno) = self.try_allocate(&node.vehicle, request_id, now) else {
                continue;
            };
            queue.remove(request_id);

            let mut requests = self.requests.lock();
            match requests.get_mut(&request_id) {
                Some(request) => {
                    request.mark_allocated(dyno, now);
                    self.stats
                        .record_allocation(request.wait_time_ms().unwrap_or(0));
                    self.notifier.publish(AllocationEvent::transition(
                        0,
                        request,
                        RequestStatus::Pending,
                        Some(dyno),
                        now,
                    ));
                    info!(
                        request_id,
                        dyno_id = dyno,
                        queue_depth = queue.len(),
                        "Allocated from queue"
                    );
                }
                None => {
                    warn!(request_id, dyno_id = dyno, "Queued request missing from table");
                    let _ = self.ledger.release(dyno);
                }
            }
        }
    }

    /// Store a freshly decided request and announce it
    fn record(&self, request: AllocationRequest, dyno: Option<DynoId>, now: u64) -> AllocationRequest {
        let mut requests = self.requests.lock();
        self.notifier.publish(AllocationEvent::transition(
            0,
            &request,
            RequestStatus::Pending,
            dyno,
            now,
        ));
        requests.insert(request.id, request.clone());
        request
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Requests in a given status, ordered by id
    pub fn requests_by_status(&self, status: RequestStatus) -> Vec<AllocationRequest> {
        let mut matching: Vec<_> = self
            .requests
            .lock()
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.id);
        matching
    }

    /// Every request made for a vehicle, ordered by id
    pub fn requests_for_vehicle(&self, vehicle_id: VehicleId) -> Vec<AllocationRequest> {
        let mut matching: Vec<_> = self
            .requests
            .lock()
            .values()
            .filter(|r| r.vehicle.id == vehicle_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.id);
        matching
    }

    pub fn count_by_status(&self, status: RequestStatus) -> usize {
        self.requests
            .lock()
            .values()
            .filter(|r| r.status == status)
            .count()
    }

    /// Waiting request ids, oldest first
    pub fn queued_requests(&self) -> Vec<RequestId> {
        self.queue.lock().iter().map(|n| n.request_id).collect()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.lock().len()
    }

    /// Cross-check allocated requests against the ledger.
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let _queue = self.queue.lock();
        let requests = self.requests.lock();

        let mut by_dyno: BTreeMap<DynoId, Vec<RequestId>> = BTreeMap::new();
        for request in requests.values() {
            if let (RequestStatus::Allocated, Some(dyno)) = (request.status, request.dyno) {
                by_dyno.entry(dyno).or_default().push(request.id);
            }
        }

        let mut conflicts = Vec::new();
        for (&dyno, ids) in by_dyno.iter_mut() {
            ids.sort_unstable();
            if ids.len() > 1 {
                conflicts.push(Conflict::DoubleBooked {
                    dyno,
                    requests: ids.clone(),
                });
            }
            let holder = self.ledger.holder(dyno).ok().flatten();
            for &request in ids.iter() {
                if holder != Some(request) {
                    conflicts.push(Conflict::HolderMismatch {
                        dyno,
                        request,
                        holder,
                    });
                }
            }
        }

        for (dyno, holder) in self.ledger.reservations() {
            let allocated = by_dyno
                .get(&dyno)
                .is_some_and(|ids| ids.contains(&holder));
            if !allocated {
                conflicts.push(Conflict::OrphanReservation { dyno, holder });
            }
        }

        conflicts
    }

    /// Enabled dynos outside their availability window right now.
    ///
    /// These are skipped by matching until their window opens; a dyno past
    /// its `available_to` should be disabled in the catalog.
    pub fn maintenance_check(&self) -> Vec<&Dyno> {
        let now = self.clock.now_ms();
        let unavailable: Vec<&Dyno> = self
            .catalog
            .dynos()
            .iter()
            .filter(|dyno| dyno.enabled && !dyno.is_available_at(now))
            .collect();

        for dyno in &unavailable {
            warn!(
                dyno_id = dyno.id,
                available_from = ?dyno.available_from,
                available_to = ?dyno.available_to,
                "Dyno outside its availability window"
            );
        }
        unavailable
    }

    /// Counters plus current queue depth and reserved dynos
    pub fn stats(&self) -> StatsSnapshot {
        let depth = self.queue_depth();
        self.stats.snapshot(depth, self.ledger.reserved_count())
    }

    /// Occupancy snapshot with the ledger state root
    pub fn receipt(&self) -> LedgerReceipt {
        let queue = self.queue.lock();
        LedgerReceipt::new(
            self.notifier.last_sequence(),
            self.catalog.enabled_dyno_count() as u64,
            self.ledger.reserved_count() as u64,
            queue.len() as u64,
            self.ledger.compute_state_root(),
            self.clock.now_ms(),
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
