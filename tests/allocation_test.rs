//! End-to-end allocation scenarios.
//!
//! Each test drives the public engine API and checks the observable
//! guarantees: tightest-fit selection, FIFO hand-off of released dynos,
//! immediate rejection of vehicles nothing can take, and a ledger that
//! always agrees with the request table.

use std::sync::Arc;

use dyno_allocator::engine::ManualClock;
use dyno_allocator::types::{AllocationEvent, Dyno, DynoType, RequestId, TractionType, Vehicle};
use dyno_allocator::{
    AllocationEngine, AllocationError, Catalog, CompatibilityTable, EngineConfig, RejectReason,
    RequestStatus,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn four_wheel(id: u64, weight: u64) -> Vehicle {
    Vehicle::new(id, format!("V{id}"), weight, TractionType::four_wheel())
}

fn engine_with(dynos: Vec<Dyno>, config: EngineConfig) -> (AllocationEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000));
    let catalog = Catalog::new(dynos, vec![]).unwrap();
    let engine = AllocationEngine::with_clock(catalog, &config, clock.clone());
    (engine, clock)
}

/// D1 (2000, four-wheel) and D2 (5000, four-wheel)
fn two_dyno_engine() -> (AllocationEngine, Arc<ManualClock>) {
    engine_with(
        vec![
            Dyno::new(1, "D1", 2000, DynoType::four_wheel()),
            Dyno::new(2, "D2", 5000, DynoType::four_wheel()),
        ],
        EngineConfig::default(),
    )
}

fn status(engine: &AllocationEngine, id: RequestId) -> RequestStatus {
    engine.get_status(id).unwrap()
}

// ============================================================================
// ALLOCATION
// ============================================================================

#[test]
fn worked_example_hands_released_dyno_to_waiting_vehicle() {
    let (engine, clock) = two_dyno_engine();

    let v1 = engine.submit(four_wheel(1, 1800)).unwrap();
    let v2 = engine.submit(four_wheel(2, 1900)).unwrap();
    let v3 = engine.submit(four_wheel(3, 1900)).unwrap();

    assert_eq!(v1.status, RequestStatus::Allocated);
    assert_eq!(v1.dyno, Some(1));
    assert_eq!(v2.dyno, Some(2));
    assert_eq!(v3.status, RequestStatus::Pending);
    assert_eq!(engine.queued_requests(), vec![v3.id]);

    clock.advance(500);
    let done = engine.complete(v1.id).unwrap();
    assert_eq!(done.status, RequestStatus::Completed);

    let v3 = engine.get_request(v3.id).unwrap();
    assert_eq!(v3.status, RequestStatus::Allocated);
    assert_eq!(v3.dyno, Some(1));
    assert_eq!(v3.wait_time_ms(), Some(500));
    assert_eq!(engine.queue_depth(), 0);
    assert_eq!(engine.ledger().holder(1).unwrap(), Some(v3.id));
    assert!(engine.detect_conflicts().is_empty());
}

#[test]
fn tightest_fit_prefers_smallest_capacity_then_lowest_id() {
    let (engine, _) = engine_with(
        vec![
            Dyno::new(1, "big", 5000, DynoType::four_wheel()),
            Dyno::new(3, "small-b", 2000, DynoType::four_wheel()),
            Dyno::new(2, "small-a", 2000, DynoType::four_wheel()),
        ],
        EngineConfig::default(),
    );

    let first = engine.submit(four_wheel(1, 1500)).unwrap();
    let second = engine.submit(four_wheel(2, 1500)).unwrap();
    let third = engine.submit(four_wheel(3, 1500)).unwrap();

    assert_eq!(first.dyno, Some(2));
    assert_eq!(second.dyno, Some(3));
    assert_eq!(third.dyno, Some(1));
}

#[test]
fn weight_equal_to_capacity_fits() {
    let (engine, _) = two_dyno_engine();
    let request = engine.submit(four_wheel(1, 2000)).unwrap();
    assert_eq!(request.dyno, Some(1));
}

#[test]
fn all_wheel_vehicle_uses_four_wheel_dyno() {
    let (engine, _) = engine_with(
        vec![
            Dyno::new(1, "4wd", 3000, DynoType::four_wheel()),
            Dyno::new(2, "awd", 6000, DynoType::all_wheel()),
        ],
        EngineConfig::default(),
    );

    let awd = Vehicle::new(1, "awd", 2500, TractionType::all_wheel());
    assert_eq!(engine.submit(awd).unwrap().dyno, Some(1));

    // four-wheel vehicles never go to an all-wheel dyno
    let car = engine.submit(four_wheel(2, 2500)).unwrap();
    assert_eq!(car.status, RequestStatus::Pending);
}

#[test]
fn custom_compatibility_table_is_honoured() {
    let table = CompatibilityTable::empty()
        .allow(TractionType::two_wheel(), [DynoType::four_wheel()]);
    let (engine, _) = engine_with(
        vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel())],
        EngineConfig::default().with_compatibility(table),
    );

    let bike = Vehicle::new(1, "bike", 300, TractionType::two_wheel());
    assert_eq!(engine.submit(bike).unwrap().dyno, Some(1));

    let err = engine.submit(four_wheel(2, 1000)).unwrap_err();
    assert!(matches!(err, AllocationError::NoCompatibleDyno { .. }));
}

// ============================================================================
// REJECTION
// ============================================================================

#[test]
fn overweight_vehicle_is_rejected_not_queued() {
    let (engine, _) = two_dyno_engine();

    let err = engine.submit(four_wheel(9, 6000)).unwrap_err();
    let request_id = match err {
        AllocationError::NoCompatibleDyno {
            request_id,
            vehicle_id,
        } => {
            assert_eq!(vehicle_id, 9);
            request_id
        }
        other => panic!("unexpected error {other:?}"),
    };

    let request = engine.get_request(request_id).unwrap();
    assert_eq!(request.status, RequestStatus::Rejected);
    assert_eq!(request.reject_reason, Some(RejectReason::NoCompatibleDyno));
    assert_eq!(engine.queue_depth(), 0);
    assert_eq!(engine.ledger().reserved_count(), 0);
}

#[test]
fn vehicle_with_no_matching_type_is_rejected() {
    let (engine, _) = two_dyno_engine();
    let bike = Vehicle::new(1, "bike", 200, TractionType::two_wheel());

    let err = engine.submit(bike).unwrap_err();
    assert!(matches!(err, AllocationError::NoCompatibleDyno { .. }));
}

#[test]
fn disabled_dyno_is_never_allocated() {
    let (engine, _) = engine_with(
        vec![
            Dyno::new(1, "D1", 2000, DynoType::four_wheel()).with_enabled(false),
            Dyno::new(2, "D2", 5000, DynoType::four_wheel()),
        ],
        EngineConfig::default(),
    );

    assert_eq!(engine.submit(four_wheel(1, 1500)).unwrap().dyno, Some(2));

    // only the disabled dyno would be tight enough; D2 is busy, so wait
    assert_eq!(
        engine.submit(four_wheel(2, 1500)).unwrap().status,
        RequestStatus::Pending
    );
}

#[test]
fn only_disabled_dynos_fit_means_rejection() {
    let (engine, _) = engine_with(
        vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel()).with_enabled(false)],
        EngineConfig::default(),
    );
    assert!(engine.submit(four_wheel(1, 1500)).is_err());
}

#[test]
fn full_queue_rejects_with_reason() {
    let (engine, _) = engine_with(
        vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel())],
        EngineConfig::default().with_max_queue_depth(1),
    );

    engine.submit(four_wheel(1, 1000)).unwrap();
    let waiting = engine.submit(four_wheel(2, 1000)).unwrap();
    assert_eq!(waiting.status, RequestStatus::Pending);

    let err = engine.submit(four_wheel(3, 1000)).unwrap_err();
    let request_id = match err {
        AllocationError::QueueFull {
            request_id,
            max_depth,
        } => {
            assert_eq!(max_depth, 1);
            request_id
        }
        other => panic!("expected QueueFull, got {other:?}"),
    };

    let rejected = engine.get_request(request_id).unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.reject_reason, Some(RejectReason::QueueFull));
    assert_eq!(engine.queued_requests(), vec![waiting.id]);
}

// ============================================================================
// AVAILABILITY WINDOWS
// ============================================================================

#[test]
fn dyno_outside_window_is_skipped_until_it_opens() {
    // clock starts at 1_000
    let (engine, clock) = engine_with(
        vec![
            Dyno::new(1, "D1", 2000, DynoType::four_wheel()).with_availability(Some(5_000), None),
            Dyno::new(2, "D2", 5000, DynoType::four_wheel()),
        ],
        EngineConfig::default(),
    );

    let early = engine.submit(four_wheel(1, 1800)).unwrap();
    assert_eq!(early.dyno, Some(2));
    let waiting = engine.submit(four_wheel(2, 1800)).unwrap();
    assert_eq!(waiting.status, RequestStatus::Pending);

    clock.set(5_000);
    let late = engine.submit(four_wheel(3, 1800)).unwrap();
    assert_eq!(late.dyno, Some(1));
    assert!(engine.maintenance_check().is_empty());
}

#[test]
fn vehicle_fitting_only_closed_dynos_is_rejected() {
    let (engine, _) = engine_with(
        vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel()).with_availability(None, Some(500))],
        EngineConfig::default(),
    );

    let err = engine.submit(four_wheel(1, 1800)).unwrap_err();
    assert!(matches!(err, AllocationError::NoCompatibleDyno { .. }));
    let closed: Vec<_> = engine.maintenance_check().iter().map(|d| d.id).collect();
    assert_eq!(closed, vec![1]);
}

#[test]
fn released_dyno_past_its_window_is_not_handed_over() {
    let (engine, clock) = engine_with(
        vec![
            Dyno::new(1, "D1", 2000, DynoType::four_wheel()).with_availability(None, Some(2_000)),
            Dyno::new(2, "D2", 5000, DynoType::four_wheel()),
        ],
        EngineConfig::default(),
    );

    let v1 = engine.submit(four_wheel(1, 1800)).unwrap();
    let v2 = engine.submit(four_wheel(2, 1800)).unwrap();
    let v3 = engine.submit(four_wheel(3, 1800)).unwrap();
    assert_eq!((v1.dyno, v2.dyno), (Some(1), Some(2)));
    assert_eq!(v3.status, RequestStatus::Pending);

    clock.set(3_000);
    engine.complete(v1.id).unwrap();
    assert_eq!(status(&engine, v3.id), RequestStatus::Pending);
    assert!(engine.ledger().is_free(1).unwrap());

    engine.complete(v2.id).unwrap();
    assert_eq!(engine.get_request(v3.id).unwrap().dyno, Some(2));
    assert!(engine.detect_conflicts().is_empty());
}

// ============================================================================
// RELEASE AND RE-EVALUATION
// ============================================================================

#[test]
fn released_dyno_goes_to_oldest_compatible_request() {
    let (engine, _) = engine_with(
        vec![
            Dyno::new(1, "bike bay", 600, DynoType::two_wheel()),
            Dyno::new(2, "car bay", 2000, DynoType::four_wheel()),
        ],
        EngineConfig::default(),
    );
    let bike = |id| Vehicle::new(id, "bike", 250, TractionType::two_wheel());

    let bike_1 = engine.submit(bike(1)).unwrap();
    let car_1 = engine.submit(four_wheel(2, 1500)).unwrap();
    let bike_2 = engine.submit(bike(3)).unwrap();
    let car_2 = engine.submit(four_wheel(4, 1200)).unwrap();
    let car_3 = engine.submit(four_wheel(5, 1100)).unwrap();
    assert_eq!(engine.queued_requests(), vec![bike_2.id, car_2.id, car_3.id]);

    // bike_2 is older but cannot use the car bay
    engine.complete(car_1.id).unwrap();
    assert_eq!(status(&engine, car_2.id), RequestStatus::Allocated);
    assert_eq!(status(&engine, bike_2.id), RequestStatus::Pending);
    assert_eq!(status(&engine, car_3.id), RequestStatus::Pending);

    engine.complete(bike_1.id).unwrap();
    assert_eq!(engine.get_request(bike_2.id).unwrap().dyno, Some(1));
    assert_eq!(engine.queued_requests(), vec![car_3.id]);
    assert!(engine.detect_conflicts().is_empty());
}

#[test]
fn cancelling_allocated_request_frees_dyno_for_queue() {
    let (engine, _) = engine_with(
        vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel())],
        EngineConfig::default(),
    );

    let holder = engine.submit(four_wheel(1, 1000)).unwrap();
    let waiting = engine.submit(four_wheel(2, 1000)).unwrap();

    let cancelled = engine.cancel(holder.id).unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert_eq!(engine.get_request(waiting.id).unwrap().dyno, Some(1));
}

#[test]
fn cancelling_pending_request_leaves_queue() {
    let (engine, _) = engine_with(
        vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel())],
        EngineConfig::default(),
    );

    let holder = engine.submit(four_wheel(1, 1000)).unwrap();
    let first = engine.submit(four_wheel(2, 1000)).unwrap();
    let second = engine.submit(four_wheel(3, 1000)).unwrap();

    engine.cancel(first.id).unwrap();
    assert_eq!(engine.queued_requests(), vec![second.id]);

    engine.complete(holder.id).unwrap();
    assert_eq!(status(&engine, first.id), RequestStatus::Cancelled);
    assert_eq!(status(&engine, second.id), RequestStatus::Allocated);
}

#[test]
fn completing_twice_is_an_error_and_changes_nothing() {
    let (engine, _) = two_dyno_engine();
    let first = engine.submit(four_wheel(1, 1800)).unwrap();
    engine.complete(first.id).unwrap();

    let second = engine.submit(four_wheel(2, 1800)).unwrap();
    assert_eq!(second.dyno, Some(1));

    let err = engine.complete(first.id).unwrap_err();
    assert_eq!(
        err,
        AllocationError::InvalidStateTransition {
            request_id: first.id,
            from: RequestStatus::Completed,
            operation: "complete",
        }
    );
    // the new holder is untouched
    assert_eq!(engine.ledger().holder(1).unwrap(), Some(second.id));
}

#[test]
fn invalid_transitions_are_reported() {
    let (engine, _) = engine_with(
        vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel())],
        EngineConfig::default(),
    );
    engine.submit(four_wheel(1, 1000)).unwrap();
    let pending = engine.submit(four_wheel(2, 1000)).unwrap();
    let rejected = engine.submit(four_wheel(3, 9000)).unwrap_err();

    assert!(matches!(
        engine.complete(pending.id),
        Err(AllocationError::InvalidStateTransition { from: RequestStatus::Pending, .. })
    ));

    let rejected_id = match rejected {
        AllocationError::NoCompatibleDyno { request_id, .. } => request_id,
        other => panic!("unexpected error {other:?}"),
    };
    assert!(matches!(
        engine.cancel(rejected_id),
        Err(AllocationError::InvalidStateTransition { from: RequestStatus::Rejected, .. })
    ));

    engine.cancel(pending.id).unwrap();
    assert!(engine.cancel(pending.id).is_err());
}

#[test]
fn unknown_ids_are_reported() {
    let (engine, _) = two_dyno_engine();

    assert_eq!(engine.complete(77), Err(AllocationError::UnknownRequest(77)));
    assert_eq!(engine.cancel(77), Err(AllocationError::UnknownRequest(77)));
    assert_eq!(engine.get_status(77), Err(AllocationError::UnknownRequest(77)));
    assert_eq!(
        engine.submit_catalog_vehicle(42),
        Err(AllocationError::UnknownVehicle(42))
    );
}

#[test]
fn catalog_vehicles_can_be_submitted_by_id() {
    let catalog = Catalog::new(
        vec![Dyno::new(1, "D1", 2000, DynoType::four_wheel())],
        vec![four_wheel(7, 1800)],
    )
    .unwrap();
    let engine = AllocationEngine::new(catalog, &EngineConfig::default());

    let request = engine.submit_catalog_vehicle(7).unwrap();
    assert_eq!(request.vehicle.id, 7);
    assert_eq!(request.dyno, Some(1));
}

// ============================================================================
// EVENTS, QUERIES AND RECEIPTS
// ============================================================================

#[test]
fn events_arrive_in_transition_order() {
    let (engine, _) = two_dyno_engine();
    let events = engine.subscribe();

    let v1 = engine.submit(four_wheel(1, 1800)).unwrap();
    let v2 = engine.submit(four_wheel(2, 1900)).unwrap();
    let v3 = engine.submit(four_wheel(3, 1900)).unwrap();
    engine.complete(v1.id).unwrap();

    let seen: Vec<_> = events
        .try_iter()
        .map(|e| (e.sequence, e.request_id, e.previous(), e.status(), e.dyno()))
        .collect();

    use RequestStatus::*;
    assert_eq!(
        seen,
        vec![
            (1, v1.id, Pending, Allocated, Some(1)),
            (2, v2.id, Pending, Allocated, Some(2)),
            (3, v3.id, Pending, Pending, None),
            (4, v1.id, Allocated, Completed, Some(1)),
            (5, v3.id, Pending, Allocated, Some(1)),
        ]
    );
}

#[test]
fn encoded_events_keep_their_dyno() {
    let (engine, _) = two_dyno_engine();
    let events = engine.subscribe();

    let v1 = engine.submit(four_wheel(1, 1800)).unwrap();
    engine.submit(four_wheel(2, 1900)).unwrap();
    engine.submit(four_wheel(3, 1900)).unwrap();
    engine.complete(v1.id).unwrap();

    let dynos: Vec<_> = events
        .try_iter()
        .map(|event| {
            let decoded = AllocationEvent::decode(&event.encode().unwrap()).unwrap();
            assert_eq!(decoded, event);
            decoded.dyno()
        })
        .collect();
    assert_eq!(dynos, vec![Some(1), Some(2), None, Some(1), Some(1)]);
}

#[test]
fn rejection_event_carries_reason() {
    let (engine, _) = two_dyno_engine();
    let events = engine.subscribe();

    engine.submit(four_wheel(1, 99_000)).unwrap_err();

    let event = events.try_recv().unwrap();
    assert_eq!(event.status(), RequestStatus::Rejected);
    assert_eq!(event.reject_reason(), Some(RejectReason::NoCompatibleDyno));
    assert_eq!(event.dyno(), None);
}

#[test]
fn queries_by_status_and_vehicle() {
    let (engine, _) = two_dyno_engine();
    let a = engine.submit(four_wheel(1, 1800)).unwrap();
    let b = engine.submit(four_wheel(2, 1900)).unwrap();
    let c = engine.submit(four_wheel(1, 1800)).unwrap();
    engine.complete(a.id).unwrap();

    let allocated: Vec<_> = engine
        .requests_by_status(RequestStatus::Allocated)
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(allocated, vec![b.id, c.id]);
    assert_eq!(engine.count_by_status(RequestStatus::Completed), 1);
    assert_eq!(engine.count_by_status(RequestStatus::Pending), 0);

    let history: Vec<_> = engine
        .requests_for_vehicle(1)
        .iter()
        .map(|r| (r.id, r.status))
        .collect();
    assert_eq!(
        history,
        vec![(a.id, RequestStatus::Completed), (c.id, RequestStatus::Allocated)]
    );
}

#[test]
fn stats_and_receipt_reflect_session() {
    let (engine, clock) = two_dyno_engine();
    let v1 = engine.submit(four_wheel(1, 1800)).unwrap();
    engine.submit(four_wheel(2, 1900)).unwrap();
    engine.submit(four_wheel(3, 1500)).unwrap();
    engine.submit(four_wheel(4, 9000)).unwrap_err();

    clock.advance(600);
    engine.complete(v1.id).unwrap();

    let stats = engine.stats();
    assert_eq!(stats.submitted, 4);
    assert_eq!(stats.allocated, 3);
    assert_eq!(stats.queued, 1);
    assert_eq!(stats.rejected_no_compatible, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.total_wait_ms, 600);
    assert_eq!(stats.mean_wait_ms(), Some(200));
    assert_eq!(stats.queue_depth, 0);
    assert_eq!(stats.dynos_reserved, 2);

    let receipt = engine.receipt();
    assert_eq!(receipt.sequence, 6);
    assert_eq!(receipt.dynos_total, 2);
    assert_eq!(receipt.dynos_reserved, 2);
    assert_eq!(receipt.queue_depth, 0);
    assert_eq!(receipt.timestamp, 1_600);
    assert_eq!(receipt.state_root, engine.ledger().compute_state_root());
}

#[test]
fn shipped_config_files_load() {
    let catalog = Catalog::load("config/catalog.json").unwrap();
    let table = CompatibilityTable::load("config/compatibility.json").unwrap();
    assert_eq!(table, CompatibilityTable::default());

    let engine = AllocationEngine::new(catalog, &EngineConfig::default().with_compatibility(table));
    assert_eq!(engine.submit_catalog_vehicle(4).unwrap().dyno, Some(3));
    // all-wheel pickup takes the tighter four-wheel bay over the AWD hub
    assert_eq!(engine.submit_catalog_vehicle(5).unwrap().dyno, Some(2));
    assert!(engine.submit_catalog_vehicle(6).is_err());
}
