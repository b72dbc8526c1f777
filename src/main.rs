//! Dyno Allocator - Binary Entry Point
//!
//! Loads configuration from the environment, builds the engine over the
//! configured catalog (or a small built-in pool) and runs a short
//! allocation session, printing every lifecycle event and the final
//! ledger receipt.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dyno_allocator::types::{Dyno, DynoType, TractionType, Vehicle};
use dyno_allocator::{AllocationEngine, Catalog, EngineConfig};

fn demo_catalog() -> Result<Catalog> {
    let dynos = vec![
        Dyno::new(1, "D1", 2000, DynoType::four_wheel()),
        Dyno::new(2, "D2", 5000, DynoType::four_wheel()),
        Dyno::new(3, "Bike bay", 600, DynoType::two_wheel()),
        Dyno::new(4, "Heavy AWD", 8000, DynoType::all_wheel()),
    ];
    let vehicles = vec![
        Vehicle::new(1, "V1", 1800, TractionType::four_wheel()),
        Vehicle::new(2, "V2", 1900, TractionType::four_wheel()),
        Vehicle::new(3, "V3", 1900, TractionType::four_wheel()),
        Vehicle::new(4, "Tractor", 9000, TractionType::all_wheel()),
    ];
    Catalog::new(dynos, vehicles).context("building demo catalog")
}

fn main() -> Result<()> {
    let config = EngineConfig::from_env().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => demo_catalog()?,
    };

    println!("===========================================");
    println!("  Dyno Allocator");
    println!("===========================================");
    println!();

    let engine = AllocationEngine::new(catalog, &config);
    let events = engine.subscribe();

    let mut vehicle_ids: Vec<_> = engine
        .catalog()
        .vehicles()
        .map(|v| v.id)
        .collect();
    vehicle_ids.sort_unstable();

    let mut first_allocated = None;
    for vehicle_id in vehicle_ids {
        match engine.submit_catalog_vehicle(vehicle_id) {
            Ok(request) => {
                println!(
                    "  vehicle {:>4} -> request {:>3} {:<9} dyno {:?}",
                    vehicle_id, request.id, request.status, request.dyno
                );
                if request.dyno.is_some() && first_allocated.is_none() {
                    first_allocated = Some(request.id);
                }
            }
            Err(err) => println!("  vehicle {:>4} -> {}", vehicle_id, err),
        }
    }

    if let Some(request_id) = first_allocated {
        println!();
        println!("Completing request {}...", request_id);
        engine.complete(request_id)?;
    }

    println!();
    println!("Events:");
    for event in events.try_iter() {
        println!(
            "  #{:<3} request {:>3}: {} -> {} dyno {:?}",
            event.sequence,
            event.request_id,
            event.previous(),
            event.status(),
            event.dyno()
        );
    }

    let receipt = engine.receipt();
    let stats = engine.stats();
    println!();
    println!("Receipt:");
    println!("  Dynos reserved: {}/{}", receipt.dynos_reserved, receipt.dynos_total);
    println!("  Queue depth:    {}", receipt.queue_depth);
    println!("  State root:     {}", receipt.state_root_hex());
    println!("  Digest:         {}", hex::encode(receipt.digest()?));
    println!();
    println!(
        "Stats: submitted={} allocated={} rejected={} completed={}",
        stats.submitted,
        stats.allocated,
        stats.rejected(),
        stats.completed
    );

    let conflicts = engine.detect_conflicts();
    info!(conflicts = conflicts.len(), "Session finished");
    anyhow::ensure!(conflicts.is_empty(), "ledger conflicts: {:?}", conflicts);

    Ok(())
}
