use std::sync::Barrier;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relief_core::{
    AllocationEngine, CenterRegistry, LocationGraph, Outcome, Request, RequestQueue,
    ResourceBundle, Verdict,
};

// === TEST FIXTURES ===

const SITES: [&str; 5] = ["Depot", "Ford", "Mill", "Ridge", "Camp"];

/// Line network Depot - Ford - Mill - Ridge with Camp off the grid.
fn network() -> LocationGraph {
    let mut graph = LocationGraph::new();
    for site in SITES {
        graph.add_location(site);
    }
    graph.add_edge("Depot", "Ford", 3).unwrap();
    graph.add_edge("Ford", "Mill", 4).unwrap();
    graph.add_edge("Mill", "Ridge", 2).unwrap();
    graph
}

fn engine_with(centers: &[(&str, &str, ResourceBundle)]) -> AllocationEngine {
    let mut registry = CenterRegistry::new();
    for (name, location, stock) in centers {
        registry.register(*name, *location, *stock).unwrap();
    }
    AllocationEngine::new(network(), registry)
}

fn random_request(rng: &mut StdRng) -> Request {
    Request::new(
        SITES[rng.random_range(0..SITES.len())],
        rng.random_range(1..=10),
        rng.random_range(0..=40),
        rng.random_range(0..=40),
        rng.random_range(0..=25),
    )
    .unwrap()
}

fn add(a: ResourceBundle, b: &ResourceBundle) -> ResourceBundle {
    ResourceBundle::new(a.food + b.food, a.water + b.water, a.medicine + b.medicine)
}

// === STOCK ===

#[test]
fn invariant_stock_is_conserved_and_never_overdrawn() {
    let engine = engine_with(&[
        ("North", "Depot", ResourceBundle::new(300, 250, 120)),
        ("South", "Ridge", ResourceBundle::new(200, 300, 90)),
        ("Remote", "Camp", ResourceBundle::new(150, 100, 60)),
    ]);
    let initial = engine.centers().total_stock();
    let initial_per_center: Vec<_> = engine.centers().list().map(|(_, c)| c.stock()).collect();

    let mut rng = StdRng::seed_from_u64(2024);
    let mut delivered = ResourceBundle::ZERO;

    for _ in 0..400 {
        let allocation = engine.allocate(random_request(&mut rng));
        if allocation.is_committed() {
            delivered = add(delivered, allocation.request.needs());
        }

        // Stock only ever goes down, and never below what was delivered.
        for ((_, center), start) in engine.centers().list().zip(&initial_per_center) {
            assert!(start.covers(&center.stock()), "{} grew stock", center.name());
        }
        assert_eq!(add(engine.centers().total_stock(), &delivered), initial);
    }
}

#[test]
fn invariant_rejected_request_changes_nothing() {
    let engine = engine_with(&[
        ("North", "Depot", ResourceBundle::new(10, 10, 10)),
        ("South", "Ridge", ResourceBundle::new(10, 10, 10)),
    ]);
    let before = engine.centers().snapshot();

    let allocation = engine.allocate(Request::new("Mill", 10, 5, 5, 11).unwrap());

    assert_eq!(allocation.outcome, Outcome::Rejected);
    assert!(allocation.attempts.iter().all(|a| a.verdict == Verdict::Infeasible));
    assert_eq!(engine.centers().snapshot(), before);
}

// === ONE OUTCOME PER REQUEST ===

#[test]
fn invariant_every_popped_request_gets_one_outcome() {
    let engine = engine_with(&[
        ("North", "Depot", ResourceBundle::new(120, 120, 60)),
        ("South", "Ridge", ResourceBundle::new(90, 90, 40)),
    ]);
    let mut queue = RequestQueue::new();
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..60 {
        queue.push(random_request(&mut rng));
    }

    let allocations = engine.drain(&mut queue);

    assert_eq!(allocations.len(), 60);
    assert!(queue.is_empty());
    for allocation in &allocations {
        let winners = allocation
            .attempts
            .iter()
            .filter(|a| a.verdict == Verdict::Committed)
            .count();
        match allocation.outcome {
            Outcome::Committed { .. } => assert_eq!(winners, 1),
            Outcome::Rejected => {
                assert_eq!(winners, 0);
                assert_eq!(allocation.attempts.len(), 2);
            }
        }
    }
}

#[cfg(feature = "instrument")]
#[test]
fn invariant_one_outcome_event_per_request() {
    let engine = engine_with(&[("North", "Depot", ResourceBundle::new(100, 100, 100))]);
    let mut queue = RequestQueue::new();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..25 {
        queue.push(random_request(&mut rng));
    }

    let mut allocations = Vec::new();
    let recorder = relief_core::instrument::record(|| {
        allocations = engine.drain(&mut queue);
    });

    let committed = allocations.iter().filter(|a| a.is_committed()).count();
    let outcomes = recorder.table("outcome").unwrap();
    assert_eq!(outcomes.row_count, 25);
    assert_eq!(outcomes.count_where("outcome", "committed"), committed);
    assert_eq!(outcomes.count_where("outcome", "rejected"), 25 - committed);
    assert_eq!(outcomes.count_where("origin", "manual"), 25);

    let locations = outcomes.str_column("location").unwrap();
    for (row, allocation) in locations.iter().zip(&allocations) {
        assert_eq!(row, allocation.request.location());
    }
}

// === CONCURRENCY ===

#[test]
fn invariant_concurrent_commits_cannot_overdraw_a_center() {
    // Enough for exactly one request.
    let engine = engine_with(&[("Solo", "Mill", ResourceBundle::new(10, 10, 10))]);
    let contenders = 8;
    let barrier = Barrier::new(contenders);

    let allocations: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..contenders)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    engine.allocate(Request::new("Mill", 5, 10, 10, 10).unwrap())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let committed = allocations.iter().filter(|a| a.is_committed()).count();
    assert_eq!(committed, 1);
    assert_eq!(
        engine.centers().total_stock(),
        ResourceBundle::ZERO,
        "winner drained the center exactly"
    );
    for loser in allocations.iter().filter(|a| !a.is_committed()) {
        assert_eq!(loser.attempts.len(), 1);
        assert!(matches!(
            loser.attempts[0].verdict,
            Verdict::Infeasible | Verdict::Raced
        ));
    }
}

#[test]
fn invariant_losers_of_a_race_fall_through_to_next_center() {
    // Near and Far each cover one request; three contenders.
    let engine = engine_with(&[
        ("Near", "Mill", ResourceBundle::new(10, 0, 0)),
        ("Far", "Depot", ResourceBundle::new(10, 0, 0)),
    ]);
    let barrier = Barrier::new(3);

    let allocations: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..3)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    engine.allocate(Request::new("Ridge", 7, 10, 0, 0).unwrap())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut winners: Vec<_> = allocations.iter().filter_map(|a| a.center_name()).collect();
    winners.sort();
    assert_eq!(winners, vec!["Far", "Near"]);
    assert_eq!(engine.centers().total_stock(), ResourceBundle::ZERO);
}

#[test]
fn invariant_stock_holds_under_many_concurrent_allocators() {
    let engine = engine_with(&[
        ("North", "Depot", ResourceBundle::new(400, 400, 200)),
        ("Center", "Mill", ResourceBundle::new(300, 300, 150)),
        ("South", "Ridge", ResourceBundle::new(200, 200, 100)),
    ]);
    let initial = engine.centers().total_stock();

    let delivered: Vec<ResourceBundle> = thread::scope(|s| {
        let handles: Vec<_> = (0..6u64)
            .map(|seed| {
                let engine = &engine;
                s.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let mut total = ResourceBundle::ZERO;
                    for _ in 0..80 {
                        let allocation = engine.allocate(random_request(&mut rng));
                        if allocation.is_committed() {
                            total = add(total, allocation.request.needs());
                        }
                    }
                    total
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let delivered = delivered.iter().fold(ResourceBundle::ZERO, add);
    assert_eq!(add(engine.centers().total_stock(), &delivered), initial);
}
