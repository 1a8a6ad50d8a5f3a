//! Concurrency tests for the ledger and reservation tracker.
//!
//! Reserve/unreserve traffic is replayed from several OS threads at once;
//! after every interleaving the per-node counters must match the
//! reservation sets exactly and never wrap below zero.

use std::sync::Barrier;
use std::thread;

use pronto_ledger::*;
use proptest::prelude::*;

const WORKLOADS: usize = 8;

#[derive(Debug, Clone)]
enum Op {
    Reserve { workload: usize, over: bool },
    Unreserve { workload: usize },
    UnreserveOver { workload: usize },
    Release { workload: usize },
    Telemetry { capacity: f64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..WORKLOADS, any::<bool>()).prop_map(|(workload, over)| Op::Reserve { workload, over }),
        (0..WORKLOADS).prop_map(|workload| Op::Unreserve { workload }),
        (0..WORKLOADS).prop_map(|workload| Op::UnreserveOver { workload }),
        (0..WORKLOADS).prop_map(|workload| Op::Release { workload }),
        (0.0..10.0f64).prop_map(|capacity| Op::Telemetry { capacity }),
    ]
}

fn workload_name(i: usize) -> String {
    format!("pod{i}")
}

fn apply(engine: &Engine, op: &Op) {
    match op {
        Op::Reserve { workload, over } => {
            engine.reservations().reserve(&workload_name(*workload), "nodeA", *over);
        }
        Op::Unreserve { workload } => {
            engine.reservations().unreserve(&workload_name(*workload), "nodeA");
        }
        Op::UnreserveOver { workload } => {
            engine
                .reservations()
                .unreserve_overprovisioned(&workload_name(*workload), "nodeA");
        }
        Op::Release { workload } => {
            engine.reservations().release(&workload_name(*workload), "nodeA");
        }
        Op::Telemetry { capacity } => {
            engine
                .ledger()
                .upsert("nodeA", HostUpdate::default().with_capacity(*capacity));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counters_match_reservation_sets(
        threads in prop::collection::vec(prop::collection::vec(op_strategy(), 0..40), 2..5)
    ) {
        let engine = Engine::new();
        engine.ledger().register("nodeA");

        let barrier = Barrier::new(threads.len() + 1);
        thread::scope(|scope| {
            for ops in &threads {
                let engine = engine.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    for op in ops {
                        apply(&engine, op);
                    }
                });
            }

            // Observer: counters stay within the number of workloads the
            // whole time (a wrapped underflow would show up as a huge value).
            let engine = engine.clone();
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    let record = engine.ledger().get("nodeA").unwrap();
                    assert!(record.reserved_count + record.over_reserved_count <= WORKLOADS as u64);
                }
            });
        });

        let mut standard = 0;
        let mut over = 0;
        for i in 0..WORKLOADS {
            match engine.reservations().is_reserved(&workload_name(i)) {
                Some(ReservationKind::Standard) => standard += 1,
                Some(ReservationKind::Overprovisioned) => over += 1,
                None => {}
            }
        }

        let record = engine.ledger().get("nodeA").unwrap();
        prop_assert_eq!(record.reserved_count, standard);
        prop_assert_eq!(record.over_reserved_count, over);
    }

    #[test]
    fn reserve_unreserve_round_trip(initial in 0usize..5, over in any::<bool>()) {
        let engine = Engine::new();
        engine.ledger().register("nodeA");
        for i in 0..initial {
            engine.reservations().reserve(&format!("existing{i}"), "nodeA", over);
        }
        let before = engine.ledger().get("nodeA").unwrap();

        engine.reservations().reserve("w", "nodeA", false);
        engine.reservations().unreserve("w", "nodeA");

        prop_assert_eq!(engine.ledger().get("nodeA").unwrap(), before);
    }
}

#[test]
fn concurrent_reserves_for_distinct_workloads_both_count() {
    for _ in 0..100 {
        let engine = Engine::new();
        engine
            .ledger()
            .upsert("nodeA", HostUpdate::measurement(1.0, 5.0, 0.0));

        let barrier = Barrier::new(2);
        thread::scope(|scope| {
            for workload in ["pod1", "pod2"] {
                let engine = engine.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    assert!(engine.reservations().reserve(workload, "nodeA", false).is_reserved());
                });
            }
        });

        assert_eq!(engine.ledger().get("nodeA").unwrap().reserved_count, 2);
    }
}

#[test]
fn reserve_against_unknown_node_never_creates_it() {
    let engine = Engine::new();
    engine.ledger().register("nodeA");
    let before = engine.ledger().snapshot();

    thread::scope(|scope| {
        for i in 0..4 {
            let engine = engine.clone();
            scope.spawn(move || {
                engine.reservations().reserve(&format!("pod{i}"), "ghost", i % 2 == 0);
            });
        }
    });

    assert!(engine.ledger().get("ghost").is_none());
    assert_eq!(engine.ledger().snapshot(), before);
    assert_eq!(engine.reservations().reservation_count(), 0);
}
