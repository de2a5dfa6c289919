// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! spec.md §8 end-to-end scenarios S4–S6, driven against the real
//! `HostKernel`/`SchedulerCore`/`Client` stack instead of in-crate
//! unit tests.

use std::thread;
use std::time::Duration;

use dds_abi::TaskId;
use dds_e2e::spawn_scenario;
use dds_tasks::{admit_aperiodic, ExecutionMode, PeriodicGenerator};

/// S4 — three periodics as in the demo. Over a 10 000-tick horizon at
/// 42.5% utilisation (schedulable under EDF), Overdue stays empty.
#[test]
fn s4_three_generators_stay_schedulable_over_the_horizon() {
    let scenario = spawn_scenario(Duration::from_micros(60));

    let generators = [("g1", 0u64, 2000u64, 500u64, 1000u64), ("g2", 250, 2000, 250, 600), ("g3", 4100, 2000, 100, 200)];
    for (name, offset, period, execution_budget, relative_deadline) in generators {
        let generator = PeriodicGenerator::new(
            scenario.client.clone(),
            name,
            offset,
            period,
            execution_budget,
            relative_deadline,
            ExecutionMode::Sleep,
        );
        thread::spawn(move || generator.run());
    }

    while scenario.kernel.now() < 10_000 {
        thread::sleep(Duration::from_millis(5));
    }
    // Give the last in-flight instances a chance to self-delete before
    // asserting Overdue is still empty.
    thread::sleep(Duration::from_millis(50));

    let overdue = scenario.client.overdue_snapshot().unwrap();
    assert!(
        overdue.is_empty(),
        "expected no deadline misses at 42.5% utilisation, got {overdue:?}"
    );
    assert_eq!(scenario.overdue_stats.dropped(), 0);
}

/// S5 — delete of unknown returns `NotFound`; lists stay unchanged.
#[test]
fn s5_delete_of_unknown_task_is_not_found_and_leaves_lists_unchanged() {
    let scenario = spawn_scenario(Duration::from_micros(50));

    let before_active = scenario.client.active_snapshot().unwrap();
    let before_overdue = scenario.client.overdue_snapshot().unwrap();

    let err = scenario.client.delete(TaskId::from_raw(0xDEAD)).unwrap_err();
    assert_eq!(err.to_string(), "task not found");

    assert_eq!(scenario.client.active_snapshot().unwrap(), before_active);
    assert_eq!(scenario.client.overdue_snapshot().unwrap(), before_overdue);
}

/// S6 — a race between a client `Delete` and a `DeadlineFired` timer
/// callback: regardless of arrival order, exactly one of {record in
/// Overdue, record gone entirely} holds at quiescence, and the run
/// never panics (no duplicate free / double handling).
#[test]
fn s6_delete_deadline_race_resolves_to_exactly_one_outcome() {
    let scenario = spawn_scenario(Duration::from_micros(200));

    for i in 0..20 {
        // execution_budget == relative_deadline puts the client's
        // self-delete and the deadline timer's fire right next to
        // each other in wall-clock terms; across repeated runs this
        // exercises both arrival orders of the race.
        let admission =
            admit_aperiodic(&scenario.client, format!("race-{i}"), 10, 10, ExecutionMode::Sleep).unwrap();

        thread::sleep(Duration::from_millis(20));

        let in_overdue = scenario
            .client
            .overdue_snapshot()
            .unwrap()
            .iter()
            .any(|r| r.task_id == admission.task_id);
        let in_active = scenario
            .client
            .active_snapshot()
            .unwrap()
            .iter()
            .any(|r| r.task_id == admission.task_id);

        assert!(!in_active, "run {i}: record must not still be active after the race settles");
        // `in_overdue` may be true or false depending on which side of
        // the race won — both are valid outcomes per spec §4.3; what
        // must never happen is the record surviving in Active.
        let _ = in_overdue;
    }
}
