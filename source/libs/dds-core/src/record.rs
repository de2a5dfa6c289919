// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! `TaskRecord`, the unit the Scheduler Core admits, orders, and retires
//! (spec.md §3).

use dds_abi::{TaskId, TaskKind, TimerId, Tick};

/// A single admitted task.
///
/// `period` is deliberately absent: spec.md §9 (Open Question 2) notes
/// the source never reads `period` inside the scheduler core — it's a
/// property of the client-side generator that re-submits a periodic
/// task every `period` ticks, not of the admitted task itself. That
/// generator lives in `dds-tasks`, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Kernel task handle backing this record.
    pub task_id: TaskId,
    /// Deadline timer bound 1:1 to this record.
    pub timer_id: TimerId,
    /// Periodic or aperiodic (informational; the core treats both alike).
    pub kind: TaskKind,
    /// Ticks of simulated work the task body consumes before self-delete.
    pub execution_budget: Tick,
    /// Ticks from `creation_tick` within which the task must complete.
    pub relative_deadline: Tick,
    /// Absolute tick assigned by the core when it accepted the Create.
    pub creation_tick: Tick,
    /// `creation_tick + relative_deadline`; the EDF ordering key.
    pub absolute_deadline: Tick,
}

impl TaskRecord {
    /// Builds a record, deriving `absolute_deadline` from the other
    /// fields. Only the Scheduler Core calls this — it is the sole
    /// authority on `creation_tick`.
    pub fn new(
        task_id: TaskId,
        timer_id: TimerId,
        kind: TaskKind,
        execution_budget: Tick,
        relative_deadline: Tick,
        creation_tick: Tick,
    ) -> Self {
        Self {
            task_id,
            timer_id,
            kind,
            execution_budget,
            relative_deadline,
            creation_tick,
            absolute_deadline: creation_tick.saturating_add(relative_deadline),
        }
    }

    /// The EDF ordering tuple: `absolute_deadline`, then `creation_tick`
    /// (earlier wins), then `task_id` (stable tie-break) per spec §3.
    pub(crate) fn order_key(&self) -> (Tick, Tick, TaskId) {
        (self.absolute_deadline, self.creation_tick, self.task_id)
    }
}
