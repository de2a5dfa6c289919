// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The Scheduler Core's request/response protocol (spec §4.3).
//!
//! spec.md §9 explicitly calls out the source's trick of overloading
//! `task_id` with negative sentinels (`TIMER`, `ACTIVE`, `OVERDUE`) to
//! multiplex request kinds onto one field, and says the rewrite must
//! not repeat it. `SchedulerRequest` is the proper tagged variant that
//! replaces it.

use dds_abi::{TaskId, TaskKind, Tick, TimerId};
use dds_kernel::MailboxSender;

use crate::record::TaskRecord;

/// Fields the client supplies when admitting a new task.
///
/// The client (`dds-client`) has already spawned the kernel task at
/// `Priority::Low` and created (but not yet necessarily armed) its
/// deadline timer before this reaches the core — spec §4.4's
/// rationale for keeping the core's critical section bounded to list
/// work alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSpec {
    /// Kernel handle of the already-spawned user task.
    pub task_id: TaskId,
    /// Kernel handle of the already-armed deadline timer.
    pub timer_id: TimerId,
    /// Periodic or aperiodic.
    pub kind: TaskKind,
    /// Ticks of simulated work the task body will consume.
    pub execution_budget: Tick,
    /// Ticks from admission within which the task must complete.
    pub relative_deadline: Tick,
}

/// Reply payload sent back to a client awaiting a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The request succeeded; no further data to return.
    Ok,
    /// A `Delete` targeted a `task_id` with no matching record.
    NotFound,
    /// The requested snapshot of the Active list, in EDF order.
    Active(Vec<TaskRecord>),
    /// The requested snapshot of the Overdue list, oldest first.
    Overdue(Vec<TaskRecord>),
}

/// A message delivered to the Scheduler Core's inbound mailbox.
///
/// One variant per spec §4.3 request kind; `DeadlineFired` carries no
/// `reply_to` because it originates from a timer callback, which has
/// no mailbox of its own to receive a reply on.
pub enum SchedulerRequest {
    /// Admit a new task.
    Create { spec: CreateSpec, reply_to: MailboxSender<Reply> },
    /// Remove an admitted task by its kernel task handle.
    Delete { task_id: TaskId, reply_to: MailboxSender<Reply> },
    /// A deadline timer fired before its task self-deleted.
    DeadlineFired { timer_id: TimerId },
    /// Request a snapshot of the Active list.
    QueryActive { reply_to: MailboxSender<Reply> },
    /// Request a snapshot of the Overdue list.
    QueryOverdue { reply_to: MailboxSender<Reply> },
}
