// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scheduler Core (C3): the single-consumer event loop that owns both
//! ordered lists and performs head priority promotion/demotion.
//!
//! Grounded on `userspace/samgr`'s `HostRegistry` — one `Mutex`-free
//! owner doing a bounded unit of list work per request, no locking
//! because there is exactly one consumer (spec §5).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dds_abi::{Priority, TaskId, TimerId, Tick, Wait};
use dds_kernel::{Kernel, MailboxReceiver};

use crate::lists::{ActiveList, OverdueList};
use crate::protocol::{CreateSpec, Reply, SchedulerRequest};
use crate::record::TaskRecord;

/// Read-only handle onto the Scheduler Core's Overdue eviction
/// counter, for a monitor that wants to report drops without going
/// through the request protocol (spec.md §9, Open Question 3 picks a
/// bounded ring; this is how a caller observes how much it's dropped).
#[derive(Clone, Debug, Default)]
pub struct OverdueStats(Arc<AtomicU64>);

impl OverdueStats {
    /// Records evicted from the Overdue ring since the core started.
    pub fn dropped(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Owns the Active and Overdue lists and the sole kernel-priority
/// authority over admitted tasks. Runs on its own highest-priority
/// task/thread; every other component only ever talks to it through
/// `SchedulerRequest` messages.
pub struct SchedulerCore<K: Kernel> {
    kernel: K,
    inbox: MailboxReceiver<SchedulerRequest>,
    active: ActiveList,
    overdue: OverdueList,
    overdue_drops: Arc<AtomicU64>,
}

impl<K: Kernel> SchedulerCore<K> {
    /// Builds a core over `kernel`, consuming requests from `inbox`.
    /// `overdue_capacity` bounds the Overdue ring (spec §9, Open
    /// Question 3; see `dds_abi::config::OVERDUE_CAPACITY` for the
    /// default a deployment should pass here).
    pub fn new(kernel: K, inbox: MailboxReceiver<SchedulerRequest>, overdue_capacity: usize) -> Self {
        Self {
            kernel,
            inbox,
            active: ActiveList::new(),
            overdue: OverdueList::new(overdue_capacity),
            overdue_drops: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A cloneable handle onto this core's Overdue drop counter. Safe
    /// to hand to a monitor running on another thread — it only ever
    /// reads the shared atomic, never touches the lists themselves.
    pub fn overdue_stats(&self) -> OverdueStats {
        OverdueStats(self.overdue_drops.clone())
    }

    /// Runs the event loop until the inbox's last sender is dropped.
    /// Intended to be the entire body of the Scheduler Core's own
    /// kernel task.
    pub fn run(mut self) {
        loop {
            match self.inbox.recv(Wait::Blocking) {
                Ok(request) => self.handle(request),
                Err(_) => {
                    log::info!("dds-core: inbox closed, scheduler core exiting");
                    return;
                }
            }
        }
    }

    /// Services exactly one request. Exposed for tests and for an
    /// embedder that wants to drive the loop itself (e.g. lock-step
    /// with a simulated clock) instead of calling `run`.
    pub fn step(&mut self, request: SchedulerRequest) {
        self.handle(request);
    }

    /// Snapshot accessors for introspection without going through the
    /// request protocol — used by the monitor's in-process variant and
    /// by tests that want to assert invariants without a reply trip.
    pub fn active_snapshot(&self) -> Vec<TaskRecord> {
        self.active.snapshot()
    }

    /// See [`SchedulerCore::active_snapshot`].
    pub fn overdue_snapshot(&self) -> Vec<TaskRecord> {
        self.overdue.snapshot()
    }

    fn handle(&mut self, request: SchedulerRequest) {
        match request {
            SchedulerRequest::Create { spec, reply_to } => {
                self.handle_create(spec);
                reply_to.send_best_effort(Reply::Ok);
            }
            SchedulerRequest::Delete { task_id, reply_to } => {
                let reply = if self.handle_delete(task_id) { Reply::Ok } else { Reply::NotFound };
                reply_to.send_best_effort(reply);
            }
            SchedulerRequest::DeadlineFired { timer_id } => self.handle_deadline_fired(timer_id),
            SchedulerRequest::QueryActive { reply_to } => {
                reply_to.send_best_effort(Reply::Active(self.active.snapshot()));
            }
            SchedulerRequest::QueryOverdue { reply_to } => {
                reply_to.send_best_effort(Reply::Overdue(self.overdue.snapshot()));
            }
        }
    }

    /// spec §4.3 Create: stamp `creation_tick`, insert in sorted
    /// position, and promote the new head (if it changed) to
    /// `Priority::Medium` while demoting the previous head to `Low`.
    /// A Create whose absolute deadline already lies in the past is
    /// still admitted — the core doesn't second-guess the client.
    fn handle_create(&mut self, spec: CreateSpec) {
        let now: Tick = self.kernel.now();
        let record = TaskRecord::new(
            spec.task_id,
            spec.timer_id,
            spec.kind,
            spec.execution_budget,
            spec.relative_deadline,
            now,
        );
        let previous_head = self.active.head().map(|r| r.task_id);
        self.active.insert(record);
        self.promote_head_if_changed(previous_head);
    }

    /// spec §4.3 Delete: removes by `task_id`; a miss is `NotFound`,
    /// not an error the caller must treat as fatal (spec §7). If the
    /// removed record was the head, promotes the new head.
    fn handle_delete(&mut self, task_id: TaskId) -> bool {
        let was_head = self.active.head().map(|r| r.task_id) == Some(task_id);
        match self.active.remove_by_task(task_id) {
            Some(_) => {
                if was_head {
                    if let Some(new_head) = self.active.head() {
                        self.kernel.set_priority(new_head.task_id, Priority::Medium);
                    }
                }
                true
            }
            None => false,
        }
    }

    /// spec §4.3 DeadlineFired: looked up by `timer_id` since the timer
    /// callback never learns the owning `task_id`. A miss (the task
    /// already self-deleted in the same instant — spec §4.3's
    /// Delete/DeadlineFired race) is silently a no-op, not an error.
    fn handle_deadline_fired(&mut self, timer_id: TimerId) {
        let was_head = self.active.head().map(|r| r.timer_id) == Some(timer_id);
        let Some(record) = self.active.remove_by_timer(timer_id) else {
            return;
        };
        self.kernel.kill(record.task_id);
        if was_head {
            if let Some(new_head) = self.active.head() {
                self.kernel.set_priority(new_head.task_id, Priority::Medium);
            }
        }
        let task_id = record.task_id;
        if self.overdue.push(record) {
            self.overdue_drops.fetch_add(1, Ordering::Relaxed);
        }
        log::warn!("dds-core: deadline miss for {task_id}, moved to overdue");
    }

    fn promote_head_if_changed(&mut self, previous_head: Option<TaskId>) {
        let new_head = self.active.head().map(|r| r.task_id);
        if new_head == previous_head {
            // The newly inserted record didn't become the head; it
            // keeps the `Low` priority it was spawned at (spec §4.3).
            return;
        }
        if let Some(prev) = previous_head {
            self.kernel.set_priority(prev, Priority::Low);
        }
        if let Some(head) = new_head {
            self.kernel.set_priority(head, Priority::Medium);
        }
    }
}
