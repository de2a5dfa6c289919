// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Client API (C4) — the synchronous request/response facade
//! user tasks use to talk to the Scheduler Core.
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//!
//! PUBLIC API:
//!   - Client::create / delete / active_snapshot / overdue_snapshot
//!   - TaskSpec, Admission, ClientError
//!
//! DEPENDENCIES:
//!   - dds-abi, dds-kernel, dds-core
//!   - thiserror, log, parking_lot
//!
//! Grounded on `userspace/nexus-ipc`'s `Client` trait shape and
//! `userspace/nexus-ipc/src/reqrep.rs`'s request/reply correlation
//! helpers, adapted to typed mailboxes instead of byte frames: every
//! call here allocates a one-shot reply mailbox, posts a request to
//! the Scheduler Core's inbox, and awaits the reply with a bounded
//! timeout (spec §4.4).

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use std::sync::Arc;

use parking_lot::Mutex;

use dds_abi::{config, Priority, TaskId, TaskKind, TimerId, Tick, Wait};
use dds_core::{CreateSpec, Reply, SchedulerRequest, TaskRecord};
use dds_kernel::{Kernel, MailboxSender, TaskHandle};

/// Errors surfaced to a client calling into the Scheduler Core.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ClientError {
    /// The kernel could not spawn the user task or its deadline timer
    /// (resource exhaustion).
    #[error("could not admit task: {0}")]
    CreateFailed(String),
    /// A `delete` targeted an unknown `task_id`.
    #[error("task not found")]
    NotFound,
    /// The Scheduler Core did not reply within
    /// [`config::CLIENT_REPLY_TIMEOUT`] ticks.
    #[error("scheduler core did not respond in time")]
    CoreUnresponsive,
}

/// What a newly admitted task needs: a body to run, plus the shape of
/// its deadline.
pub struct TaskSpec {
    /// Name used for the kernel task (logging/debugging only).
    pub name: String,
    /// Periodic or aperiodic (informational; forwarded to the core).
    pub kind: TaskKind,
    /// Ticks of simulated work the body consumes before self-delete.
    pub execution_budget: Tick,
    /// Ticks from admission within which the task must complete.
    pub relative_deadline: Tick,
    /// The task body, invoked with a cooperative-cancellation handle.
    pub body: Box<dyn FnOnce(TaskHandle) + Send + 'static>,
}

/// The kernel handles a successful `create` produced, handed back to
/// the caller so it can arrange self-delete (`dds-tasks` uses both:
/// the timer must be torn down before the task deletes itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// The kernel task handle admitted into the Active list.
    pub task_id: TaskId,
    /// The deadline timer armed for this admission.
    pub timer_id: TimerId,
}

/// Synchronous request/reply facade over a `dds-core` Scheduler Core
/// mailbox. Cheap to clone — cloning shares the same kernel and the
/// same core mailbox sender.
#[derive(Clone)]
pub struct Client<K: Kernel> {
    kernel: K,
    core_mailbox: MailboxSender<SchedulerRequest>,
}

impl<K: Kernel + Clone + 'static> Client<K> {
    /// Builds a client that posts requests to `core_mailbox`.
    pub fn new(kernel: K, core_mailbox: MailboxSender<SchedulerRequest>) -> Self {
        Self { kernel, core_mailbox }
    }

    /// The kernel this client (and the tasks it admits) run on.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Admits `spec`: spawns the task body at `Priority::Low`, arms a
    /// one-shot deadline timer for `relative_deadline`, then posts
    /// `Create` to the Scheduler Core and awaits `Ok`.
    ///
    /// Spawning the task and creating the timer happen here, in the
    /// client, rather than inside the Scheduler Core — spec §4.4's
    /// rationale is that it keeps the core's own critical section
    /// bounded to O(n) list work, never unbounded kernel-object
    /// creation under the core's own (highest) priority.
    pub fn create(&self, spec: TaskSpec) -> Result<Admission, ClientError> {
        let task_id = self
            .kernel
            .spawn(&spec.name, Priority::Low, spec.body)
            .map_err(|err| ClientError::CreateFailed(err.to_string()))?;

        let timer_id = self.arm_deadline_timer(task_id, spec.relative_deadline);

        let (reply_to, reply_from) = self.kernel.mailbox::<Reply>(1);
        let create_spec = CreateSpec {
            task_id,
            timer_id,
            kind: spec.kind,
            execution_budget: spec.execution_budget,
            relative_deadline: spec.relative_deadline,
        };
        self.core_mailbox
            .send(SchedulerRequest::Create { spec: create_spec, reply_to }, Wait::Blocking)
            .map_err(|_| ClientError::CoreUnresponsive)?;

        match reply_from.recv(Wait::Timeout(config::CLIENT_REPLY_TIMEOUT)) {
            Ok(Reply::Ok) => Ok(Admission { task_id, timer_id }),
            Ok(_) => Err(ClientError::CoreUnresponsive),
            Err(_) => Err(ClientError::CoreUnresponsive),
        }
    }

    /// Removes `task_id` from the Active list. `NotFound` is a normal,
    /// expected outcome (spec §4.3's Delete/DeadlineFired race), not a
    /// sign of a bug in the caller.
    pub fn delete(&self, task_id: TaskId) -> Result<(), ClientError> {
        let (reply_to, reply_from) = self.kernel.mailbox::<Reply>(1);
        self.core_mailbox
            .send(SchedulerRequest::Delete { task_id, reply_to }, Wait::Blocking)
            .map_err(|_| ClientError::CoreUnresponsive)?;

        match reply_from.recv(Wait::Timeout(config::CLIENT_REPLY_TIMEOUT)) {
            Ok(Reply::Ok) => Ok(()),
            Ok(Reply::NotFound) => Err(ClientError::NotFound),
            Ok(_) => Err(ClientError::CoreUnresponsive),
            Err(_) => Err(ClientError::CoreUnresponsive),
        }
    }

    /// A copied, immutable snapshot of the Active list in EDF order.
    pub fn active_snapshot(&self) -> Result<Vec<TaskRecord>, ClientError> {
        let (reply_to, reply_from) = self.kernel.mailbox::<Reply>(1);
        self.core_mailbox
            .send(SchedulerRequest::QueryActive { reply_to }, Wait::Blocking)
            .map_err(|_| ClientError::CoreUnresponsive)?;
        match reply_from.recv(Wait::Timeout(config::CLIENT_REPLY_TIMEOUT)) {
            Ok(Reply::Active(records)) => Ok(records),
            _ => Err(ClientError::CoreUnresponsive),
        }
    }

    /// A copied, immutable snapshot of the Overdue list, oldest first.
    pub fn overdue_snapshot(&self) -> Result<Vec<TaskRecord>, ClientError> {
        let (reply_to, reply_from) = self.kernel.mailbox::<Reply>(1);
        self.core_mailbox
            .send(SchedulerRequest::QueryOverdue { reply_to }, Wait::Blocking)
            .map_err(|_| ClientError::CoreUnresponsive)?;
        match reply_from.recv(Wait::Timeout(config::CLIENT_REPLY_TIMEOUT)) {
            Ok(Reply::Overdue(records)) => Ok(records),
            _ => Err(ClientError::CoreUnresponsive),
        }
    }

    /// Creates and arms a one-shot deadline timer whose callback posts
    /// `DeadlineFired` into the core's inbox, firing `relative_deadline`
    /// ticks from now.
    ///
    /// `timer_create` hands back a `TimerId` synchronously but the
    /// callback closure is built *before* that id exists, so the id is
    /// threaded through a small shared slot filled immediately after
    /// creation and before the timer is armed — there is no window in
    /// which the timer can fire before the slot is populated. The timer
    /// is inert (per `Kernel::timer_create`'s contract) until
    /// `timer_start` arms it; that call is what actually starts the
    /// deadline clock.
    fn arm_deadline_timer(&self, task_id: TaskId, relative_deadline: Tick) -> TimerId {
        let slot: Arc<Mutex<Option<TimerId>>> = Arc::new(Mutex::new(None));
        let slot_for_callback = slot.clone();
        let core_mailbox = self.core_mailbox.clone();

        let timer_id = self.kernel.timer_create(Box::new(move || {
            if let Some(timer_id) = *slot_for_callback.lock() {
                core_mailbox.send_best_effort(SchedulerRequest::DeadlineFired { timer_id });
            } else {
                log::error!("dds-client: deadline timer for {task_id} fired before its id was known");
            }
        }));
        *slot.lock() = Some(timer_id);
        self.kernel.timer_start(timer_id, relative_deadline);
        timer_id
    }
}
