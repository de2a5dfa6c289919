// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: User Task Wrappers (C5) — periodic/aperiodic task bodies
//! and the client-side generator loop that re-submits a periodic task
//! every `period` ticks.
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//!
//! PUBLIC API:
//!   - ExecutionMode: Sleep | BusyWait (spec §9 userTaskDelay resolution)
//!   - TaskParams, admit_aperiodic, admit_periodic_once
//!   - PeriodicGenerator: client-side loop that re-admits every `period` ticks
//!
//! DEPENDENCIES:
//!   - dds-abi, dds-kernel, dds-client
//!   - log
//!
//! `period` lives here, not in `dds-core::TaskRecord` — spec.md §9 Open
//! Question 2: the source's scheduler core never reads `period`, only
//! the generator that re-creates a periodic task does. Grounded in
//! structure on `recipes/libs/nexus-settingsd::daemon::SettingsDaemon`'s
//! `thread::sleep`-driven loop body.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use dds_abi::{TaskKind, Tick};
use dds_client::{Admission, Client, ClientError, TaskSpec};
use dds_kernel::{Kernel, TaskHandle};

/// Resolves spec.md §9's `userTaskDelay` ambiguity: the source's
/// wrapper blocks on the kernel sleep primitive, but a commented-out
/// busy-loop variant hints at an intent to measure CPU time instead of
/// wall time. Rather than guess, this is an explicit, caller-chosen
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Yields the thread for the execution budget (default).
    #[default]
    Sleep,
    /// Busy-spins for the execution budget without yielding.
    BusyWait,
}

fn consume_budget(handle: &TaskHandle, budget: Tick, mode: ExecutionMode) -> bool {
    match mode {
        ExecutionMode::Sleep => handle.sleep(budget),
        ExecutionMode::BusyWait => handle.busy_wait(budget),
    }
}

/// What a single admission (periodic instance or one-shot aperiodic
/// task) needs beyond what `dds_client::TaskSpec` already carries.
#[derive(Debug, Clone)]
pub struct TaskParams {
    /// Name used for the kernel task (logging/debugging only).
    pub name: String,
    /// Periodic or aperiodic; forwarded to the core verbatim.
    pub kind: TaskKind,
    /// Ticks of simulated work the body consumes before self-delete.
    pub execution_budget: Tick,
    /// Ticks from admission within which the task must complete.
    pub relative_deadline: Tick,
    /// How the body consumes its execution budget.
    pub mode: ExecutionMode,
}

/// Admits a task whose body consumes its execution budget and then
/// self-deletes (spec §4.5): deletes its own deadline timer, then
/// calls `client.delete(self)`. Used for both periodic instances and
/// one-shot aperiodic tasks — the only difference between them is
/// `TaskParams::kind`, which the core treats identically.
///
/// The task body needs its own `task_id`/`timer_id` to self-delete,
/// but those only exist once `Client::create` returns — which is
/// after the kernel has already started running the body on its own
/// thread. A condvar-guarded slot closes that window: the body blocks
/// until `create` has filled it in, the same pattern `dds-client`
/// uses to thread a `TimerId` into its own deadline-timer callback
/// before the timer is armed.
pub fn admit<K: Kernel + Clone + 'static>(
    client: &Client<K>,
    params: TaskParams,
) -> Result<Admission, ClientError> {
    let slot: Arc<(Mutex<Option<Admission>>, Condvar)> = Arc::new((Mutex::new(None), Condvar::new()));
    let slot_for_body = slot.clone();
    let kernel_for_body = client.kernel().clone();
    let client_for_body = client.clone();
    let budget = params.execution_budget;
    let mode = params.mode;
    let name_for_log = params.name.clone();

    let body = Box::new(move |handle: TaskHandle| {
        let admission = {
            let (lock, cvar) = &*slot_for_body;
            let mut guard = lock.lock();
            while guard.is_none() {
                cvar.wait(&mut guard);
            }
            guard.expect("admission slot filled before wait returns")
        };

        let completed = consume_budget(&handle, budget, mode);
        if !completed || handle.is_killed() {
            // The Scheduler Core already killed this task and moved its
            // record to Overdue (spec §4.3 DeadlineFired); self-delete
            // would be a harmless NotFound, but there is nothing left
            // to clean up on this side either.
            return;
        }

        kernel_for_body.timer_delete(admission.timer_id);
        if let Err(err) = client_for_body.delete(admission.task_id) {
            log::warn!("dds-tasks: self-delete for {name_for_log} failed: {err}");
        }
    });

    let admission = client.create(TaskSpec {
        name: params.name,
        kind: params.kind,
        execution_budget: params.execution_budget,
        relative_deadline: params.relative_deadline,
        body,
    })?;

    {
        let (lock, cvar) = &*slot;
        *lock.lock() = Some(admission);
        cvar.notify_all();
    }

    Ok(admission)
}

/// Admits a single aperiodic task (spec §4.5: "identical but runs
/// once" — no generator re-submits it).
pub fn admit_aperiodic<K: Kernel + Clone + 'static>(
    client: &Client<K>,
    name: impl Into<String>,
    execution_budget: Tick,
    relative_deadline: Tick,
    mode: ExecutionMode,
) -> Result<Admission, ClientError> {
    admit(
        client,
        TaskParams {
            name: name.into(),
            kind: TaskKind::Aperiodic,
            execution_budget,
            relative_deadline,
            mode,
        },
    )
}

/// A periodic generator: admits one periodic task instance every
/// `period` ticks, offset by `offset` ticks from when `run` is called
/// (spec §8 S4 uses staggered offsets for G1/G2/G3). The core never
/// sees `period` — only this generator does (spec §9, Open Question
/// 2) — each admitted instance is an ordinary `TaskKind::Periodic`
/// record with its own `relative_deadline`.
pub struct PeriodicGenerator<K: Kernel + Clone + 'static> {
    client: Client<K>,
    name: String,
    offset: Tick,
    period: Tick,
    execution_budget: Tick,
    relative_deadline: Tick,
    mode: ExecutionMode,
}

impl<K: Kernel + Clone + 'static> PeriodicGenerator<K> {
    /// Builds a generator that will, once `run` is called, wait
    /// `offset` ticks and then admit a fresh periodic task instance
    /// every `period` ticks thereafter.
    pub fn new(
        client: Client<K>,
        name: impl Into<String>,
        offset: Tick,
        period: Tick,
        execution_budget: Tick,
        relative_deadline: Tick,
        mode: ExecutionMode,
    ) -> Self {
        Self { client, name: name.into(), offset, period, execution_budget, relative_deadline, mode }
    }

    /// Runs the generator loop forever. Intended to be the entire body
    /// of the generator's own kernel task/thread (spec §6's "three
    /// periodic generators" in the demo control surface).
    pub fn run(self) -> ! {
        if self.offset > 0 {
            self.client.kernel().sleep(self.offset);
        }
        let mut generation: u64 = 0;
        loop {
            generation += 1;
            let instance_name = format!("{}-{generation}", self.name);
            match admit(
                &self.client,
                TaskParams {
                    name: instance_name,
                    kind: TaskKind::Periodic,
                    execution_budget: self.execution_budget,
                    relative_deadline: self.relative_deadline,
                    mode: self.mode,
                },
            ) {
                Ok(_) => {}
                Err(err) => log::warn!("dds-tasks: generator {} admission failed: {err}", self.name),
            }
            self.client.kernel().sleep(self.period);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dds_core::SchedulerCore;
    use std::thread;
    use std::time::Duration;

    fn spawn_core(kernel: dds_kernel::HostKernel) -> dds_kernel::MailboxSender<dds_core::SchedulerRequest> {
        let (tx, rx) = kernel.mailbox::<dds_core::SchedulerRequest>(dds_abi::config::MAILBOX_CAPACITY);
        let core = SchedulerCore::new(kernel, rx, dds_abi::config::OVERDUE_CAPACITY);
        thread::spawn(move || core.run());
        tx
    }

    /// S1 — single periodic completes in time: once admitted, the
    /// task occupies Active until its budget elapses, then self-deletes.
    #[test]
    fn s1_single_task_completes_and_self_deletes() {
        let kernel = dds_kernel::HostKernel::new(Duration::from_millis(1));
        let core_mailbox = spawn_core(kernel.clone());
        let client = Client::new(kernel, core_mailbox);

        let admission =
            admit_aperiodic(&client, "s1", 20, 1000, ExecutionMode::Sleep).expect("admit succeeds");
        assert_eq!(client.active_snapshot().unwrap().len(), 1);

        thread::sleep(Duration::from_millis(200));
        assert!(client.active_snapshot().unwrap().is_empty());
        assert!(client.overdue_snapshot().unwrap().is_empty());
        assert!(client.delete(admission.task_id).is_err(), "already self-deleted");
    }

    /// S2 — two periodics, closer deadline wins head; when the head
    /// instance finishes, the remaining task is promoted.
    #[test]
    fn s2_closer_deadline_wins_head_then_yields_on_completion() {
        let kernel = dds_kernel::HostKernel::new(Duration::from_millis(1));
        let core_mailbox = spawn_core(kernel.clone());
        let client = Client::new(kernel.clone(), core_mailbox);

        let a = admit_aperiodic(&client, "a", 10_000, 1000, ExecutionMode::Sleep).unwrap();
        thread::sleep(Duration::from_millis(5));
        let b = admit_aperiodic(&client, "b", 20, 600, ExecutionMode::Sleep).unwrap();

        let active = client.active_snapshot().unwrap();
        assert_eq!(active[0].task_id, b.task_id, "closer absolute deadline leads");

        thread::sleep(Duration::from_millis(100));
        let active = client.active_snapshot().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].task_id, a.task_id, "b finished, a remains the only active task");
    }

    /// S3 — deadline miss: a task whose execution budget exceeds its
    /// deadline is moved to Overdue by the firing timer, not deleted
    /// by the body (which is still sleeping).
    #[test]
    fn s3_deadline_miss_lands_in_overdue() {
        let kernel = dds_kernel::HostKernel::new(Duration::from_millis(1));
        let core_mailbox = spawn_core(kernel.clone());
        let client = Client::new(kernel, core_mailbox);

        let admission = admit_aperiodic(&client, "overrun", 10_000, 20, ExecutionMode::Sleep).unwrap();
        thread::sleep(Duration::from_millis(150));

        let overdue = client.overdue_snapshot().unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].task_id, admission.task_id);
        assert!(client.active_snapshot().unwrap().is_empty());
    }

    #[test]
    fn periodic_generator_admits_on_every_period() {
        let kernel = dds_kernel::HostKernel::new(Duration::from_millis(1));
        let core_mailbox = spawn_core(kernel.clone());
        let client = Client::new(kernel.clone(), core_mailbox);

        let generator =
            PeriodicGenerator::new(client.clone(), "g", 0, 40, 5, 2000, ExecutionMode::Sleep);
        thread::spawn(move || generator.run());

        thread::sleep(Duration::from_millis(150));
        let active = client.active_snapshot().unwrap();
        assert!(active.len() >= 2, "generator should have admitted multiple instances by now");
    }
}
