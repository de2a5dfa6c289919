// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Kernel Adapter (C1) — abstract RTOS primitives consumed by the
//! deadline-driven scheduler, plus the one concrete backend this
//! workspace implements: `HostKernel`.
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//!
//! PUBLIC API:
//!   - trait Kernel: task spawn/kill/priority, one-shot timers, bounded mailboxes, tick clock
//!   - HostKernel: std-thread + crossbeam-channel realization of `Kernel`
//!   - TaskHandle: cooperative-cancellation token passed into a spawned task body
//!   - MailboxSender<T> / MailboxReceiver<T>: typed bounded mailbox endpoints
//!
//! DEPENDENCIES:
//!   - crossbeam-channel: bounded mailbox queues with blocking/timeout recv
//!   - parking_lot: task bookkeeping mutex
//!   - thiserror: KernelError
//!
//! Any RTOS providing task spawn/kill, priority set, one-shot software
//! timers, and bounded mailboxes satisfies this trait (spec §6). Only
//! `HostKernel` is implemented here; an embedded backend would live in
//! a sibling module behind the same trait, the way this codebase keeps
//! a `host` backend next to an `os` backend for its IPC runtime
//! (`userspace/nexus-ipc`) and its service registry (`userspace/samgr`).

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

mod host;
mod timer;

pub use dds_abi::{config, MailboxId, Priority, TaskId, TaskKind, Tick, TimerId, Wait};
pub use host::{HostKernel, TaskHandle, DEFAULT_TICK_PERIOD};

/// Errors surfaced by a `Kernel` implementation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum KernelError {
    /// A non-blocking or timed-out operation could not complete.
    #[error("operation would block")]
    WouldBlock,
    /// A `Wait::Timeout` elapsed before the operation completed.
    #[error("operation timed out")]
    Timeout,
    /// The peer endpoint (mailbox or task) has gone away.
    #[error("peer disconnected")]
    Disconnected,
    /// The kernel could not spawn the requested task.
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
}

/// Abstract RTOS primitives the deadline-driven scheduler consumes.
///
/// Exactly the operation set of spec.md §4.1; out of scope: board
/// bring-up, clock setup, and interrupt configuration — those belong
/// to whatever boots a concrete `Kernel` implementation, not to the
/// trait itself.
pub trait Kernel: Send + Sync {
    /// Monotonic tick count since the kernel started.
    fn now(&self) -> Tick;

    /// Spawns a task at the given priority, invoking `body` with a
    /// cooperative cancellation handle. Returns the new task's id.
    fn spawn(
        &self,
        name: &str,
        priority: Priority,
        body: Box<dyn FnOnce(TaskHandle) + Send + 'static>,
    ) -> Result<TaskId, KernelError>;

    /// Requests termination of `task`. Cooperative: the task body
    /// notices via its `TaskHandle` at its next checkpoint.
    fn kill(&self, task: TaskId);

    /// Sets `task`'s kernel priority. Idempotent — safe to call with
    /// the task's current priority.
    fn set_priority(&self, task: TaskId, priority: Priority);

    /// Creates an inert one-shot timer that will invoke `on_fire` once
    /// armed (via [`Kernel::timer_start`]) and its deadline elapses.
    fn timer_create(&self, on_fire: Box<dyn Fn() + Send + Sync + 'static>) -> TimerId;

    /// Arms `timer` to fire `duration` ticks from now.
    fn timer_start(&self, timer: TimerId, duration: Tick);

    /// Cancels `timer`. A no-op if it already fired or was deleted.
    fn timer_delete(&self, timer: TimerId);

    /// Creates a bounded mailbox pair of the given capacity.
    fn mailbox<T: Send + 'static>(&self, capacity: usize) -> (MailboxSender<T>, MailboxReceiver<T>);

    /// Blocks the calling thread for `ticks` ticks, uninterruptibly.
    /// Used by client-side generators, which are never killed by the
    /// scheduler (only admitted user tasks are).
    fn sleep(&self, ticks: Tick);
}

/// Sending half of a bounded mailbox.
#[derive(Clone)]
pub struct MailboxSender<T> {
    id: MailboxId,
    tx: crossbeam_channel::Sender<T>,
    tick_period: std::time::Duration,
}

impl<T> MailboxSender<T> {
    pub(crate) fn new(
        id: MailboxId,
        tx: crossbeam_channel::Sender<T>,
        tick_period: std::time::Duration,
    ) -> Self {
        Self { id, tx, tick_period }
    }

    /// The handle identifying this mailbox, for logging.
    pub fn id(&self) -> MailboxId {
        self.id
    }

    /// Sends `msg`, waiting as directed by `wait`.
    ///
    /// A disconnected receiver (the client abandoned its reply
    /// mailbox after timing out) is swallowed, not propagated — spec
    /// §5 requires the kernel adapter to tolerate replies sent into a
    /// destroyed mailbox.
    pub fn send(&self, msg: T, wait: Wait) -> Result<(), KernelError> {
        match wait {
            Wait::Blocking => self.tx.send(msg).map_err(|_| KernelError::Disconnected),
            Wait::Timeout(ticks) => {
                let timeout = self.tick_duration(ticks);
                self.tx.send_timeout(msg, timeout).map_err(|err| match err {
                    crossbeam_channel::SendTimeoutError::Timeout(_) => KernelError::Timeout,
                    crossbeam_channel::SendTimeoutError::Disconnected(_) => KernelError::Disconnected,
                })
            }
        }
    }

    /// Sends `msg` without blocking the timer-service thread; errors
    /// are logged and dropped, matching spec §5's tolerance policy
    /// for replies into a mailbox nobody is listening on anymore.
    pub fn send_best_effort(&self, msg: T) {
        if self.tx.try_send(msg).is_err() {
            log::debug!("dds-kernel: best-effort send to {} dropped (no receiver)", self.id);
        }
    }

    fn tick_duration(&self, ticks: Tick) -> std::time::Duration {
        self.tick_period.saturating_mul(ticks.min(u32::MAX as u64) as u32)
    }
}

/// Receiving half of a bounded mailbox.
pub struct MailboxReceiver<T> {
    id: MailboxId,
    rx: crossbeam_channel::Receiver<T>,
    tick_period: std::time::Duration,
}

impl<T> MailboxReceiver<T> {
    pub(crate) fn new(
        id: MailboxId,
        rx: crossbeam_channel::Receiver<T>,
        tick_period: std::time::Duration,
    ) -> Self {
        Self { id, rx, tick_period }
    }

    /// The handle identifying this mailbox, for logging.
    pub fn id(&self) -> MailboxId {
        self.id
    }

    /// Receives the next message, waiting as directed by `wait`.
    pub fn recv(&self, wait: Wait) -> Result<T, KernelError> {
        match wait {
            Wait::Blocking => self.rx.recv().map_err(|_| KernelError::Disconnected),
            Wait::Timeout(ticks) => {
                let timeout = self.tick_period.saturating_mul(ticks.min(u32::MAX as u64) as u32);
                self.rx.recv_timeout(timeout).map_err(|err| match err {
                    crossbeam_channel::RecvTimeoutError::Timeout => KernelError::Timeout,
                    crossbeam_channel::RecvTimeoutError::Disconnected => KernelError::Disconnected,
                })
            }
        }
    }
}
