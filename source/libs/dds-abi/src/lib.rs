// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Shared ABI types for the deadline-driven scheduler (DDS)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//!
//! Opaque handles, the monotonic tick type, and the fixed priority
//! ladder the DDS kernel adapter and scheduler core agree on. This
//! crate has no dependencies and no behavior: every type here is a
//! thin, `Copy` newtype.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Monotonic kernel tick count. Wraps at `2^32` ticks per spec.
pub type Tick = u64;

/// Opaque kernel task handle, unique while the task is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Opaque kernel one-shot timer handle, bound 1:1 to a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Opaque kernel mailbox handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MailboxId(u64);

macro_rules! handle_newtype {
    ($name:ident) => {
        impl $name {
            /// Wraps a raw handle value. Only the kernel adapter allocates these.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw handle value, primarily for logging.
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

handle_newtype!(TaskId);
handle_newtype!(TimerId);
handle_newtype!(MailboxId);

/// Monotonically increasing handle allocator shared by a `Kernel` backend.
///
/// Each call to `next()` returns a distinct value; counters never
/// reuse a handle within a process lifetime.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: AtomicU64,
}

impl HandleAllocator {
    /// Creates an allocator whose first handle is `1` (`0` is reserved
    /// as a never-allocated sentinel, matching this handle's `Display`
    /// impl never printing a meaningless `(0)` for a live object).
    pub const fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Allocates the next raw handle value.
    pub fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Kernel priority ladder, `LOW < MEDIUM < MONITOR < HIGH < SCHEDULER`.
///
/// Ordered so callers compare priorities with `<`/`>` rather than
/// comparing raw integers the way the source's FreeRTOS priorities
/// did; the scheduler core and kernel adapter never see a bare `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Every admitted task that is not the current EDF head.
    Low,
    /// The current EDF head (nearest absolute deadline).
    Medium,
    /// The monitor/metrics sampler.
    Monitor,
    /// Generator / client-facing workers that submit requests.
    High,
    /// The Scheduler Core itself; always above every client.
    Scheduler,
}

/// Whether an admitted task is periodic (re-created by its generator
/// each period) or aperiodic (created once, runs once).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Re-submitted by a generator every `period` ticks.
    Periodic,
    /// Submitted once; the record is never re-created.
    Aperiodic,
}

/// Blocking behavior requested for a kernel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Block until the operation completes.
    Blocking,
    /// Block until either the operation completes or `Tick`s elapse.
    Timeout(Tick),
}

/// Tunable constants recognized by the DDS host realization.
pub mod config {
    use super::Tick;

    /// Default capacity of the Scheduler Core's inbound mailbox and of
    /// every per-client reply mailbox.
    pub const MAILBOX_CAPACITY: usize = 100;

    /// Bounded retention of the Overdue list (see `DESIGN.md`, Open
    /// Question 3: records are never reclaimed in the source; this
    /// rewrite picks a bounded ring with deterministic eviction).
    pub const OVERDUE_CAPACITY: usize = 256;

    /// Receive timeout every Client API call uses while awaiting a
    /// reply from the Scheduler Core.
    pub const CLIENT_REPLY_TIMEOUT: Tick = 5000;
}
