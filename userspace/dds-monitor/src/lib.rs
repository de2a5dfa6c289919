// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Monitor/Metrics (C6) — sampled utilisation and list-head
//! reporting, consuming only the Client API (C4).
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//!
//! PUBLIC API:
//!   - Utilisation: rational (active, idle) sample counter
//!   - MonitorReport, Monitor::run_once
//!
//! DEPENDENCIES:
//!   - dds-abi, dds-kernel, dds-core, dds-client
//!   - log
//!
//! spec.md §2 describes C6 only as "a consumer of C4"; §9 singles out
//! the source's `ACTIVE_COUNTER / IDLE_COUNTER` utilisation metric as
//! dividing by zero with no guard. `Utilisation::percentage` resolves
//! that by returning `None` at zero samples instead of computing NaN
//! or panicking — matching the general style the rest of this
//! codebase uses for "no data yet" (`source/services/timed` returns an
//! explicit reject/option rather than ever computing garbage).

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use parking_lot::Mutex;

use dds_client::{Client, ClientError};
use dds_core::{OverdueStats, TaskRecord};
use dds_kernel::Kernel;

/// A rational sample counter: how many `run_once` samples observed at
/// least one active task versus none. Never divides by zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utilisation {
    active: u64,
    idle: u64,
}

impl Utilisation {
    /// An empty counter: no samples taken yet.
    pub const fn new() -> Self {
        Self { active: 0, idle: 0 }
    }

    /// Samples where the Active list was non-empty.
    pub fn active_samples(&self) -> u64 {
        self.active
    }

    /// Samples where the Active list was empty.
    pub fn idle_samples(&self) -> u64 {
        self.idle
    }

    /// Total samples taken.
    pub fn samples(&self) -> u64 {
        self.active.saturating_add(self.idle)
    }

    /// Percentage of samples that observed at least one active task.
    /// `None` when no samples have been taken yet — the rewrite of
    /// the source's unguarded `ACTIVE_COUNTER / IDLE_COUNTER` division
    /// (spec.md §9).
    pub fn percentage(&self) -> Option<f64> {
        let total = self.samples();
        if total == 0 {
            return None;
        }
        Some(100.0 * self.active as f64 / total as f64)
    }

    fn record(&mut self, active_list_nonempty: bool) {
        if active_list_nonempty {
            self.active = self.active.saturating_add(1);
        } else {
            self.idle = self.idle.saturating_add(1);
        }
    }
}

/// One sampling pass of the scheduler's state, returned to the caller
/// instead of printed directly — spec.md §1 keeps stdio/logging out of
/// the core; a demo binary or test decides what to do with a report.
#[derive(Debug, Clone)]
pub struct MonitorReport {
    /// Running utilisation counter as of this sample.
    pub utilisation: Utilisation,
    /// The Active list's EDF head, if any were admitted at sample time.
    pub active_head: Option<TaskRecord>,
    /// The Overdue list's oldest retained record, if any.
    pub overdue_head: Option<TaskRecord>,
    /// Total Overdue records evicted by the bounded-ring policy so far.
    pub overdue_drops: u64,
}

/// Samples a Scheduler Core through the Client API (C4) and
/// accumulates utilisation over repeated calls to `run_once`.
pub struct Monitor<K: Kernel + Clone + 'static> {
    client: Client<K>,
    overdue_stats: OverdueStats,
    utilisation: Mutex<Utilisation>,
}

impl<K: Kernel + Clone + 'static> Monitor<K> {
    /// Builds a monitor sampling `client`'s scheduler. `overdue_stats`
    /// is obtained from the same `SchedulerCore` the client talks to
    /// (`SchedulerCore::overdue_stats`) — a read-only handle, not a
    /// sixth request kind, so the Scheduler Core's protocol (spec §4.3)
    /// stays exactly the five kinds spec.md defines.
    pub fn new(client: Client<K>, overdue_stats: OverdueStats) -> Self {
        Self { client, overdue_stats, utilisation: Mutex::new(Utilisation::new()) }
    }

    /// The running utilisation counter, independent of a fresh sample.
    pub fn utilisation(&self) -> Utilisation {
        *self.utilisation.lock()
    }

    /// Takes one sample: queries Active and Overdue, folds the result
    /// into the running utilisation counter, and returns a report. The
    /// caller controls cadence (a demo binary sleeping between calls,
    /// or a test calling it once) rather than this type looping
    /// forever itself.
    pub fn run_once(&self) -> Result<MonitorReport, ClientError> {
        let active = self.client.active_snapshot()?;
        let overdue = self.client.overdue_snapshot()?;

        let mut utilisation = self.utilisation.lock();
        utilisation.record(!active.is_empty());
        let utilisation = *utilisation;

        Ok(MonitorReport {
            utilisation,
            active_head: active.into_iter().next(),
            overdue_head: overdue.into_iter().next(),
            overdue_drops: self.overdue_stats.dropped(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilisation_percentage_is_none_at_zero_samples() {
        let u = Utilisation::new();
        assert_eq!(u.percentage(), None);
    }

    #[test]
    fn utilisation_percentage_reflects_active_fraction() {
        let mut u = Utilisation::new();
        u.record(true);
        u.record(true);
        u.record(false);
        assert_eq!(u.samples(), 3);
        assert!((u.percentage().unwrap() - (200.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn run_once_reports_empty_state_before_any_admission() {
        use dds_core::SchedulerCore;
        use std::thread;
        use std::time::Duration;

        let kernel = dds_kernel::HostKernel::new(Duration::from_millis(1));
        let (tx, rx) = kernel.mailbox::<dds_core::SchedulerRequest>(dds_abi::config::MAILBOX_CAPACITY);
        let core = SchedulerCore::new(kernel.clone(), rx, dds_abi::config::OVERDUE_CAPACITY);
        let overdue_stats = core.overdue_stats();
        thread::spawn(move || core.run());

        let client = Client::new(kernel, tx);
        let monitor = Monitor::new(client, overdue_stats);

        let report = monitor.run_once().expect("sample succeeds");
        assert!(report.active_head.is_none());
        assert!(report.overdue_head.is_none());
        assert_eq!(report.overdue_drops, 0);
        assert_eq!(report.utilisation.samples(), 1);
        assert_eq!(report.utilisation.percentage(), Some(0.0));
    }

    #[test]
    fn run_once_reports_active_head_once_a_task_is_admitted() {
        use dds_abi::{TaskKind, TimerId};
        use dds_core::{CreateSpec, Reply, SchedulerCore};
        use std::thread;
        use std::time::Duration;

        let kernel = dds_kernel::HostKernel::new(Duration::from_millis(1));
        let (tx, rx) = kernel.mailbox::<dds_core::SchedulerRequest>(dds_abi::config::MAILBOX_CAPACITY);
        let core = SchedulerCore::new(kernel.clone(), rx, dds_abi::config::OVERDUE_CAPACITY);
        let overdue_stats = core.overdue_stats();
        thread::spawn(move || core.run());

        let client = Client::new(kernel.clone(), tx.clone());
        let task_id = kernel
            .spawn("probe", dds_abi::Priority::Low, Box::new(|h| { h.sleep(1_000_000); }))
            .unwrap();
        let (reply_to, reply_from) = kernel.mailbox::<Reply>(1);
        tx.send(
            dds_core::SchedulerRequest::Create {
                spec: CreateSpec {
                    task_id,
                    timer_id: TimerId::from_raw(1),
                    kind: TaskKind::Aperiodic,
                    execution_budget: 0,
                    relative_deadline: 1000,
                },
                reply_to,
            },
            dds_abi::Wait::Blocking,
        )
        .unwrap();
        reply_from.recv(dds_abi::Wait::Blocking).unwrap();

        let monitor = Monitor::new(client, overdue_stats);
        let report = monitor.run_once().unwrap();
        assert_eq!(report.active_head.map(|r| r.task_id), Some(task_id));
        assert_eq!(report.utilisation.percentage(), Some(100.0));
    }
}
