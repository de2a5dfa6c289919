// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: end-to-end scenario harness for the deadline-driven
//! scheduler — wires a `HostKernel`, a `SchedulerCore` thread, and a
//! `Client` the way `dds-demo`'s binary does, for tests that exercise
//! the whole stack instead of one crate in isolation.
//!
//! Matches this workspace's convention of giving a larger end-to-end
//! scenario its own `tests/*` workspace member (`tests/e2e`,
//! `tests/vfs_e2e`, `tests/logd_e2e`) rather than folding it into a
//! library's `#[cfg(test)]` module.

use std::thread;
use std::time::Duration;

use dds_client::Client;
use dds_core::{OverdueStats, SchedulerCore};
use dds_kernel::HostKernel;

/// A fully wired scheduler stack for a test to drive.
pub struct Scenario {
    /// The host kernel backing every component below.
    pub kernel: HostKernel,
    /// The client-facing API under test.
    pub client: Client<HostKernel>,
    /// Read-only handle onto the Scheduler Core's Overdue drop counter.
    pub overdue_stats: OverdueStats,
}

/// Boots a `HostKernel` ticking every `tick_period` of wall time, a
/// `SchedulerCore` on its own thread, and a `Client` pointed at it.
pub fn spawn_scenario(tick_period: Duration) -> Scenario {
    let kernel = HostKernel::new(tick_period);
    let (core_mailbox, core_inbox) = kernel.mailbox(dds_abi::config::MAILBOX_CAPACITY);
    let core = SchedulerCore::new(kernel.clone(), core_inbox, dds_abi::config::OVERDUE_CAPACITY);
    let overdue_stats = core.overdue_stats();
    thread::spawn(move || core.run());

    let client = Client::new(kernel.clone(), core_mailbox);
    Scenario { kernel, client, overdue_stats }
}
