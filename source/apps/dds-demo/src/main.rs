// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Demo binary: boots a `HostKernel`, the Scheduler Core, three
//! periodic generators, and a monitor loop — the spec.md §6 "control
//! surface" description ("boots the RTOS, creates the Scheduler Core
//! task, three periodic generators, and the monitor, then starts the
//! scheduler") realized on the host `Kernel` backend, replicating the
//! §8 S4 scenario by default.

mod config;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use dds_abi::config as dds_config;
use dds_client::Client;
use dds_core::SchedulerCore;
use dds_kernel::{HostKernel, Kernel};
use dds_monitor::Monitor;
use dds_tasks::{ExecutionMode, PeriodicGenerator};

fn main() {
    env_logger::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("dds-demo.toml"));
    let demo = config::load(&config_path);

    let kernel = HostKernel::new(Duration::from_millis(demo.tick_period_millis));
    let (core_mailbox, core_inbox) = kernel.mailbox(dds_config::MAILBOX_CAPACITY);
    let core = SchedulerCore::new(kernel.clone(), core_inbox, dds_config::OVERDUE_CAPACITY);
    let overdue_stats = core.overdue_stats();
    thread::spawn(move || core.run());

    let client = Client::new(kernel.clone(), core_mailbox);

    for generator_config in &demo.generators {
        let generator = PeriodicGenerator::new(
            client.clone(),
            generator_config.name.clone(),
            generator_config.offset,
            generator_config.period,
            generator_config.execution_budget,
            generator_config.relative_deadline,
            ExecutionMode::Sleep,
        );
        thread::spawn(move || generator.run());
    }

    let monitor = Monitor::new(client, overdue_stats);
    log::info!(
        "dds-demo: running {} generators over a {}-tick horizon",
        demo.generators.len(),
        demo.horizon_ticks
    );

    while kernel.now() < demo.horizon_ticks {
        kernel.sleep(demo.monitor_interval_ticks);
        match monitor.run_once() {
            Ok(report) => log::info!(
                "tick {}: utilisation={:?}% active_head={:?} overdue_drops={}",
                kernel.now(),
                report.utilisation.percentage(),
                report.active_head.map(|r| r.task_id),
                report.overdue_drops,
            ),
            Err(err) => log::warn!("dds-demo: monitor sample failed: {err}"),
        }
    }

    let final_report = monitor.run_once().expect("final sample succeeds");
    log::info!(
        "dds-demo: horizon reached. utilisation={:?}% overdue_drops={}",
        final_report.utilisation.percentage(),
        final_report.overdue_drops
    );
}
