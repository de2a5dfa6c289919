// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-consumer timer-service thread: a min-heap of pending fires
//! serviced by one dedicated thread, the host analogue of an RTOS
//! software-timer daemon task. Grounded on
//! `source/services/timed`'s `TimerRegistry` (bounded registrations,
//! explicit reject reasons) — adapted here from a pure registry into
//! one that actually fires callbacks at their deadline.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use dds_abi::{Tick, TimerId};

pub(crate) enum TimerCommand {
    Arm { timer: TimerId, fire_at: Instant, on_fire: Box<dyn Fn() + Send + Sync + 'static> },
    Cancel { timer: TimerId },
    Shutdown,
}

struct PendingTimer {
    fire_at: Instant,
    on_fire: Box<dyn Fn() + Send + Sync + 'static>,
    cancelled: bool,
}

/// Spawns the timer-service thread, returning the command channel used
/// to arm/cancel timers and the `JoinHandle` for shutdown.
pub(crate) fn spawn_timer_service(
    cmd_rx: mpsc::Receiver<TimerCommand>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("dds-timer-service".into())
        .spawn(move || run(cmd_rx))
        .expect("spawn timer-service thread")
}

fn run(cmd_rx: mpsc::Receiver<TimerCommand>) {
    let mut pending: HashMap<TimerId, PendingTimer> = HashMap::new();
    let mut schedule: BinaryHeap<Reverse<(Instant, u64, TimerId)>> = BinaryHeap::new();
    let mut seq: u64 = 0;

    loop {
        let now = Instant::now();
        // Fire every entry whose deadline has already elapsed.
        while let Some(Reverse((fire_at, _, timer))) = schedule.peek().copied() {
            if fire_at > now {
                break;
            }
            schedule.pop();
            if let Some(entry) = pending.remove(&timer) {
                if !entry.cancelled && entry.fire_at <= now {
                    (entry.on_fire)();
                } else if !entry.cancelled {
                    // A re-arm bumped fire_at forward; this heap entry
                    // is stale, the fresh one is still in `pending`.
                    // (Re-arming isn't part of the DDS protocol today,
                    // but the stale-entry check keeps this correct if
                    // it ever is.)
                }
            }
        }

        let wait = match schedule.peek() {
            Some(Reverse((fire_at, _, _))) => fire_at.saturating_duration_since(Instant::now()),
            None => Duration::from_secs(3600),
        };

        match cmd_rx.recv_timeout(wait) {
            Ok(TimerCommand::Arm { timer, fire_at, on_fire }) => {
                pending.insert(timer, PendingTimer { fire_at, on_fire, cancelled: false });
                seq += 1;
                schedule.push(Reverse((fire_at, seq, timer)));
            }
            Ok(TimerCommand::Cancel { timer }) => {
                if let Some(entry) = pending.get_mut(&timer) {
                    entry.cancelled = true;
                }
            }
            Ok(TimerCommand::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Loop back around; the top-of-loop fire sweep handles it.
            }
        }
    }
}

/// Converts a tick duration into a wall-clock `Duration`.
pub(crate) fn ticks_to_duration(ticks: Tick, tick_period: Duration) -> Duration {
    tick_period.saturating_mul(ticks.min(u32::MAX as u64) as u32)
}
