// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Ordered Task Lists (C2) + Scheduler Core (C3) of the
//! deadline-driven scheduler — admission, EDF ordering, and the
//! request/response protocol that mutates it.
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//!
//! PUBLIC API:
//!   - SchedulerCore: owns ActiveList + OverdueList, services SchedulerRequest
//!   - ActiveList / OverdueList: the ordered containers (spec §4.2)
//!   - TaskRecord: the admitted-task record (spec §3)
//!   - SchedulerRequest / CreateSpec / Reply: the wire protocol (spec §4.3)
//!
//! DEPENDENCIES:
//!   - dds-abi, dds-kernel: shared types and the Kernel trait
//!   - thiserror, log
//!
//! All list mutation happens inside `SchedulerCore`, and nowhere else;
//! spec §5 notes this is why the core needs no locks despite being
//! concurrently reachable from many clients — there is exactly one
//! consumer of its mailbox.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

mod core;
mod lists;
mod protocol;
mod record;

pub use crate::core::{OverdueStats, SchedulerCore};
pub use lists::{ActiveList, OverdueList};
pub use protocol::{CreateSpec, Reply, SchedulerRequest};
pub use record::TaskRecord;
