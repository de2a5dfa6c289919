// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Optional TOML tuning for the demo binary. There is no external
//! configuration surface in spec.md itself (§7: `dds-abi::config`'s
//! constants are plain `const`s, not file/env driven); this file
//! exists purely so the demo can be pointed at a different scenario
//! than the spec.md §8 S4 default without a recompile, grounded on
//! `recipes/libs/nexus-settingsd::persist::load`'s
//! config-from-TOML-with-fallback pattern.

use std::path::Path;

use dds_abi::Tick;
use serde::Deserialize;

/// One generator's shape: when it starts, how often it re-admits, and
/// the budget/deadline of each instance it admits.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Name prefix for admitted instances (e.g. "g1-1", "g1-2", ...).
    pub name: String,
    /// Ticks to wait before this generator's first admission.
    pub offset: Tick,
    /// Ticks between successive admissions.
    pub period: Tick,
    /// Ticks of simulated work each admitted instance consumes.
    pub execution_budget: Tick,
    /// Ticks from admission within which each instance must complete.
    pub relative_deadline: Tick,
}

/// Top-level demo configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Milliseconds of wall time per simulated tick.
    pub tick_period_millis: u64,
    /// How many ticks the demo runs before reporting and exiting.
    pub horizon_ticks: Tick,
    /// How often (in ticks) the monitor samples utilisation.
    pub monitor_interval_ticks: Tick,
    /// The generators to run concurrently.
    pub generators: Vec<GeneratorConfig>,
}

impl Default for DemoConfig {
    /// spec.md §8 S4: three periodic generators over a 10 000-tick
    /// horizon, utilisation 500/2000 + 250/2000 + 100/2000 = 42.5%,
    /// schedulable under EDF with no deadline misses expected.
    fn default() -> Self {
        Self {
            tick_period_millis: 1,
            horizon_ticks: 10_000,
            monitor_interval_ticks: 500,
            generators: vec![
                GeneratorConfig {
                    name: "g1".into(),
                    offset: 0,
                    period: 2000,
                    execution_budget: 500,
                    relative_deadline: 1000,
                },
                GeneratorConfig {
                    name: "g2".into(),
                    offset: 250,
                    period: 2000,
                    execution_budget: 250,
                    relative_deadline: 600,
                },
                GeneratorConfig {
                    name: "g3".into(),
                    offset: 4100,
                    period: 2000,
                    execution_budget: 100,
                    relative_deadline: 200,
                },
            ],
        }
    }
}

/// Loads `path` if present and parses as valid TOML; falls back to
/// [`DemoConfig::default`] (with a logged reason) otherwise.
pub fn load(path: &Path) -> DemoConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            log::info!("dds-demo: no config at {}, using built-in S4 scenario ({err})", path.display());
            return DemoConfig::default();
        }
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("dds-demo: failed to parse {}, using built-in S4 scenario: {err}", path.display());
            DemoConfig::default()
        }
    }
}
