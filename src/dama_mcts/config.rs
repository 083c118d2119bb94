// Copyright 2024 Dama Engine Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The per-call configuration surface of spec §6, collapsing the many
//! named booleans into one record (spec §9's "configuration flags with
//! many booleans" design note) with defaults that fall back to
//! `dama_utils::config`'s process-wide, env-overridable statics when a
//! caller doesn't care to set them explicitly.

use std::time::Duration;

use dama_board::heuristics::HeuristicWeights;
use dama_utils::config;
use dama_utils::error::DamaError;

use crate::policy::{PolicyConfig, SelectionFormula};

/// Every knob spec §6 lists for one call to `search`.
#[derive(Clone)]
pub struct Config {
    pub num_workers: usize,
    pub batch_max: usize,
    pub batch_deadline: Duration,
    pub time_limit: Option<Duration>,
    pub max_nodes: Option<u64>,

    pub policy: PolicyConfig,

    pub use_solver: bool,
    pub use_tt: bool,
    pub use_tree_reuse: bool,

    pub rollout_epsilon: f32,
    pub use_decaying_reward: bool,
    pub decay_factor: f32,

    pub draw_score: f32,
    pub arena_bytes: usize,
}

impl Config {
    /// Rejects the configuration errors spec §7 names at `search` entry,
    /// before any worker is spawned or any node allocated.
    pub fn validate(&self) -> Result<(), DamaError> {
        if self.num_workers == 0 {
            return Err(DamaError::InvalidConfig("num_workers must be >= 1".to_string()));
        }
        if self.batch_max == 0 {
            return Err(DamaError::InvalidConfig("batch_max must be >= 1".to_string()));
        }
        if self.policy.c_puct < 0.0 {
            return Err(DamaError::InvalidConfig("c_puct must be non-negative".to_string()));
        }
        if self.policy.c_ucb < 0.0 {
            return Err(DamaError::InvalidConfig("c_ucb must be non-negative".to_string()));
        }
        if !(0.0..=1.0).contains(&self.rollout_epsilon) {
            return Err(DamaError::InvalidConfig("rollout_epsilon must be in [0, 1]".to_string()));
        }
        if self.arena_bytes == 0 {
            return Err(DamaError::InvalidConfig("arena_bytes must be >= 1".to_string()));
        }
        if self.time_limit.is_none() && self.max_nodes.is_none() {
            return Err(DamaError::InvalidConfig(
                "at least one of time_limit or max_nodes must be set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            num_workers: *config::NUM_WORKERS,
            batch_max: *config::BATCH_MAX,
            batch_deadline: Duration::from_millis(*config::BATCH_DEADLINE_MS),
            time_limit: Some(Duration::from_secs(5)),
            max_nodes: None,
            policy: PolicyConfig {
                formula: SelectionFormula::Puct,
                ..PolicyConfig::default()
            },
            use_solver: true,
            use_tt: true,
            use_tree_reuse: true,
            rollout_epsilon: 1.0,
            use_decaying_reward: false,
            decay_factor: 0.99,
            draw_score: 0.5,
            arena_bytes: *config::ARENA_BYTES,
        }
    }
}

/// A `Config` with no priors available: selection falls back to
/// UCB1-Tuned and the rollout is the sole source of leaf values, matching
/// spec §4.5's "used when no priors" condition.
pub fn simulation_only(heuristic_weights: HeuristicWeights) -> Config {
    Config {
        policy: PolicyConfig {
            formula: SelectionFormula::Ucb1Tuned,
            heuristic_weights,
            ..PolicyConfig::default()
        },
        ..Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut config = Config::default();
        config.num_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_exploration_constant_is_rejected() {
        let mut config = Config::default();
        config.policy.c_puct = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn no_budget_at_all_is_rejected() {
        let mut config = Config::default();
        config.time_limit = None;
        config.max_nodes = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn simulation_only_uses_ucb1_tuned() {
        let config = simulation_only(HeuristicWeights::default());
        assert_eq!(config.policy.formula, SelectionFormula::Ucb1Tuned);
    }
}
