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

//! The tree policy (spec §4.5): PUCT or UCB1-Tuned selection, with
//! First-Play Urgency and a progressive-bias term layered on top.

use ordered_float::OrderedFloat;

use dama_board::heuristics::{move_score, HeuristicWeights};
use dama_board::{move_to_policy_index, Color, Move};

/// Per-child statistics the policy needs, read out of a `Node`'s child
/// slot without exposing the node itself (keeps this module ignorant of
/// the tree's storage/locking details).
#[derive(Debug, Clone, Copy)]
pub struct ChildStats {
    pub visits: u64,
    pub score_sum: f64,
    pub prior: f32,
}

impl ChildStats {
    /// `Q(child)`, the exploitation term. `0.0` for an unvisited child --
    /// First-Play Urgency takes over in that case instead.
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.score_sum / self.visits as f64
        }
    }
}

/// Which selection score to use, set once per `Config` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFormula {
    Puct,
    Ucb1Tuned,
}

/// Every knob spec §4.5/§6 lists for scoring a child during descent.
#[derive(Debug, Clone, Copy)]
pub struct PolicyConfig {
    pub formula: SelectionFormula,
    pub c_puct: f64,
    pub c_ucb: f64,
    pub use_fpu: bool,
    pub first_play_urgency: f64,
    pub use_progressive_bias: bool,
    pub bias_constant: f64,
    pub heuristic_weights: HeuristicWeights,
}

impl Default for PolicyConfig {
    fn default() -> PolicyConfig {
        PolicyConfig {
            formula: SelectionFormula::Puct,
            c_puct: 1.4,
            c_ucb: 1.4,
            use_fpu: true,
            first_play_urgency: 1.0,
            use_progressive_bias: false,
            bias_constant: 0.1,
            heuristic_weights: HeuristicWeights::default(),
        }
    }
}

/// Scores one candidate child for selection (spec §4.5). `parent_visits`
/// is `N_parent`; for PUCT it additionally needs `sqrt_sibling_visits`,
/// the square root of the sum of every sibling's visit count (including
/// this one).
#[allow(clippy::too_many_arguments)]
pub fn score_child(
    config: &PolicyConfig,
    stats: &ChildStats,
    mv: &Move,
    parent_visits: u64,
    sqrt_sibling_visits: f64,
) -> f64 {
    if stats.visits == 0 {
        return if config.use_fpu { config.first_play_urgency } else { f64::INFINITY };
    }

    let mut score = match config.formula {
        SelectionFormula::Puct => puct_score(config, stats, sqrt_sibling_visits),
        SelectionFormula::Ucb1Tuned => ucb1_tuned_score(config, stats, parent_visits),
    };

    if config.use_progressive_bias {
        score += config.bias_constant * move_score(mv, &config.heuristic_weights) as f64
            / (1.0 + stats.visits as f64);
    }

    score
}

fn puct_score(config: &PolicyConfig, stats: &ChildStats, sqrt_sibling_visits: f64) -> f64 {
    let exploration =
        config.c_puct * stats.prior as f64 * sqrt_sibling_visits / (1.0 + stats.visits as f64);

    stats.mean_value() + exploration
}

fn ucb1_tuned_score(config: &PolicyConfig, stats: &ChildStats, parent_visits: u64) -> f64 {
    let n_parent = parent_visits.max(1) as f64;
    let n_child = stats.visits as f64;

    // A crude running-variance proxy: `Q(1 - Q)`, the variance of a
    // Bernoulli variable with mean `Q`, bounded into `[0, 1/4]` exactly
    // like the textbook UCB1-Tuned bound expects.
    let q = stats.mean_value().clamp(0.0, 1.0);
    let variance_estimate = q * (1.0 - q);

    let v = variance_estimate + (2.0 * n_parent.ln() / n_child).sqrt();
    let bound = (n_parent.ln() / n_child * v.min(0.25)).sqrt();

    stats.mean_value() + config.c_ucb * bound
}

/// Re-normalizes a CNN's policy head output (spec §4.6/§6) over the moves
/// actually legal at this node: gathers `policy[move_to_policy_index(mv)]`
/// for each of `moves`, then rescales so they sum to `1`. Falls back to a
/// uniform distribution when the gathered mass is too small to divide by
/// safely -- a pathological oracle (or an untrained one) should never hand
/// the search a `NaN`.
pub fn renormalize_priors(policy: &[f32], moves: &[Move], to_move: Color) -> Vec<f32> {
    let gathered: Vec<f32> =
        moves.iter().map(|mv| policy[move_to_policy_index(mv, to_move)].max(0.0)).collect();
    let total: f32 = gathered.iter().sum();

    if total > 1e-6 {
        gathered.iter().map(|&p| p / total).collect()
    } else {
        vec![1.0 / moves.len() as f32; moves.len()]
    }
}

/// Picks the index of the best-scoring child among `candidates`, breaking
/// ties by first occurrence (spec §4.5). `Iterator::max_by_key` instead
/// keeps the *last* of equal maxima, so the scan is done by hand.
pub fn select_best<I>(candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut best: Option<(usize, f64)> = None;

    for (index, score) in candidates {
        match best {
            Some((_, best_score)) if OrderedFloat(score) <= OrderedFloat(best_score) => {}
            _ => best = Some((index, score)),
        }
    }

    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dama_board::Square;

    fn simple_move() -> Move {
        Move::simple(Square::new(0), Square::new(9), false)
    }

    #[test]
    fn unvisited_child_gets_first_play_urgency() {
        let config = PolicyConfig::default();
        let stats = ChildStats { visits: 0, score_sum: 0.0, prior: 0.2 };
        let score = score_child(&config, &stats, &simple_move(), 10, 3.16);

        assert_eq!(score, config.first_play_urgency);
    }

    #[test]
    fn puct_rewards_higher_prior() {
        let config = PolicyConfig { formula: SelectionFormula::Puct, ..PolicyConfig::default() };
        let low_prior = ChildStats { visits: 4, score_sum: 2.0, prior: 0.1 };
        let high_prior = ChildStats { visits: 4, score_sum: 2.0, prior: 0.5 };

        let low_score = score_child(&config, &low_prior, &simple_move(), 16, 4.0);
        let high_score = score_child(&config, &high_prior, &simple_move(), 16, 4.0);

        assert!(high_score > low_score);
    }

    #[test]
    fn progressive_bias_favors_captures() {
        let mut config = PolicyConfig::default();
        config.use_progressive_bias = true;

        let stats = ChildStats { visits: 4, score_sum: 2.0, prior: 0.25 };
        let simple = simple_move();
        let capture = Move::capture(
            &[Square::new(0), Square::new(18)],
            &[Square::new(9)],
            false,
        );

        let simple_score = score_child(&config, &stats, &simple, 16, 4.0);
        let capture_score = score_child(&config, &stats, &capture, 16, 4.0);

        assert!(capture_score > simple_score);
    }

    #[test]
    fn select_best_breaks_ties_by_first_occurrence() {
        let candidates = vec![(0, 1.0), (1, 1.0), (2, 0.5)];
        assert_eq!(select_best(candidates), Some(0));
    }

    #[test]
    fn renormalize_priors_rescales_gathered_mass_to_one() {
        let mut policy = vec![0.0f32; dama_board::POLICY_DIMENSION];
        let a = Move::simple(Square::new(0), Square::new(9), false);
        let b = Move::simple(Square::new(16), Square::new(25), false);
        let index_a = dama_board::move_to_policy_index(&a, Color::White);
        policy[index_a] = 0.8;

        let moves = vec![a, b];
        let priors = renormalize_priors(&policy, &moves, Color::White);

        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn renormalize_priors_falls_back_to_uniform_when_gathered_mass_is_negligible() {
        let policy = vec![0.0f32; 512];
        let moves = vec![
            Move::simple(Square::new(0), Square::new(9), false),
            Move::simple(Square::new(16), Square::new(25), false),
        ];

        let priors = renormalize_priors(&policy, &moves, Color::White);
        assert_eq!(priors, vec![0.5, 0.5]);
    }
}
