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

//! The simulation-path leaf evaluation of spec §4.6: an ε-greedy rollout
//! from a leaf that biases toward captures, promotions, and safe moves,
//! with an optional decaying reward so that a rollout which takes many
//! plies to resolve counts for less than one that resolves quickly.

use rand::Rng;

use dama_board::heuristics::{evaluate, move_score, HeuristicWeights};
use dama_board::{generate, Color, GameState, Outcome};

/// Rollouts never run past this many plies; a position that hasn't
/// settled by then is scored by the static heuristic instead of played
/// out further.
const MAX_ROLLOUT_PLIES: u32 = 120;

/// Runs one rollout from `state`, returning a value in `[0, 1]` from
/// `state.side_to_move`'s own perspective -- the same convention
/// `backpropagate` expects for a leaf's initial value.
///
/// `epsilon = 1.0` is pure random play; `epsilon = 0.0` always plays the
/// heuristically-best candidate (`dama_board::heuristics::move_score`);
/// values in between sample randomly with probability `epsilon` and play
/// the heuristic move otherwise, per spec §4.6.
pub fn rollout(
    state: &GameState,
    epsilon: f32,
    use_decaying_reward: bool,
    decay_factor: f32,
    draw_score: f32,
    weights: &HeuristicWeights,
    rng: &mut impl Rng,
) -> f32 {
    let leaf_color = state.side_to_move;
    let mut current = state.clone();
    let mut depth = 0u32;

    let outcome = loop {
        let outcome = current.outcome();
        if outcome != Outcome::Ongoing {
            break outcome;
        }
        if depth >= MAX_ROLLOUT_PLIES {
            break Outcome::Ongoing;
        }

        let moves = generate(&current);
        let mv = if rng.gen::<f32>() < epsilon {
            let index = rng.gen_range(0..moves.len());
            &moves[index]
        } else {
            moves
                .iter()
                .max_by(|a, b| {
                    move_score(a, weights)
                        .partial_cmp(&move_score(b, weights))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .expect("non-terminal position always has a move")
        };

        current = current.apply_move(mv);
        depth += 1;
    };

    let raw_value = match outcome {
        Outcome::WhiteWins => win_value(leaf_color, Color::White),
        Outcome::BlackWins => win_value(leaf_color, Color::Black),
        Outcome::Draw => draw_score,
        Outcome::Ongoing => {
            // Depth cutoff: fall back to the static heuristic, squashed
            // into [0, 1] the same way a tanh-based value head would be.
            let score = evaluate(&current, leaf_color, weights).tanh();
            (score + 1.0) / 2.0
        }
    };

    if use_decaying_reward {
        draw_score + (raw_value - draw_score) * decay_factor.powi(depth as i32)
    } else {
        raw_value
    }
}

fn win_value(leaf_color: Color, winner: Color) -> f32 {
    if leaf_color == winner {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dama_board::{BitboardExt, Square};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn empty_state(to_move: Color) -> GameState {
        let mut state = GameState::new();
        state.white_pawns = 0;
        state.black_pawns = 0;
        state.white_ladies = 0;
        state.black_ladies = 0;
        state.side_to_move = to_move;
        state.hash = state.recompute_hash();
        state
    }

    #[test]
    fn terminal_loss_scores_zero_for_the_side_to_move() {
        // White to move, no pieces at all: generate() is empty, an
        // immediate loss for White.
        let state = empty_state(Color::White);
        let mut rng = SmallRng::seed_from_u64(1);

        let value = rollout(&state, 1.0, false, 0.9, 0.5, &HeuristicWeights::default(), &mut rng);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn draw_by_plies_scores_the_configured_draw_score() {
        let mut state = GameState::new();
        state.plies_since_capture = dama_board::MAX_PLIES_WITHOUT_CAPTURE;
        let mut rng = SmallRng::seed_from_u64(2);

        let value = rollout(&state, 1.0, false, 0.9, 0.42, &HeuristicWeights::default(), &mut rng);
        assert_eq!(value, 0.42);
    }

    #[test]
    fn decaying_reward_pulls_long_rollouts_toward_the_draw_score() {
        let mut state = empty_state(Color::White);
        state.white_pawns = state.white_pawns.with(Square::new(0));
        state.black_pawns = state.black_pawns.with(Square::new(57));
        state.hash = state.recompute_hash();

        let mut rng = SmallRng::seed_from_u64(3);
        let undecayed = rollout(&state, 1.0, false, 0.9, 0.5, &HeuristicWeights::default(), &mut rng.clone());
        let decayed = rollout(&state, 1.0, true, 0.9, 0.5, &HeuristicWeights::default(), &mut rng);

        assert!((decayed - 0.5).abs() <= (undecayed - 0.5).abs() + 1e-6);
    }
}
