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

//! Static move/position heuristics (spec §6's `heuristic_weights`), shared
//! by `dama_mcts`'s progressive bias and simulation-path rollout so that
//! both consumers score a move the same way.

use crate::bitboard::BitboardExt;
use crate::color::Color;
use crate::mv::Move;
use crate::square::Square;
use crate::state::GameState;

/// The eight weights of spec §6, in the order they appear there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicWeights {
    pub capture: f32,
    pub promotion: f32,
    pub advance: f32,
    pub center: f32,
    pub edge: f32,
    pub base: f32,
    pub threat: f32,
    pub lady_activity: f32,
}

impl Default for HeuristicWeights {
    /// Conservative defaults: captures and promotion dominate, lady
    /// mobility and advancement matter less, center/edge/base are tie
    /// breakers.
    fn default() -> HeuristicWeights {
        HeuristicWeights {
            capture: 1.00,
            promotion: 0.80,
            advance: 0.15,
            center: 0.10,
            edge: -0.05,
            base: 0.05,
            threat: 0.20,
            lady_activity: 0.10,
        }
    }
}

fn is_center(square: Square) -> bool {
    (2..=5).contains(&square.row()) && (2..=5).contains(&square.col())
}

fn is_edge(square: Square) -> bool {
    square.col() == 0 || square.col() == 7
}

fn is_base_row(square: Square, color: Color) -> bool {
    match color {
        Color::White => square.row() == 0,
        Color::Black => square.row() == 7,
    }
}

/// How many ranks closer to promotion `square` is for `color`, normalized
/// to `[0, 1]`.
fn advancement(square: Square, color: Color) -> f32 {
    let row = square.row() as f32;
    match color {
        Color::White => row / 7.0,
        Color::Black => (7.0 - row) / 7.0,
    }
}

/// Whether any enemy piece could immediately capture the piece now
/// standing on `square`, used by the `threat` term. Cheaply approximated:
/// true if an enemy piece sits one diagonal step away with the landing
/// square on the far side empty.
fn is_hanging(state: &GameState, square: Square, color: Color) -> bool {
    let enemy = state.pieces_of(color.opposite());
    let occupied = state.occupied();

    for (dr, dc) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        let row = square.row() as i8;
        let col = square.col() as i8;
        let over = match Square::from_rc(row - dr, col - dc) {
            Some(sq) => sq,
            None => continue,
        };
        let land = match Square::from_rc(row + dr, col + dc) {
            Some(sq) => sq,
            None => continue,
        };

        if enemy.has(over) && !occupied.has(land) {
            return true;
        }
    }

    false
}

/// Scores `state` from `color`'s perspective: material plus the positional
/// terms of `weights`. Used as the simulation-path rollout's terminal
/// heuristic and, via `move_score`, as the progressive-bias term of the
/// tree policy.
pub fn evaluate(state: &GameState, color: Color, weights: &HeuristicWeights) -> f32 {
    let mut score = 0.0;

    for (side, sign) in [(color, 1.0f32), (color.opposite(), -1.0f32)] {
        let pawns = match side {
            Color::White => state.white_pawns,
            Color::Black => state.black_pawns,
        };
        let ladies = match side {
            Color::White => state.white_ladies,
            Color::Black => state.black_ladies,
        };

        for square in pawns.squares() {
            score += sign * weights.advance * advancement(square, side);
            score += sign * weights.center * is_center(square) as u8 as f32;
            score += sign * weights.edge * is_edge(square) as u8 as f32;
            score += sign * weights.base * is_base_row(square, side) as u8 as f32;
            if is_hanging(state, square, side) {
                score -= sign * weights.threat;
            }
        }

        for square in ladies.squares() {
            score += sign * weights.lady_activity;
            score += sign * weights.center * is_center(square) as u8 as f32;
            if is_hanging(state, square, side) {
                score -= sign * weights.threat;
            }
        }
    }

    score
}

/// Scores a single candidate `mv` played from `state` (before application),
/// used by the tree policy's progressive-bias term: rewards captures and
/// promotions directly instead of waiting for them to show up in a
/// position scan.
pub fn move_score(mv: &Move, weights: &HeuristicWeights) -> f32 {
    let mut score = 0.0;

    if mv.is_capture() {
        score += weights.capture * mv.length() as f32;
        score += weights.capture * mv.captured_ladies_count as f32;
    }

    // A pawn (never a lady, `is_lady_move == false`) can only ever land on
    // rank 0 or rank 7 by promoting -- White advances toward rank 7 and
    // Black toward rank 0, so neither ever merely passes through the
    // other's back rank. No need to know which color is moving.
    let lands_on_a_back_rank = mv.to().row() == 0 || mv.to().row() == 7;
    if !mv.is_lady_move && lands_on_a_back_rank {
        score += weights.promotion;
    }

    score
}
