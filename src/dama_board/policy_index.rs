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

//! The canonical move-to-index mapping of spec §6: the board is flipped so
//! that the side to move always "moves up" before indexing, so the CNN
//! oracle only ever has to learn one direction of play. A capture chain of
//! more than one jump is indexed by its *first* jump only -- the chain's
//! remaining length is recovered from `Move::priority_rank` during
//! expansion, not from the policy vector, which only needs to rank
//! candidate first steps against each other.

use crate::color::Color;
use crate::mv::Move;
use crate::square::Square;

/// Four simple-move direction codes (`NE, NW, SE, SW`, matching
/// `movegen::DIRECTIONS`' order) followed by the same four for a capture's
/// first jump.
const DIRECTIONS_PER_SQUARE: usize = 8;

/// `64 squares * 8 direction codes`.
pub const POLICY_DIMENSION: usize = 64 * DIRECTIONS_PER_SQUARE;

/// Mirrors `square` top-to-bottom, leaving the column untouched -- the
/// "flip so the side to move moves up" transform of spec §6, applied only
/// to Black so that both colors share one canonical orientation.
fn canonical_square(square: Square, to_move: Color) -> Square {
    match to_move {
        Color::White => square,
        Color::Black => Square::from_rc(7 - square.row() as i8, square.col() as i8)
            .expect("mirrored row stays on the board"),
    }
}

fn direction_code(from: Square, over_or_to: Square, to_move: Color) -> usize {
    let dr = over_or_to.row() as i8 - from.row() as i8;
    let dc = over_or_to.col() as i8 - from.col() as i8;

    // Canonical orientation flips the row delta for Black to match
    // `canonical_square`'s mirror.
    let dr = match to_move {
        Color::White => dr.signum(),
        Color::Black => -dr.signum(),
    };
    let dc = dc.signum();

    match (dr, dc) {
        (1, 1) => 0,  // NE
        (1, -1) => 1, // NW
        (-1, 1) => 2, // SE
        (-1, -1) => 3, // SW
        _ => unreachable!("diagonal move must step exactly one rank and file"),
    }
}

/// Maps `mv`, played by `to_move`, to its index into a `POLICY_DIMENSION`-
/// length policy vector: `index = from_square_canonical * 8 + direction_code`,
/// with simple moves and captures occupying disjoint direction-code ranges
/// (spec §6).
pub fn move_to_policy_index(mv: &Move, to_move: Color) -> usize {
    let from = canonical_square(mv.from(), to_move);
    let path = mv.path();
    let next = path[1];

    let mut code = direction_code(mv.from(), next, to_move);
    if mv.is_capture() {
        code += 4;
    }

    from.index() as usize * DIRECTIONS_PER_SQUARE + code
}
