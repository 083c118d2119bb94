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

//! The move generator (spec §4.1): a bitboard engine implementing the
//! Italian ruleset, including recursive capture-chain enumeration and the
//! priority filter that selects among mandatory captures.

use crate::bitboard::{Bitboard, BitboardExt};
use crate::color::Color;
use crate::mv::Move;
use crate::square::Square;
use crate::state::GameState;

/// The generator never returns more than this many moves from one
/// position; going over is an engine bug, not a reachable game state.
pub const MAX_MOVES: usize = 64;

pub type MoveList = Vec<Move>;

/// The four diagonal directions, as `(row_delta, col_delta)`. Index order
/// is `NE, NW, SE, SW` and is referenced by that order throughout this
/// module and by the move tables below.
const DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

struct MoveTables {
    /// `one_step[square][dir]`: the square one diagonal step away, or
    /// `None` if that would leave the board. Doubles as the "jump-over"
    /// square for a capture in that direction.
    one_step: [[Option<Square>; 4]; 64],

    /// `landing[square][dir]`: the square two diagonal steps away (the
    /// landing square of a capture in that direction), or `None` if that
    /// would leave the board.
    landing: [[Option<Square>; 4]; 64],
}

fn build_tables() -> MoveTables {
    let mut one_step = [[None; 4]; 64];
    let mut landing = [[None; 4]; 64];

    for index in 0..64u8 {
        let square = Square::new(index);
        let row = square.row() as i8;
        let col = square.col() as i8;

        for (dir, &(dr, dc)) in DIRECTIONS.iter().enumerate() {
            one_step[index as usize][dir] = Square::from_rc(row + dr, col + dc);
            landing[index as usize][dir] = Square::from_rc(row + 2 * dr, col + 2 * dc);
        }
    }

    MoveTables { one_step, landing }
}

lazy_static! {
    static ref TABLES: MoveTables = build_tables();
}

/// Returns the two forward direction indices (into `DIRECTIONS`) for a
/// pawn of the given color. Italian draughts men may not capture
/// backwards, so this restriction applies uniformly to simple moves and
/// to every jump in a capture chain.
fn pawn_directions(color: Color) -> [usize; 2] {
    match color {
        Color::White => [0, 1], // NE, NW (row increasing)
        Color::Black => [2, 3], // SE, SW (row decreasing)
    }
}

const LADY_DIRECTIONS: [usize; 4] = [0, 1, 2, 3];

/// Working state threaded through the capture-chain DFS: the bitboards as
/// they would read *after* every capture made so far along this branch,
/// so that a piece cannot jump over something it already captured, or
/// land where a previous landing already sits.
struct CaptureSearch<'a> {
    state: &'a GameState,
    mover_color: Color,
    is_lady: bool,
    directions: Vec<usize>,
    out: &'a mut MoveList,
}

/// Enumerates every capture chain starting from `from`, appending them to
/// `out`. `remaining_enemy`/`remaining_occupied` reflect the board with
/// every capture made so far along this path removed/added.
#[allow(clippy::too_many_arguments)]
fn search_captures(
    search: &mut CaptureSearch,
    from: Square,
    path: &mut Vec<Square>,
    captured: &mut Vec<Square>,
    captured_is_lady: &mut Vec<bool>,
    remaining_enemy: Bitboard,
    remaining_occupied: Bitboard,
) {
    let mut found_continuation = false;
    let directions = search.directions.clone();

    for &dir in &directions {
        let over = match TABLES.one_step[from.index() as usize][dir] {
            Some(sq) => sq,
            None => continue,
        };
        let land = match TABLES.landing[from.index() as usize][dir] {
            Some(sq) => sq,
            None => continue,
        };

        if !remaining_enemy.has(over) || remaining_occupied.has(land) {
            continue;
        }

        let (_, over_is_lady) = search.state.at(over).expect("jump-over square must hold a piece");

        // Italian rule: a pawn may never capture a lady.
        if over_is_lady && !search.is_lady {
            continue;
        }

        found_continuation = true;

        let next_enemy = remaining_enemy.without(over);
        let next_occupied = remaining_occupied.without(over).without(from).with(land);

        path.push(land);
        captured.push(over);
        captured_is_lady.push(over_is_lady);

        // Promotion freezes the chain immediately on arrival.
        let lands_on_promotion_row = !search.is_lady
            && land.row() == search.mover_color.promotion_row();

        if lands_on_promotion_row {
            emit_chain(search, path, captured, captured_is_lady);
        } else {
            search_captures(search, land, path, captured, captured_is_lady, next_enemy, next_occupied);
        }

        path.pop();
        captured.pop();
        captured_is_lady.pop();
    }

    if !found_continuation && !captured.is_empty() {
        emit_chain(search, path, captured, captured_is_lady);
    }
}

fn emit_chain(
    search: &mut CaptureSearch,
    path: &[Square],
    captured: &[Square],
    captured_is_lady: &[bool],
) {
    // `path` already starts with the origin square (pushed by the caller
    // before the first call into `search_captures`), so it is exactly the
    // `path[0..=length]` array `Move::capture` expects.
    let mut mv = Move::capture(path, captured, search.is_lady);
    mv.captured_ladies_count = captured_is_lady.iter().filter(|&&lady| lady).count() as u8;
    mv.first_captured_is_lady = captured_is_lady[0];

    debug_assert!(mv.captures_no_duplicate_squares());
    search.out.push(mv);
}

/// Computes every legal capture chain available to `color` from `state`,
/// without applying the Italian priority filter.
fn generate_all_captures(state: &GameState, color: Color) -> MoveList {
    let mut out = Vec::new();
    let enemy = state.pieces_of(color.opposite());
    let occupied = state.occupied();

    let pawns = match color {
        Color::White => state.white_pawns,
        Color::Black => state.black_pawns,
    };
    let ladies = match color {
        Color::White => state.white_ladies,
        Color::Black => state.black_ladies,
    };

    for from in pawns.squares() {
        let mut search = CaptureSearch {
            state,
            mover_color: color,
            is_lady: false,
            directions: pawn_directions(color).to_vec(),
            out: &mut out,
        };

        // The path begins with `from` itself so that `emit_chain` can
        // reconstruct the full `path[0..=length]` array.
        let mut path = vec![from];
        let mut captured = Vec::new();
        let mut captured_is_lady = Vec::new();

        search_captures(&mut search, from, &mut path, &mut captured, &mut captured_is_lady, enemy, occupied);
    }

    for from in ladies.squares() {
        let mut search = CaptureSearch {
            state,
            mover_color: color,
            is_lady: true,
            directions: LADY_DIRECTIONS.to_vec(),
            out: &mut out,
        };

        let mut path = vec![from];
        let mut captured = Vec::new();
        let mut captured_is_lady = Vec::new();

        search_captures(&mut search, from, &mut path, &mut captured, &mut captured_is_lady, enemy, occupied);
    }

    out
}

/// Applies the Italian priority filter (spec §4.1): ranks every capture
/// by `(length, is_lady_move, captured_ladies_count, first_captured_is_lady)`
/// and retains only the moves tied for the maximum rank.
fn apply_priority_filter(mut captures: MoveList) -> MoveList {
    let best_rank = captures.iter().map(Move::priority_rank).max();

    if let Some(best_rank) = best_rank {
        captures.retain(|mv| mv.priority_rank() == best_rank);
    }

    captures
}

/// Enumerates every simple (non-capturing) diagonal move for `color`.
fn generate_simple_moves(state: &GameState, color: Color) -> MoveList {
    let mut out = Vec::new();
    let occupied = state.occupied();

    let pawns = match color {
        Color::White => state.white_pawns,
        Color::Black => state.black_pawns,
    };
    let ladies = match color {
        Color::White => state.white_ladies,
        Color::Black => state.black_ladies,
    };

    for from in pawns.squares() {
        for &dir in &pawn_directions(color) {
            if let Some(to) = TABLES.one_step[from.index() as usize][dir] {
                if !occupied.has(to) {
                    out.push(Move::simple(from, to, false));
                }
            }
        }
    }

    for from in ladies.squares() {
        for &dir in &LADY_DIRECTIONS {
            if let Some(to) = TABLES.one_step[from.index() as usize][dir] {
                if !occupied.has(to) {
                    out.push(Move::simple(from, to, true));
                }
            }
        }
    }

    out
}

/// Generates the legal moves for the side to move (spec §4.1):
///
/// 1. Compute all capture chains for all own pieces.
/// 2. If any capture exists, discard non-captures and keep only the moves
///    tied for maximum Italian priority; otherwise enumerate all simple
///    diagonal moves.
pub fn generate(state: &GameState) -> MoveList {
    let color = state.side_to_move;
    let captures = generate_all_captures(state, color);

    let moves = if captures.is_empty() {
        generate_simple_moves(state, color)
    } else {
        apply_priority_filter(captures)
    };

    debug_assert!(moves.len() <= MAX_MOVES, "move list overflow: {} moves", moves.len());
    moves
}

/// Counts leaf positions reachable in exactly `depth` plies from `state`,
/// applying every legal move at each level. Standard move-generator
/// cross-check (a "perft"); used only by tests to sanity-check move counts
/// at depths the literal scenarios of this module don't reach.
#[cfg(test)]
fn count_leaf_positions(state: &GameState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate(state);
    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .iter()
        .map(|mv| count_leaf_positions(&state.apply_move(mv), depth - 1))
        .sum()
}
