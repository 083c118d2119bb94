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

//! Shared scaffolding for literal-position scenarios: algebraic square
//! notation and an empty board to place pieces on one at a time.

use dama_board::{BitboardExt, Color, GameState, Square};

/// `sq('C', 3)` is the square Italian-checkers notation calls C3 --
/// file `'A'..='H'`, rank `1..=8`, matching this crate's `A1 == 0`
/// encoding.
pub fn sq(file: char, rank: u8) -> Square {
    let col = (file as u8) - b'A';
    let row = rank - 1;
    Square::from_rc(row as i8, col as i8).expect("square out of range")
}

/// A board with nothing on it and the given side to move, ready to have
/// individual pieces placed by the caller.
pub fn empty_board(side_to_move: Color) -> GameState {
    let mut state = GameState::new();
    state.white_pawns = 0;
    state.black_pawns = 0;
    state.white_ladies = 0;
    state.black_ladies = 0;
    state.side_to_move = side_to_move;
    state.plies_since_capture = 0;
    state.hash = state.recompute_hash();
    state
}

pub fn place(state: &mut GameState, color: Color, is_lady: bool, square: Square) {
    let board = match (color, is_lady) {
        (Color::White, false) => &mut state.white_pawns,
        (Color::White, true) => &mut state.white_ladies,
        (Color::Black, false) => &mut state.black_pawns,
        (Color::Black, true) => &mut state.black_ladies,
    };
    *board = board.with(square);
    state.hash = state.recompute_hash();
}
