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

//! The literal board-position scenarios: clear boards with a handful of
//! pieces placed by hand, each checked against one exact expected move
//! set. These exercise the Italian mandatory-capture priority filter
//! end to end, across `dama_board` alone -- no search involved.

mod common;

use common::{empty_board, place, sq};
use dama_board::{generate, Color, Move};

fn contains_simple(moves: &[Move], from: dama_board::Square, to: dama_board::Square) -> bool {
    moves.iter().any(|mv| !mv.is_capture() && mv.from() == from && mv.to() == to)
}

#[test]
fn simple_move_blocked_by_a_friendly_piece() {
    let mut state = empty_board(Color::White);
    place(&mut state, Color::White, false, sq('C', 3));
    place(&mut state, Color::White, false, sq('B', 4));

    let moves = generate(&state);

    assert!(contains_simple(&moves, sq('C', 3), sq('D', 4)));
    assert!(!moves.iter().any(|mv| mv.from() == sq('C', 3) && mv.to() == sq('B', 4)));
    assert!(contains_simple(&moves, sq('B', 4), sq('A', 5)));
    assert!(contains_simple(&moves, sq('B', 4), sq('C', 5)));
    assert_eq!(moves.len(), 3);
}

#[test]
fn mandatory_single_capture() {
    let mut state = empty_board(Color::White);
    place(&mut state, Color::White, false, sq('C', 3));
    place(&mut state, Color::Black, false, sq('D', 4));

    let moves = generate(&state);

    assert_eq!(moves.len(), 1);
    let mv = &moves[0];
    assert_eq!(mv.length(), 1);
    assert_eq!(mv.to(), sq('E', 5));
    assert_eq!(mv.captured(), &[sq('D', 4)]);
}

#[test]
fn pawn_cannot_capture_a_lady() {
    let mut state = empty_board(Color::White);
    place(&mut state, Color::White, false, sq('C', 3));
    place(&mut state, Color::Black, true, sq('D', 4));

    let moves = generate(&state);

    assert_eq!(moves.len(), 1);
    let mv = &moves[0];
    assert!(!mv.is_capture());
    assert_eq!(mv.from(), sq('C', 3));
    assert_eq!(mv.to(), sq('B', 4));
}

#[test]
fn promotion_freezes_the_capture_chain() {
    let mut state = empty_board(Color::White);
    place(&mut state, Color::White, false, sq('F', 6));
    place(&mut state, Color::Black, false, sq('G', 7));

    let moves = generate(&state);

    assert_eq!(moves.len(), 1);
    let mv = &moves[0];
    assert_eq!(mv.length(), 1);
    assert_eq!(mv.to(), sq('H', 8));
    assert_eq!(mv.captured(), &[sq('G', 7)]);
}

#[test]
fn chain_length_beats_a_shorter_capture() {
    let mut state = empty_board(Color::White);
    place(&mut state, Color::White, false, sq('A', 1));
    place(&mut state, Color::Black, false, sq('B', 2));
    place(&mut state, Color::Black, false, sq('D', 4));

    let moves = generate(&state);

    assert_eq!(moves.len(), 1);
    let mv = &moves[0];
    assert_eq!(mv.length(), 2);
    assert_eq!(mv.to(), sq('E', 5));
    assert_eq!(mv.captured(), &[sq('B', 2), sq('D', 4)]);
}

#[test]
fn capturing_a_lady_outranks_capturing_a_pawn() {
    let mut state = empty_board(Color::White);
    place(&mut state, Color::White, true, sq('E', 3));
    place(&mut state, Color::Black, false, sq('F', 4));
    place(&mut state, Color::Black, true, sq('D', 4));

    let moves = generate(&state);

    assert_eq!(moves.len(), 1);
    let mv = &moves[0];
    assert_eq!(mv.length(), 1);
    assert_eq!(mv.to(), sq('C', 5));
    assert_eq!(mv.captured(), &[sq('D', 4)]);
    assert!(mv.first_captured_is_lady);
}
