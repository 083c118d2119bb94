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

use std::fmt;

use crate::bitboard::{Bitboard, BitboardExt};
use crate::color::Color;
use crate::movegen::generate;
use crate::mv::Move;
use crate::square::Square;
use crate::zobrist::{black_to_move_key, zobrist_key, LADY, PAWN};

/// The number of plies without a capture after which a position is ruled
/// a draw (spec §4.1). Per DESIGN.md's resolution of the corresponding
/// Open Question, this counter advances on every non-capturing ply
/// regardless of whether a lady is on the board.
pub const MAX_PLIES_WITHOUT_CAPTURE: u16 = 40;

/// The outcome of a finished (or still-ongoing) game, spec §6's four wire
/// codes expressed as a real enum instead of bare integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl Outcome {
    /// The wire-compatible integer code from spec §6.
    pub fn code(self) -> i8 {
        match self {
            Outcome::WhiteWins => 1,
            Outcome::BlackWins => 2,
            Outcome::Draw => 0,
            Outcome::Ongoing => -1,
        }
    }
}

/// A complete Italian checkers position (spec §3): four bitboards, whose
/// turn it is, the 40-move counter, and an incrementally-maintained
/// Zobrist hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub white_pawns: Bitboard,
    pub black_pawns: Bitboard,
    pub white_ladies: Bitboard,
    pub black_ladies: Bitboard,
    pub side_to_move: Color,
    pub plies_since_capture: u16,
    pub hash: u64,
}

impl GameState {
    /// The standard Italian checkers starting position (spec §6, bit-exact
    /// starting bitboards).
    pub fn new() -> GameState {
        let white_pawns: Bitboard = 0x0000_0000_00AA_55AA;
        let black_pawns: Bitboard = 0x55AA_5500_0000_0000;

        let mut state = GameState {
            white_pawns,
            black_pawns,
            white_ladies: 0,
            black_ladies: 0,
            side_to_move: Color::White,
            plies_since_capture: 0,
            hash: 0,
        };
        state.hash = state.recompute_hash();
        state
    }

    /// Returns the bitboard of all pieces belonging to `color`.
    pub fn pieces_of(&self, color: Color) -> Bitboard {
        match color {
            Color::White => self.white_pawns | self.white_ladies,
            Color::Black => self.black_pawns | self.black_ladies,
        }
    }

    /// Returns the bitboard of every occupied square.
    pub fn occupied(&self) -> Bitboard {
        self.white_pawns | self.black_pawns | self.white_ladies | self.black_ladies
    }

    /// Returns `(color, is_lady)` for the piece standing on `square`, if
    /// any.
    pub fn at(&self, square: Square) -> Option<(Color, bool)> {
        if self.white_pawns.has(square) {
            Some((Color::White, false))
        } else if self.white_ladies.has(square) {
            Some((Color::White, true))
        } else if self.black_pawns.has(square) {
            Some((Color::Black, false))
        } else if self.black_ladies.has(square) {
            Some((Color::Black, true))
        } else {
            None
        }
    }

    /// Recomputes the Zobrist hash from scratch (spec invariant I2 is
    /// checked against this in tests).
    pub fn recompute_hash(&self) -> u64 {
        let mut hash = 0u64;

        for square in self.white_pawns.squares() {
            hash ^= zobrist_key(Color::White, PAWN, square);
        }
        for square in self.white_ladies.squares() {
            hash ^= zobrist_key(Color::White, LADY, square);
        }
        for square in self.black_pawns.squares() {
            hash ^= zobrist_key(Color::Black, PAWN, square);
        }
        for square in self.black_ladies.squares() {
            hash ^= zobrist_key(Color::Black, LADY, square);
        }

        if self.side_to_move == Color::Black {
            hash ^= black_to_move_key();
        }

        hash
    }

    /// Checks the three invariants of spec §3: the bitboards are pairwise
    /// disjoint, no pawn sits on its own promotion rank, and the hash
    /// matches a from-scratch recomputation.
    pub fn check_invariants(&self) {
        debug_assert_eq!(self.white_pawns & self.black_pawns, 0);
        debug_assert_eq!(self.white_pawns & self.white_ladies, 0);
        debug_assert_eq!(self.white_pawns & self.black_ladies, 0);
        debug_assert_eq!(self.black_pawns & self.white_ladies, 0);
        debug_assert_eq!(self.black_pawns & self.black_ladies, 0);
        debug_assert_eq!(self.white_ladies & self.black_ladies, 0);

        let white_promotion_row = Color::White.promotion_row();
        let black_promotion_row = Color::Black.promotion_row();
        for square in self.white_pawns.squares() {
            debug_assert_ne!(square.row(), white_promotion_row);
        }
        for square in self.black_pawns.squares() {
            debug_assert_ne!(square.row(), black_promotion_row);
        }

        debug_assert_eq!(self.hash, self.recompute_hash());
    }

    /// Applies `mv` (assumed legal, as returned by `generate`) for the
    /// side to move, returning the resulting state. The hash is updated
    /// incrementally per spec §4.2 rather than recomputed from scratch.
    pub fn apply_move(&self, mv: &Move) -> GameState {
        let color = self.side_to_move;
        let from = mv.from();
        let to = mv.to();
        let is_lady = self.at(from).map(|(_, lady)| lady).unwrap_or(mv.is_lady_move);

        let mut next = self.clone();
        let piece_kind_before = if is_lady { LADY } else { PAWN };

        // remove the mover from its source square
        next.set_piece(color, is_lady, from, false);
        next.hash ^= zobrist_key(color, piece_kind_before, from);

        // remove every captured piece
        for &captured_square in mv.captured() {
            let (captured_color, captured_is_lady) = self.at(captured_square)
                .expect("captured square must have held a piece");
            let captured_kind = if captured_is_lady { LADY } else { PAWN };

            next.set_piece(captured_color, captured_is_lady, captured_square, false);
            next.hash ^= zobrist_key(captured_color, captured_kind, captured_square);
        }

        // place the mover at its destination, promoting on arrival if it
        // lands on its promotion rank (spec §4.1: "promotion is immediate
        // on arrival")
        let promotes = !is_lady && to.row() == color.promotion_row();
        let is_lady_after = is_lady || promotes;
        let piece_kind_after = if is_lady_after { LADY } else { PAWN };

        next.set_piece(color, is_lady_after, to, true);
        next.hash ^= zobrist_key(color, piece_kind_after, to);

        // side-to-move flips every ply
        next.side_to_move = color.opposite();
        next.hash ^= black_to_move_key();

        // the 40-move counter resets on any capture, otherwise advances
        if mv.is_capture() {
            next.plies_since_capture = 0;
        } else {
            next.plies_since_capture = self.plies_since_capture + 1;
        }

        next.check_invariants();
        next
    }

    fn set_piece(&mut self, color: Color, is_lady: bool, square: Square, present: bool) {
        let board = match (color, is_lady) {
            (Color::White, false) => &mut self.white_pawns,
            (Color::White, true) => &mut self.white_ladies,
            (Color::Black, false) => &mut self.black_pawns,
            (Color::Black, true) => &mut self.black_ladies,
        };

        *board = if present {
            board.with(square)
        } else {
            board.without(square)
        };
    }

    /// Returns true if `plies_since_capture` has crossed the draw
    /// threshold.
    pub fn is_draw_by_plies(&self) -> bool {
        self.plies_since_capture >= MAX_PLIES_WITHOUT_CAPTURE
    }

    /// The wire-compatible outcome of spec §6: a side with no legal moves
    /// loses immediately (the defining rule of Italian checkers, shared
    /// with international draughts), independent of material count.
    pub fn outcome(&self) -> Outcome {
        if self.is_draw_by_plies() {
            return Outcome::Draw;
        }

        if generate(self).is_empty() {
            return match self.side_to_move {
                Color::White => Outcome::BlackWins,
                Color::Black => Outcome::WhiteWins,
            };
        }

        Outcome::Ongoing
    }
}

impl Default for GameState {
    fn default() -> GameState {
        GameState::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in (0..8).rev() {
            for col in 0..8 {
                let square = Square::from_rc(row, col).unwrap();
                let ch = match self.at(square) {
                    Some((Color::White, false)) => 'w',
                    Some((Color::White, true)) => 'W',
                    Some((Color::Black, false)) => 'b',
                    Some((Color::Black, true)) => 'B',
                    None => '.',
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
