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

//! Bitboard state, Zobrist hashing, and the Italian-checkers move
//! generator. This crate has no notion of search -- it is the rules
//! engine that `dama_mcts` drives.

#[macro_use] extern crate lazy_static;
extern crate rand;

mod bitboard;
mod color;
mod square;
mod zobrist;
mod state;
mod mv;
mod movegen;
mod policy_index;
pub mod heuristics;

pub use self::bitboard::{Bitboard, BitboardExt};
pub use self::color::Color;
pub use self::square::Square;
pub use self::state::{GameState, Outcome, MAX_PLIES_WITHOUT_CAPTURE};
pub use self::mv::{Move, MAX_MOVE_LENGTH};
pub use self::movegen::{generate, MoveList, MAX_MOVES};
pub use self::policy_index::{move_to_policy_index, POLICY_DIMENSION};
pub use self::zobrist::zobrist_key;
