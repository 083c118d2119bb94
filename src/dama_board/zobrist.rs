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

//! Zobrist hashing (spec §4.2). A fixed, seeded `[color][piece][square]`
//! key table plus a single "black to move" key, generated once at process
//! start by a deterministic PRNG so that two processes (or two runs of the
//! same process) agree on the hash of a given position.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::color::Color;
use crate::square::Square;

/// `0` = pawn, `1` = lady.
pub const PAWN: usize = 0;
pub const LADY: usize = 1;

/// A fixed seed, chosen once and never changed -- changing it would
/// silently invalidate any externally-persisted hash (there are none in
/// this crate, but transposition tables built during a single search
/// depend on hash stability across the lifetime of that search).
const ZOBRIST_SEED: u64 = 0x44414d41_5f5a4f42; // "DAMA_ZOB" in ASCII

struct Keys {
    /// `piece_square[color][piece][square]`
    piece_square: [[[u64; 64]; 2]; 2],
    black_to_move: u64,
}

fn color_index(color: Color) -> usize {
    match color {
        Color::White => 0,
        Color::Black => 1,
    }
}

lazy_static! {
    static ref KEYS: Keys = {
        let mut rng = SmallRng::seed_from_u64(ZOBRIST_SEED);
        let mut piece_square = [[[0u64; 64]; 2]; 2];

        for color in piece_square.iter_mut() {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        Keys {
            piece_square,
            black_to_move: rng.gen(),
        }
    };
}

/// Returns the Zobrist key for a piece of the given `color` and `piece`
/// kind (`PAWN` or `LADY`) standing on `square`.
pub fn zobrist_key(color: Color, piece: usize, square: Square) -> u64 {
    KEYS.piece_square[color_index(color)][piece][square.index() as usize]
}

/// Returns the key XORed in whenever it is Black's turn to move.
pub fn black_to_move_key() -> u64 {
    KEYS.black_to_move
}
