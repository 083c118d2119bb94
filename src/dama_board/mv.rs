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

use crate::square::Square;

/// The longest legal capture chain: 12 jumps across a `8x8` board (every
/// piece but one captured, by a single chain).
pub const MAX_MOVE_LENGTH: usize = 12;

/// A move is a path of up to 12 squares plus a parallel array of captured
/// squares (spec §3). `length == 0` is a simple (non-capturing) move whose
/// destination is `path[1]`; `length >= 1` is a capture chain of `length`
/// jumps whose destination is `path[length]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    path: [Square; MAX_MOVE_LENGTH + 1],
    captured: [Square; MAX_MOVE_LENGTH],
    length: u8,

    /// Priority metrics used by the Italian priority filter (spec §4.1)
    /// and by selection-time progressive bias (spec §4.5).
    pub is_lady_move: bool,
    pub captured_ladies_count: u8,
    pub first_captured_is_lady: bool,
}

impl Move {
    /// Builds a simple (non-capturing) move from `from` to `to`.
    pub fn simple(from: Square, to: Square, is_lady_move: bool) -> Move {
        let mut path = [from; MAX_MOVE_LENGTH + 1];
        path[1] = to;

        Move {
            path,
            captured: [from; MAX_MOVE_LENGTH],
            length: 0,
            is_lady_move,
            captured_ladies_count: 0,
            first_captured_is_lady: false,
        }
    }

    /// Builds a capture chain from the sequence of squares visited
    /// (`path[0]` is the starting square) and the squares captured along
    /// the way (`path.len() == captured.len() + 1`).
    pub fn capture(path: &[Square], captured: &[Square], is_lady_move: bool) -> Move {
        debug_assert_eq!(path.len(), captured.len() + 1);
        debug_assert!(captured.len() <= MAX_MOVE_LENGTH);

        let mut path_arr = [path[0]; MAX_MOVE_LENGTH + 1];
        let mut captured_arr = [path[0]; MAX_MOVE_LENGTH];

        for (i, &sq) in path.iter().enumerate() {
            path_arr[i] = sq;
        }
        for (i, &sq) in captured.iter().enumerate() {
            captured_arr[i] = sq;
        }

        let first_captured_is_lady = false; // set by the caller once known
        let captured_ladies_count = 0; // set by the caller once known

        Move {
            path: path_arr,
            captured: captured_arr,
            length: captured.len() as u8,
            is_lady_move,
            captured_ladies_count,
            first_captured_is_lady,
        }
    }

    pub fn length(&self) -> usize {
        self.length as usize
    }

    pub fn is_capture(&self) -> bool {
        self.length > 0
    }

    pub fn from(&self) -> Square {
        self.path[0]
    }

    pub fn to(&self) -> Square {
        self.path[self.length as usize]
    }

    /// The full path, `path[0..=length]`.
    pub fn path(&self) -> &[Square] {
        &self.path[0..=self.length as usize]
    }

    /// The captured squares, `captured[0..length]`.
    pub fn captured(&self) -> &[Square] {
        &self.captured[0..self.length as usize]
    }

    /// The lexicographic priority tuple used by the Italian priority
    /// filter (spec §4.1): `(length, is_lady_move, captured_ladies_count,
    /// first_captured_is_lady)`.
    pub fn priority_rank(&self) -> (u8, bool, u8, bool) {
        (self.length, self.is_lady_move, self.captured_ladies_count, self.first_captured_is_lady)
    }

    /// Checks invariant I7: no capture chain revisits the same captured
    /// square twice.
    pub fn captures_no_duplicate_squares(&self) -> bool {
        let captured = self.captured();
        for i in 0..captured.len() {
            for j in (i + 1)..captured.len() {
                if captured[i] == captured[j] {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_capture() {
            for (i, sq) in self.path().iter().enumerate() {
                if i > 0 {
                    write!(f, "x")?;
                }
                write!(f, "{}", sq)?;
            }
        } else {
            write!(f, "{}-{}", self.from(), self.to())?;
        }
        Ok(())
    }
}
