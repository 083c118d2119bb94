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

use std::error::Error;
use std::fmt;

/// Errors that can be surfaced to a caller of the search driver.
///
/// Invariant violations (move-list overflow, a hash that no longer matches
/// the state it was derived from, an expansion that ran outside its lock)
/// are deliberately **not** modeled here -- they indicate a bug in the
/// engine itself, and are reported via `panic!`/`debug_assert!` instead of
/// a recoverable `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum DamaError {
    /// The `Config` passed to `search` was rejected before any work began.
    InvalidConfig(String),

    /// The arena ran out of space. The driver is expected to catch this at
    /// a turn boundary (by checking the watermark) and reset, discarding
    /// the tree; this variant exists for the rare case where the caller
    /// drives allocation directly and must be told to back off.
    ArenaExhausted,

    /// The configured `Predictor` returned a malformed batch (wrong
    /// length, non-finite values). The affected requests fall back to the
    /// configured draw score and search continues.
    EvaluatorFailed(String),
}

impl fmt::Display for DamaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DamaError::InvalidConfig(reason) => write!(f, "invalid search configuration: {}", reason),
            DamaError::ArenaExhausted => write!(f, "search arena is exhausted"),
            DamaError::EvaluatorFailed(reason) => write!(f, "evaluator failed: {}", reason),
        }
    }
}

impl Error for DamaError {}
