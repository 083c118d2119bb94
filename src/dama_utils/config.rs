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

//! Process-wide defaults, overridable through the environment.
//!
//! These are only *defaults* -- a caller-supplied `Config` (see
//! `dama_mcts::config`) always wins when a field has been set explicitly.
//! They exist so that a long-running host process (a tournament harness, a
//! benchmark) can tune the engine without recompiling it.

use std::env;
use std::str::FromStr;

/// Parses an environment variable as `T`, falling back to `default` if the
/// variable is unset or fails to parse.
fn from_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

lazy_static! {
    /// The default number of worker threads spawned per search, unless the
    /// caller's `Config` overrides it.
    pub static ref NUM_WORKERS: usize = from_env("DAMA_NUM_WORKERS", 4);

    /// The default maximum number of inference requests batched together
    /// by the master thread before evaluation.
    pub static ref BATCH_MAX: usize = from_env("DAMA_BATCH_MAX", 16);

    /// The latency deadline, in milliseconds, that the master thread waits
    /// for a batch to fill before evaluating whatever has accumulated.
    pub static ref BATCH_DEADLINE_MS: u64 = from_env("DAMA_BATCH_DEADLINE_MS", 1);

    /// The default size, in bytes, of the arena backing one search.
    pub static ref ARENA_BYTES: usize = from_env("DAMA_ARENA_BYTES", 64 * 1024 * 1024);

    /// The watermark (as a fraction of `ARENA_BYTES`) above which the
    /// driver resets the arena at the next turn boundary.
    pub static ref ARENA_WATERMARK: f32 = from_env("DAMA_ARENA_WATERMARK", 0.95);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        assert!(*NUM_WORKERS >= 1);
        assert!(*BATCH_MAX >= 1);
        assert!(*ARENA_BYTES > 0);
        assert!(*ARENA_WATERMARK > 0.0 && *ARENA_WATERMARK <= 1.0);
    }
}
