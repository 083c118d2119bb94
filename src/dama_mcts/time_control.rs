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

//! Budget tracking for the search driver (spec §4.9/§6): "whichever of
//! `{time_limit, max_nodes}` triggers first", narrowed from the reference
//! engine's richer `TimeStrategy` (byo-yomi, rollout-count extension
//! heuristics) down to the two budget kinds spec §6 actually names.

use std::time::{Duration, Instant};

use crate::tree::Node;

/// Tracks one search's elapsed time against its configured budget.
/// `is_done` is polled by the driver once per loop iteration (spec §4.9).
pub struct Budget {
    started_at: Instant,
    time_limit: Option<Duration>,
    max_nodes: Option<u64>,
}

impl Budget {
    pub fn new(time_limit: Option<Duration>, max_nodes: Option<u64>) -> Budget {
        Budget { started_at: Instant::now(), time_limit, max_nodes }
    }

    /// Whether either configured limit has been reached, given the
    /// current root visit count.
    pub fn is_done(&self, root: &Node) -> bool {
        if let Some(limit) = self.time_limit {
            if self.started_at.elapsed() >= limit {
                return true;
            }
        }

        if let Some(max_nodes) = self.max_nodes {
            if root.visits() >= max_nodes {
                return true;
            }
        }

        false
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
