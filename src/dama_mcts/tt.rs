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

//! The transposition table (spec §3/§4.4): a hash-indexed map from a
//! position's Zobrist hash to a non-owning pointer into the arena, with
//! mandatory state-equality verification on lookup to defeat hash
//! collisions. Backed by `dashmap`, the reference engine's own choice for
//! concurrent maps elsewhere in its utility crate.

use std::ptr::NonNull;

use dashmap::DashMap;

use dama_board::GameState;

use crate::tree::Node;

/// Non-owning: every `NonNull<Node>` stored here points into a search's
/// arena, which is this table's owner and always outlives it.
pub struct TranspositionTable {
    entries: DashMap<u64, NonNull<Node>>,
}

unsafe impl Send for TranspositionTable {}
unsafe impl Sync for TranspositionTable {}

impl TranspositionTable {
    pub fn new() -> TranspositionTable {
        TranspositionTable { entries: DashMap::new() }
    }

    /// Looks up `hash`, returning the stored node only if its state
    /// compares field-wise equal to `state` -- a raw hash hit is not
    /// enough, since two distinct positions can collide.
    pub fn lookup(&self, hash: u64, state: &GameState) -> Option<NonNull<Node>> {
        let entry = self.entries.get(&hash)?;
        let candidate = unsafe { entry.as_ref() };

        if candidate.state == *state {
            Some(*entry)
        } else {
            None
        }
    }

    /// Publishes `node` under `hash`. If another thread already inserted
    /// an entry for the same hash first, that entry wins and `node` is
    /// left for the arena to reclaim on the next reset -- never freed
    /// here, since the table never owns arena memory.
    pub fn insert(&self, hash: u64, node: NonNull<Node>) {
        self.entries.entry(hash).or_insert(node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. Must only be called when the arena that backed
    /// every stored pointer has also been reset (spec §3: "the table is
    /// cleared when the arena is reset").
    pub fn clear(&self) {
        self.entries.clear();
        log::debug!("transposition table cleared");
    }
}

impl Default for TranspositionTable {
    fn default() -> TranspositionTable {
        TranspositionTable::new()
    }
}
