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

//! The public entry point (spec §4.9/§7): owns one search's arena and
//! tree across a game, runs the worker pool against a time/node budget,
//! and picks the most-visited root child. Tree reuse (spec §3) advances
//! the root to the matching child of the next position instead of
//! discarding everything between moves, unless the arena has crossed its
//! watermark (spec §7), in which case the arena is reset and a fresh root
//! is allocated.

use std::ptr::NonNull;
use std::thread;
use std::time::Duration;

use dama_board::{GameState, Move};
use dama_utils::config::ARENA_WATERMARK;
use dama_utils::error::DamaError;

use crate::arena::Arena;
use crate::config::Config;
use crate::predict::{InferenceQueue, Predictor};
use crate::pool::{run_workers, SharedContext};
use crate::time_control::Budget;
use crate::tree::{Node, NodeStats};
use crate::tt::TranspositionTable;

/// One game's worth of search state: the arena, the current root, and
/// whatever else needs to outlive a single `search` call (spec §1's
/// "drives the process... across a full game").
pub struct Driver {
    arena: Arena,
    root: NonNull<Node>,
    tt: Option<TranspositionTable>,
    queue: Option<InferenceQueue>,
    predictor: Option<Box<dyn Predictor>>,
    config: Config,
}

// `root` is a raw pointer into `arena`, which this struct owns; nothing
// about that pairing prevents moving the whole `Driver` across threads.
unsafe impl Send for Driver {}

impl Driver {
    /// Builds a driver for a fresh position. `predictor`, when given,
    /// switches every leaf evaluation from the ε-greedy rollout to the
    /// CNN oracle path (spec §4.6).
    pub fn new(config: Config, state: GameState, predictor: Option<Box<dyn Predictor>>) -> Result<Driver, DamaError> {
        config.validate()?;

        let arena = Arena::with_capacity(config.arena_bytes);
        let root_ptr = arena
            .alloc(Node::new_root(state))
            .expect("a freshly-created arena always has room for one root node");
        let root = NonNull::new(root_ptr).expect("arena returned a null pointer");

        let tt = if config.use_tt { Some(TranspositionTable::new()) } else { None };
        let queue = if predictor.is_some() {
            Some(InferenceQueue::new(config.batch_max, config.batch_deadline, config.draw_score))
        } else {
            None
        };

        Ok(Driver { arena, root, tt, queue, predictor, config })
    }

    /// The state at the current root.
    pub fn state(&self) -> &GameState {
        &unsafe { self.root.as_ref() }.state
    }

    /// Runs the worker pool against this call's budget (spec §4.9):
    /// spawns `config.num_workers` threads selecting/evaluating/expanding/
    /// backpropagating against the current root, while this thread drains
    /// the inference queue (CNN path) or simply polls the budget (rollout
    /// path), until `time_limit`/`max_nodes` is reached; then requests
    /// shutdown and joins every worker before returning the root child
    /// with the most visits.
    pub fn search(&self) -> Result<Move, DamaError> {
        let root = unsafe { self.root.as_ref() };
        debug_assert!(!root.is_terminal(), "search() must not be called on a finished game");

        let shared = SharedContext::new(&self.arena, self.tt.as_ref(), self.queue.as_ref(), &self.config);
        let budget = Budget::new(self.config.time_limit, self.config.max_nodes);

        thread::scope(|scope| {
            let pool_handle = thread::Builder::new()
                .name("dama-pool".to_string())
                .spawn_scoped(scope, || run_workers(root, &shared))
                .expect("failed to spawn the search pool thread");

            loop {
                match (&self.queue, &self.predictor) {
                    (Some(queue), Some(predictor)) => {
                        queue.drain_and_evaluate(predictor.as_ref());
                    }
                    _ => thread::sleep(Duration::from_millis(1)),
                }

                if budget.is_done(root) {
                    shared.request_shutdown();
                    break;
                }
            }

            pool_handle.join().expect("search pool thread panicked");
        });

        best_child_move(root)
    }

    /// Advances the tree to the position after `mv` is played, reusing
    /// the matching child's subtree (spec §3) when tree reuse is enabled
    /// and the arena has room left; otherwise resets the arena and starts
    /// a fresh, single-node tree for the resulting position (spec §7).
    pub fn advance(&mut self, mv: &Move) {
        let current_state = unsafe { self.root.as_ref() }.state.clone();
        let next_state = current_state.apply_move(mv);

        let watermark = self.arena.watermark_ratio();
        let reusable = self.config.use_tree_reuse && watermark < *ARENA_WATERMARK;

        let reused = reusable.then(|| find_child_by_state(unsafe { self.root.as_ref() }, &next_state)).flatten();

        self.root = match reused {
            Some(child) => child,
            None => {
                if watermark >= *ARENA_WATERMARK {
                    log::warn!("arena watermark {:.2} reached, resetting for the next search", watermark);
                }
                self.arena.reset();
                if let Some(tt) = &self.tt {
                    tt.clear();
                }
                let ptr = self
                    .arena
                    .alloc(Node::new_root(next_state))
                    .expect("a just-reset arena always has room for one root node");
                NonNull::new(ptr).expect("arena returned a null pointer")
            }
        };
    }

    pub fn arena_watermark_ratio(&self) -> f32 {
        self.arena.watermark_ratio()
    }

    /// A snapshot of the current root's statistics, for callers that want
    /// to report search progress (visit count, solver status) without
    /// reaching into the tree itself. Mirrors the reference engine handing
    /// its whole result tree back to the caller, narrowed to the
    /// statistics spec §8's testable properties actually need.
    pub fn root_stats(&self) -> NodeStats {
        unsafe { self.root.as_ref() }.snapshot()
    }

    /// A snapshot of every immediate child of the current root, in the
    /// same order `children()` returns them in.
    pub fn child_stats(&self) -> Vec<NodeStats> {
        unsafe { self.root.as_ref() }
            .children()
            .iter()
            .map(|child| unsafe { child.as_ref() }.snapshot())
            .collect()
    }
}

fn find_child_by_state(root: &Node, state: &GameState) -> Option<NonNull<Node>> {
    root.children().into_iter().find(|&child| unsafe { child.as_ref() }.state == *state)
}

fn best_child_move(root: &Node) -> Result<Move, DamaError> {
    let children = root.children();
    let best = children
        .iter()
        .max_by_key(|&&child| unsafe { child.as_ref() }.visits())
        .expect("search() always expands the root before the budget runs out");

    let node = unsafe { best.as_ref() };
    Ok(node.move_from_parent.clone().expect("every non-root node has a move from its parent"))
}

/// A convenience one-shot search (used by tests and simple callers that
/// don't need tree reuse across a whole game): builds a throwaway
/// `Driver`, runs one search, and discards it.
pub fn search_once(state: GameState, config: Config, predictor: Option<Box<dyn Predictor>>) -> Result<Move, DamaError> {
    Driver::new(config, state, predictor)?.search()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.num_workers = 2;
        config.time_limit = Some(Duration::from_millis(50));
        config.max_nodes = None;
        config.arena_bytes = 4 * 1024 * 1024;
        config
    }

    #[test]
    fn search_once_returns_a_legal_move_from_the_opening_position() {
        let mv = search_once(GameState::new(), quick_config(), None).expect("search should succeed");
        let legal = dama_board::generate(&GameState::new());
        assert!(legal.contains(&mv));
    }

    #[test]
    fn advance_reuses_the_matching_child_when_under_watermark() {
        let mut driver = Driver::new(quick_config(), GameState::new(), None).unwrap();
        let mv = driver.search().unwrap();
        let visits_before_reset = unsafe { driver.root.as_ref() }.visits();
        assert!(visits_before_reset > 0);

        let next_state = GameState::new().apply_move(&mv);
        driver.advance(&mv);

        assert_eq!(driver.state(), &next_state);
    }

    #[test]
    fn root_and_child_stats_agree_with_the_move_returned() {
        let driver = Driver::new(quick_config(), GameState::new(), None).unwrap();
        let _ = driver.search().unwrap();

        let root = driver.root_stats();
        let children = driver.child_stats();

        assert!(root.visits > 0);
        let visited_children: u64 = children.iter().map(|c| c.visits).sum();
        assert!(visited_children <= root.visits);
    }

    #[test]
    fn rejects_an_invalid_configuration_before_allocating_anything() {
        let mut config = quick_config();
        config.num_workers = 0;
        let result = Driver::new(config, GameState::new(), None);
        assert!(result.is_err());
    }
}
