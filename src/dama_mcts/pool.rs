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

//! The worker pool (spec §4.9/§5): a fixed number of named OS threads,
//! each repeatedly selecting a leaf, obtaining a value for it (CNN or
//! rollout), expanding, and backpropagating, until the driver flips the
//! shutdown flag. Grounded on the reference engine's own `Pool`/`Worker`/
//! `SharedContext` split (`libdg_mcts/pool/pool.rs`), generalized from a
//! long-lived multi-search pool to the one-pool-per-`search()`-call shape
//! spec §4.9 describes, and using `std::thread::scope` in place of the
//! reference engine's `Arc<UnsafeCell<_>>` + raw-pointer-plus-manual-`Send`
//! dance: since `Node` and `Arena` are already safe to share by reference
//! across threads, scoped threads let the borrow checker prove the
//! lifetime instead of an `unsafe impl Send` asserting it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use rand::thread_rng;

use dama_board::{generate, GameState, Outcome};

use crate::arena::Arena;
use crate::config::Config;
use crate::policy::renormalize_priors;
use crate::predict::{InferenceQueue, SubmitOutcome};
use crate::rollout::rollout;
use crate::solver::SolverStatus;
use crate::tree::{backpropagate, select_leaf, Node};
use crate::tt::TranspositionTable;

/// Everything a worker needs that outlives any single iteration: the
/// arena nodes are allocated from, the optional transposition table, the
/// optional inference queue (CNN path) and the shutdown flag the driver
/// flips at the end of the budget.
pub struct SharedContext<'a> {
    pub arena: &'a Arena,
    pub tt: Option<&'a TranspositionTable>,
    pub queue: Option<&'a InferenceQueue>,
    pub config: &'a Config,
    pub shutdown: AtomicBool,
}

impl<'a> SharedContext<'a> {
    pub fn new(
        arena: &'a Arena,
        tt: Option<&'a TranspositionTable>,
        queue: Option<&'a InferenceQueue>,
        config: &'a Config,
    ) -> SharedContext<'a> {
        SharedContext { arena, tt, queue, config, shutdown: AtomicBool::new(false) }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Cooperative shutdown (spec §4.9): flips the flag and, if a CNN is
    /// configured, wakes every thread still blocked on the inference
    /// queue so nobody waits past this point.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(queue) = self.queue {
            queue.shutdown();
        }
    }
}

/// Spawns `config.num_workers` scoped threads, each running [`run_worker`]
/// against `root`, and blocks until every one returns -- which only
/// happens once `shared.is_shutdown()` is observed (spec §4.9: "join all
/// workers" after requesting shutdown).
pub fn run_workers(root: &Node, shared: &SharedContext) {
    thread::scope(|scope| {
        for index in 0..shared.config.num_workers {
            thread::Builder::new()
                .name(format!("dama-worker-{index}"))
                .spawn_scoped(scope, move || run_worker(root, shared))
                .expect("failed to spawn search worker thread");
        }
    });
}

/// One worker's loop (spec §4.9's step (a)-(d)): descend with the tree
/// policy (applying Virtual Loss on the way down), resolve the leaf's
/// value (CNN inference or rollout), expand, and backpropagate -- until
/// shutdown is observed.
fn run_worker(root: &Node, shared: &SharedContext) {
    while !shared.is_shutdown() {
        let trace = select_leaf(root, &shared.config.policy);
        let leaf = unsafe { trace.last().expect("trace always has at least the root").as_ref() };

        let outcome = leaf.state.outcome();
        if outcome != Outcome::Ongoing {
            settle_terminal_leaf(leaf, outcome, shared);
            backpropagate(&trace, terminal_value(outcome, shared.config.draw_score), shared.config.use_solver);
            continue;
        }

        if leaf.solver_status().is_solved() {
            // The leaf itself is unexpanded but a prior pass already
            // proved its value (possible once tree reuse carries a
            // solved subtree into a new search) -- no need to touch the
            // CNN or rollout again.
            let value = leaf
                .solver_status()
                .as_value(shared.config.draw_score)
                .expect("solved status always has a value");
            backpropagate(&trace, value, shared.config.use_solver);
            continue;
        }

        let moves = generate(&leaf.state);
        let (priors, value) = match shared.queue {
            Some(queue) => match queue.submit(leaf.state.clone()) {
                SubmitOutcome::Evaluated { policy, value } => {
                    let priors = renormalize_priors(&policy, &moves, leaf.state.side_to_move);
                    (priors, (value + 1.0) / 2.0)
                }
                SubmitOutcome::ShutDown => break,
            },
            None => {
                let uniform = vec![1.0 / moves.len() as f32; moves.len()];
                let mut rng = thread_rng();
                let value = rollout(
                    &leaf.state,
                    shared.config.rollout_epsilon,
                    shared.config.use_decaying_reward,
                    shared.config.decay_factor,
                    shared.config.draw_score,
                    &shared.config.policy.heuristic_weights,
                    &mut rng,
                );
                (uniform, value)
            }
        };

        leaf.expand(&moves, &priors, shared.arena, shared.tt);
        backpropagate(&trace, value, shared.config.use_solver);
    }
}

/// Publishes a just-discovered terminal leaf's children (none) and its
/// solver status (spec §4.7: `ProvenLoss` for "no moves", `ProvenDraw` for
/// the 40-move rule).
fn settle_terminal_leaf(leaf: &Node, outcome: Outcome, shared: &SharedContext) {
    leaf.expand(&[], &[], shared.arena, shared.tt);

    if shared.config.use_solver {
        let status = if outcome == Outcome::Draw { SolverStatus::ProvenDraw } else { SolverStatus::ProvenLoss };
        leaf.set_terminal_solver_status(status);
    }
}

/// The value of a decisive/drawn leaf from its own side-to-move's
/// perspective. `GameState::outcome` only ever assigns a win to the
/// *opponent* of whoever has no moves, so any non-draw terminal is always
/// a loss (`0.0`) from the leaf's own mover's point of view.
fn terminal_value(outcome: Outcome, draw_score: f32) -> f32 {
    match outcome {
        Outcome::Draw => draw_score,
        Outcome::Ongoing => unreachable!("caller already checked outcome != Ongoing"),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::time::Duration;

    #[test]
    fn workers_make_progress_and_stop_on_shutdown() {
        let arena = Arena::with_capacity(16 * 1024 * 1024);
        let root = Node::new_root(GameState::new());
        let mut config = Config::default();
        config.num_workers = 2;
        config.time_limit = Some(Duration::from_millis(50));

        let shared = SharedContext::new(&arena, None, None, &config);

        thread::scope(|scope| {
            let handle = thread::Builder::new()
                .spawn_scoped(scope, || run_workers(&root, &shared))
                .unwrap();

            thread::sleep(Duration::from_millis(50));
            shared.request_shutdown();
            handle.join().unwrap();
        });

        assert!(root.visits() > 0);
    }
}
