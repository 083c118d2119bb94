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

//! Exercises `dama_mcts::Driver` against real `dama_board` positions:
//! termination under a tight budget (C2), root/child visit accounting
//! (I5, I6), tree reuse across `advance`, and both leaf-evaluation paths
//! (rollout-only and the batched `Predictor` oracle).

use std::time::Duration;

use dama_board::GameState;
use dama_mcts::{Config, Driver, HeuristicPredictor, UniformPredictor};

fn rollout_only_config() -> Config {
    let mut config = Config::default();
    config.num_workers = 4;
    config.time_limit = Some(Duration::from_millis(100));
    config.max_nodes = None;
    config.arena_bytes = 8 * 1024 * 1024;
    config
}

/// C2: a search with a tight time budget always returns, never deadlocks.
#[test]
fn search_with_a_tight_time_budget_always_returns() {
    let driver = Driver::new(rollout_only_config(), GameState::new(), None).unwrap();
    let mv = driver.search().expect("search must complete within its own budget");

    let legal = dama_board::generate(&GameState::new());
    assert!(legal.contains(&mv));
}

/// I5/I6: once `search` returns, the root has been visited, no residual
/// virtual loss is hiding in the children's visit counts (a node's visits
/// only ever come from virtual loss, which is always undone, or a real
/// backpropagated result), and child visits never exceed the root's.
#[test]
fn root_and_child_visit_counts_are_consistent_after_search() {
    let driver = Driver::new(rollout_only_config(), GameState::new(), None).unwrap();
    driver.search().unwrap();

    let root = driver.root_stats();
    let children = driver.child_stats();

    assert!(root.visits > 0);
    assert!(!children.is_empty(), "the opening position always has legal replies");

    let total_child_visits: u64 = children.iter().map(|c| c.visits).sum();
    assert!(total_child_visits <= root.visits);
}

/// Tree reuse: advancing the driver along the move it just picked must
/// land on the position `apply_move` itself would produce, and the new
/// root should already carry visits accumulated before the advance (the
/// matching child is promoted, not thrown away).
#[test]
fn advance_lands_on_the_expected_position_and_keeps_its_statistics() {
    let mut driver = Driver::new(rollout_only_config(), GameState::new(), None).unwrap();
    let mv = driver.search().unwrap();

    let expected_next = GameState::new().apply_move(&mv);
    driver.advance(&mv);

    assert_eq!(driver.state(), &expected_next);
    assert!(driver.root_stats().visits > 0);
}

/// The batched `Predictor` oracle path: a driver configured with a
/// `HeuristicPredictor` still produces a legal move within its budget,
/// exercising `InferenceQueue` end to end against real board states
/// instead of the rollout path.
#[test]
fn search_with_a_cnn_style_predictor_also_returns_a_legal_move() {
    let mut config = rollout_only_config();
    config.num_workers = 3;
    config.batch_max = 4;
    config.batch_deadline = Duration::from_millis(2);

    let predictor = Box::new(HeuristicPredictor::default());
    let driver = Driver::new(config, GameState::new(), Some(predictor)).unwrap();
    let mv = driver.search().expect("predictor-backed search must also complete");

    let legal = dama_board::generate(&GameState::new());
    assert!(legal.contains(&mv));
}

/// A uniform predictor carries no information at all, so this mostly
/// checks that the whole master/worker/queue wiring doesn't starve or
/// deadlock when every batch is maximally boring.
#[test]
fn search_with_a_uniform_predictor_terminates_under_its_budget() {
    let mut config = rollout_only_config();
    config.time_limit = Some(Duration::from_millis(80));
    config.batch_max = 2;

    let predictor = Box::new(UniformPredictor::new(0.5));
    let driver = Driver::new(config, GameState::new(), Some(predictor)).unwrap();

    driver.search().expect("uniform-predictor search must complete");
}

/// A deliberately tiny arena crosses its watermark after a handful of
/// moves, forcing `advance` onto its reset path (spec §7) instead of tree
/// reuse. `env_logger::try_init` wires up the `log::warn!` that path
/// emits, so this also doubles as a smoke test of the ambient logging.
#[test]
fn a_tiny_arena_eventually_forces_a_reset_instead_of_reuse() {
    let _ = env_logger::try_init();

    let mut config = rollout_only_config();
    config.arena_bytes = 64 * 1024;
    config.time_limit = Some(Duration::from_millis(30));

    let mut driver = Driver::new(config, GameState::new(), None).unwrap();
    let mut state = GameState::new();

    for _ in 0..6 {
        if state.outcome() != dama_board::Outcome::Ongoing {
            break;
        }
        let mv = driver.search().expect("search must still complete on a small arena");
        state = state.apply_move(&mv);
        driver.advance(&mv);
        assert_eq!(driver.state(), &state);
    }
}

/// A second, independent `search()` call on a freshly advanced driver
/// should keep producing legal moves for the resulting side to move,
/// across a short sequence -- a minimal whole-game smoke test.
#[test]
fn a_short_sequence_of_search_then_advance_stays_on_legal_moves() {
    let mut driver = Driver::new(rollout_only_config(), GameState::new(), None).unwrap();
    let mut state = GameState::new();

    for _ in 0..4 {
        if state.outcome() != dama_board::Outcome::Ongoing {
            break;
        }
        let mv = driver.search().expect("every ongoing position must yield a move");
        let legal = dama_board::generate(&state);
        assert!(legal.contains(&mv));

        state = state.apply_move(&mv);
        driver.advance(&mv);
        assert_eq!(driver.state(), &state);
    }
}
