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

//! The search core: a multi-threaded MCTS driver coupling tree
//! exploration (PUCT/UCB1-Tuned selection, Virtual Loss, First-Play
//! Urgency, a solved-subtree lattice) with either a batched CNN oracle or
//! an ε-greedy rollout for leaf evaluation. `dama_board` supplies the
//! rules; this crate only ever calls into it, never reimplements them.

extern crate log;

mod arena;
mod config;
mod driver;
mod policy;
mod pool;
mod predict;
mod rollout;
mod solver;
mod time_control;
mod tree;
mod tt;

pub use self::arena::Arena;
pub use self::config::{simulation_only, Config};
pub use self::driver::{search_once, Driver};
pub use self::policy::{ChildStats, PolicyConfig, SelectionFormula};
pub use self::predict::{HeuristicPredictor, InferenceQueue, Predictor, SubmitOutcome, UniformPredictor};
pub use self::solver::SolverStatus;
pub use self::time_control::Budget;
pub use self::tree::{Node, NodeStats};
pub use self::tt::TranspositionTable;
