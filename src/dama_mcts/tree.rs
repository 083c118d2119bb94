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

//! The search tree (spec §3/§4.4/§4.5/§4.7): arena-owned nodes linked by
//! raw, non-owning pointers, descended by the tree policy and updated by
//! backpropagation. Mirrors the `Arc<UnsafeCell<Node>>` ownership style of
//! the reference engine this is built from, minus the `Arc` -- the arena
//! is the thing keeping nodes alive here, not reference counting.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use dama_board::{GameState, Move};

use crate::arena::Arena;
use crate::policy::{score_child, select_best, ChildStats, PolicyConfig};
use crate::solver::{propagate, SolverCell, SolverStatus};
use crate::tt::TranspositionTable;

/// A path from the root to a leaf, root first. Every edge along it had
/// Virtual Loss applied on the way down; `backpropagate` undoes it.
pub type NodeTrace = Vec<NonNull<Node>>;

/// Read-only view of a node's statistics, for introspection and tests
/// without exposing the raw atomics or the expansion lock.
#[derive(Debug, Clone, Copy)]
pub struct NodeStats {
    pub visits: u64,
    pub score_sum: f64,
    pub prior: f32,
    pub solver_status: SolverStatus,
    pub terminal: bool,
}

/// One node of the search tree (spec §3). `parent` and the pointers inside
/// `children` are non-owning: the arena that allocated them owns the
/// memory, and no node outlives its arena.
pub struct Node {
    pub state: GameState,
    pub move_from_parent: Option<Move>,
    parent: Option<NonNull<Node>>,

    /// Guards expansion; also briefly locked by readers to clone out the
    /// (post-expansion, immutable) list of child pointers.
    children: Mutex<Vec<NonNull<Node>>>,

    /// Published with `Release` once `children` has been filled; read with
    /// `Acquire` so that a reader observing `num_children > 0` is
    /// guaranteed to see every child `children` holds (spec §4.4's release
    /// fence requirement).
    num_children: AtomicUsize,

    visits: AtomicU64,
    score_sum: Mutex<f64>,
    virtual_loss: AtomicI64,

    /// This node's prior, as assigned by its parent's expansion. Fixed at
    /// creation.
    prior: f32,

    terminal: AtomicBool,
    solver: SolverCell,
}

// `Node` is reached through raw pointers shared across worker threads;
// every field that is not already `Sync` (the `NonNull`s) is only ever
// mutated through the atomics/mutex above.
unsafe impl Send for Node {}
unsafe impl Sync for Node {}

impl Node {
    /// Builds a root node: no parent, no move-from-parent, unexpanded.
    pub fn new_root(state: GameState) -> Node {
        Node {
            state,
            move_from_parent: None,
            parent: None,
            children: Mutex::new(Vec::new()),
            num_children: AtomicUsize::new(0),
            visits: AtomicU64::new(0),
            score_sum: Mutex::new(0.0),
            virtual_loss: AtomicI64::new(0),
            prior: 1.0,
            terminal: AtomicBool::new(false),
            solver: SolverCell::default(),
        }
    }

    fn new_child(state: GameState, mv: Move, parent: NonNull<Node>, prior: f32) -> Node {
        Node {
            state,
            move_from_parent: Some(mv),
            parent: Some(parent),
            children: Mutex::new(Vec::new()),
            num_children: AtomicUsize::new(0),
            visits: AtomicU64::new(0),
            score_sum: Mutex::new(0.0),
            virtual_loss: AtomicI64::new(0),
            prior,
            terminal: AtomicBool::new(false),
            solver: SolverCell::default(),
        }
    }

    pub fn visits(&self) -> u64 {
        self.visits.load(Ordering::Acquire)
    }

    pub fn score_sum(&self) -> f64 {
        *self.score_sum.lock().expect("score_sum mutex poisoned")
    }

    pub fn virtual_loss(&self) -> i64 {
        self.virtual_loss.load(Ordering::Acquire)
    }

    pub fn prior(&self) -> f32 {
        self.prior
    }

    pub fn solver_status(&self) -> SolverStatus {
        self.solver.load()
    }

    pub fn is_expanded(&self) -> bool {
        self.num_children.load(Ordering::Acquire) > 0 || self.is_terminal()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::Acquire)
    }

    pub fn parent(&self) -> Option<NonNull<Node>> {
        self.parent
    }

    /// Clones out the current child pointers. Cheap and safe to call
    /// without holding the lock afterwards: once `num_children` is
    /// published, `children` is never mutated again.
    pub fn children(&self) -> Vec<NonNull<Node>> {
        if self.num_children.load(Ordering::Acquire) == 0 {
            return Vec::new();
        }
        self.children.lock().expect("children mutex poisoned").clone()
    }

    pub fn snapshot(&self) -> NodeStats {
        NodeStats {
            visits: self.visits(),
            score_sum: self.score_sum(),
            prior: self.prior,
            solver_status: self.solver_status(),
            terminal: self.is_terminal(),
        }
    }

    /// Expands this node: allocates one child per entry of `moves` from
    /// the arena, assigning `priors[i]` (already re-normalized over legal
    /// moves, per spec §4.6) to `moves[i]`. A node with no legal moves is
    /// marked terminal instead of gaining children. Idempotent: a second
    /// caller arriving after expansion has already published observes
    /// `num_children > 0` (or `terminal`) and does nothing (spec §4.4).
    ///
    /// Returns `true` if *this* call performed the expansion. When `tt` is
    /// supplied, each child state is first looked up by hash (spec §4.4):
    /// a verified hit reuses the existing node -- sharing its statistics
    /// across the DAG -- instead of allocating a fresh one, and every
    /// freshly-allocated child is published into the table for later
    /// siblings (of other parents) to find.
    pub fn expand(
        &self,
        moves: &[Move],
        priors: &[f32],
        arena: &Arena,
        tt: Option<&TranspositionTable>,
    ) -> bool {
        debug_assert_eq!(moves.len(), priors.len());

        let mut guard = self.children.lock().expect("children mutex poisoned");
        if self.num_children.load(Ordering::Acquire) > 0 || self.is_terminal() {
            return false;
        }

        if moves.is_empty() {
            self.terminal.store(true, Ordering::Release);
            return true;
        }

        let self_ptr = NonNull::from(self);
        let mut children = Vec::with_capacity(moves.len());

        for (mv, &prior) in moves.iter().zip(priors) {
            let child_state = self.state.apply_move(mv);

            let existing = tt.and_then(|tt| tt.lookup(child_state.hash, &child_state));
            let ptr = if let Some(existing) = existing {
                existing
            } else {
                let child = Node::new_child(child_state.clone(), mv.clone(), self_ptr, prior);
                let raw = match arena.alloc(child) {
                    Some(raw) => raw,
                    None => {
                        // Arena is full mid-descent (spec §7): leave this
                        // node unexpanded rather than abort the search.
                        // Already-allocated siblings from this same loop
                        // stay alive in the arena, just unreachable from
                        // here until the next reset.
                        log::warn!("arena exhausted during expansion, leaving node unexpanded");
                        return false;
                    }
                };
                let ptr = NonNull::new(raw).expect("arena returned a null pointer");

                if let Some(tt) = tt {
                    tt.insert(child_state.hash, ptr);
                }

                ptr
            };

            children.push(ptr);
        }

        *guard = children;
        // Release: publishes `children`'s contents before `num_children`
        // becomes visible to an Acquire reader (spec §4.4).
        self.num_children.store(moves.len(), Ordering::Release);
        true
    }

    fn apply_virtual_loss(&self) {
        self.visits.fetch_add(1, Ordering::AcqRel);
        *self.score_sum.lock().expect("score_sum mutex poisoned") -= 1.0;
        self.virtual_loss.fetch_add(1, Ordering::AcqRel);
    }

    fn undo_virtual_loss(&self) {
        self.visits.fetch_sub(1, Ordering::AcqRel);
        *self.score_sum.lock().expect("score_sum mutex poisoned") += 1.0;
        self.virtual_loss.fetch_sub(1, Ordering::AcqRel);
    }

    fn add_real_result(&self, value: f32) {
        self.visits.fetch_add(1, Ordering::AcqRel);
        *self.score_sum.lock().expect("score_sum mutex poisoned") += value as f64;
    }

    /// Marks a just-discovered terminal leaf with its proven status,
    /// ahead of `backpropagate` walking the rest of the path.
    pub fn set_terminal_solver_status(&self, status: SolverStatus) {
        debug_assert!(self.is_terminal(), "only call on a node `expand` found to be terminal");
        self.solver.store(status);
    }
}

/// Descends from `root` by repeatedly selecting the highest-scoring child
/// (spec §4.5), applying Virtual Loss to each traversed child, stopping at
/// the root itself if it is unexpanded, an unexpanded child, a terminal
/// node, or a node whose subtree is already fully solved (further
/// descent there cannot change the conclusion).
pub fn select_leaf(root: &Node, config: &PolicyConfig) -> NodeTrace {
    let mut trace = vec![NonNull::from(root)];
    let mut current = root;

    loop {
        if current.is_terminal() || current.solver_status().is_solved() {
            break;
        }

        let children = current.children();
        if children.is_empty() {
            break;
        }

        let parent_visits = current.visits();
        let sqrt_sibling_visits = (children
            .iter()
            .map(|c| unsafe { c.as_ref() }.visits())
            .sum::<u64>() as f64)
            .sqrt();

        let candidates = children.iter().enumerate().map(|(i, child_ptr)| {
            let child = unsafe { child_ptr.as_ref() };
            let stats = ChildStats {
                visits: child.visits(),
                score_sum: child.score_sum(),
                prior: child.prior(),
            };
            let mv = child.move_from_parent.as_ref().expect("child always has a move");
            let score = score_child(config, &stats, mv, parent_visits, sqrt_sibling_visits);
            (i, score)
        });

        let best = select_best(candidates).expect("expanded node always has at least one child");
        let chosen = children[best];

        unsafe { chosen.as_ref() }.apply_virtual_loss();
        trace.push(chosen);
        current = unsafe { chosen.as_ref() };
    }

    trace
}

/// Walks `trace` from leaf to root, undoing Virtual Loss, adding the
/// backed-up value (flipping perspective at every step, spec §4.7), and --
/// when `use_solver` is set -- recomputing each ancestor's solver status
/// from its children. The leaf's own solver status (if terminal) must
/// already be set via `set_terminal_solver_status` before calling this.
pub fn backpropagate(trace: &NodeTrace, leaf_value: f32, use_solver: bool) {
    let mut value = leaf_value;

    for (i, &node_ptr) in trace.iter().rev().enumerate() {
        let node = unsafe { node_ptr.as_ref() };
        let is_root = i == trace.len() - 1;
        let is_leaf = i == 0;

        if !is_root {
            node.undo_virtual_loss();
        }
        node.add_real_result(value);

        if use_solver && !is_leaf {
            let statuses: Vec<SolverStatus> = node
                .children()
                .iter()
                .map(|child| unsafe { child.as_ref() }.solver_status())
                .collect();

            if let Some(status) = propagate(&statuses, node.is_expanded()) {
                node.solver.store(status);
            }
        }

        value = 1.0 - value;
    }
}
