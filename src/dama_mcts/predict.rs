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

//! The async inference batcher (spec §4.8): a bounded, mutex-and-condvar
//! guarded queue of requests that worker threads enqueue and block on,
//! drained by a master thread that evaluates a batch through a
//! `Predictor` and wakes every waiter. Modeled literally on the mutex +
//! per-request condition variable design spec §9 calls out, rather than
//! the reference engine's channel-based `Batcher` (the alternative design
//! the same section allows) -- the per-request condvar is what lets
//! `InferenceQueue::submit` block the calling worker thread directly
//! without an extra channel round-trip.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crossbeam_utils::Backoff;

use dama_board::heuristics::{evaluate, HeuristicWeights};
use dama_board::{GameState, POLICY_DIMENSION};

/// The external CNN oracle interface of spec §6: batched policy/value
/// evaluation. The core only ever calls into this -- it never defines how
/// a real implementation computes its answer.
pub trait Predictor: Send + Sync {
    /// Evaluates a batch of leaf states, returning one policy vector
    /// (length `POLICY_DIMENSION`, non-negative, summing to 1 over the
    /// full vocabulary) and one scalar value in `[-1, 1]` from the
    /// side-to-move's perspective, per input state, in the same order.
    fn evaluate(&self, states: &[GameState]) -> (Vec<Vec<f32>>, Vec<f32>);
}

/// A `Predictor` that knows nothing about the position: uniform policy,
/// value fixed at a configured draw score. Exercises the PUCT/expansion
/// path end-to-end without a real neural network, in the spirit of the
/// reference engine's own test-only predictors.
pub struct UniformPredictor {
    pub draw_score: f32,
}

impl UniformPredictor {
    pub fn new(draw_score: f32) -> UniformPredictor {
        UniformPredictor { draw_score }
    }
}

impl Default for UniformPredictor {
    fn default() -> UniformPredictor {
        UniformPredictor::new(0.5)
    }
}

impl Predictor for UniformPredictor {
    fn evaluate(&self, states: &[GameState]) -> (Vec<Vec<f32>>, Vec<f32>) {
        let uniform = vec![1.0 / POLICY_DIMENSION as f32; POLICY_DIMENSION];
        let policies = states.iter().map(|_| uniform.clone()).collect();
        let values = states.iter().map(|_| self.draw_score).collect();
        (policies, values)
    }
}

/// A `Predictor` derived from the static position heuristic instead of a
/// trained network: value is the heuristic score squashed into `[-1, 1]`
/// via `tanh`, policy is uniform (the heuristic scores *positions*, not
/// individual candidate moves, so it cannot rank them without first
/// applying each one -- left to the simulation-path rollout instead).
pub struct HeuristicPredictor {
    pub weights: HeuristicWeights,
}

impl HeuristicPredictor {
    pub fn new(weights: HeuristicWeights) -> HeuristicPredictor {
        HeuristicPredictor { weights }
    }
}

impl Default for HeuristicPredictor {
    fn default() -> HeuristicPredictor {
        HeuristicPredictor::new(HeuristicWeights::default())
    }
}

impl Predictor for HeuristicPredictor {
    fn evaluate(&self, states: &[GameState]) -> (Vec<Vec<f32>>, Vec<f32>) {
        let uniform = vec![1.0 / POLICY_DIMENSION as f32; POLICY_DIMENSION];
        let policies = states.iter().map(|_| uniform.clone()).collect();
        let values = states
            .iter()
            .map(|state| evaluate(state, state.side_to_move, &self.weights).tanh())
            .collect();
        (policies, values)
    }
}

/// One pending evaluation (spec §3): the leaf's state, the output slots
/// the master fills, and the condvar the submitting worker sleeps on.
struct Slot {
    ready: bool,
    policy: Vec<f32>,
    value: f32,
}

struct Request {
    state: GameState,
    slot: Arc<(Mutex<Slot>, Condvar)>,
}

/// The shared queue of spec §4.8: up to `batch_max` requests, a mutex, and
/// a "batch ready" condition the master waits on with a latency deadline.
pub struct InferenceQueue {
    inner: Mutex<QueueState>,
    batch_ready: Condvar,
    batch_max: usize,
    batch_deadline: Duration,

    /// Substituted for a request's value (and its policy, uniformly) when
    /// `drain_and_evaluate` catches the `Predictor` returning a malformed
    /// batch (spec §7's `EvaluatorFailed`): the affected requests fall
    /// back to this draw score and the search continues rather than
    /// propagating the error mid-descent.
    draw_score: f32,
}

struct QueueState {
    pending: VecDeque<Request>,
    shutdown: bool,
}

/// The outcome of submitting a leaf for evaluation.
pub enum SubmitOutcome {
    Evaluated { policy: Vec<f32>, value: f32 },
    ShutDown,
}

impl InferenceQueue {
    pub fn new(batch_max: usize, batch_deadline: Duration, draw_score: f32) -> InferenceQueue {
        InferenceQueue {
            inner: Mutex::new(QueueState { pending: VecDeque::new(), shutdown: false }),
            batch_ready: Condvar::new(),
            batch_max,
            batch_deadline,
            draw_score,
        }
    }

    /// A worker's half of spec §4.8: enqueue `state`, signal the master
    /// once `batch_max` requests have accumulated, and block on this
    /// request's own condvar until the master serves it or shutdown is
    /// observed. Implements the documented backpressure policy when the
    /// queue is already full: signal, release, yield, retry.
    pub fn submit(&self, state: GameState) -> SubmitOutcome {
        let slot = Arc::new((Mutex::new(Slot { ready: false, policy: Vec::new(), value: 0.0 }), Condvar::new()));
        let backoff = Backoff::new();

        {
            let mut guard = self.inner.lock().expect("inference queue mutex poisoned");
            loop {
                if guard.shutdown {
                    return SubmitOutcome::ShutDown;
                }

                if guard.pending.len() < self.batch_max {
                    guard.pending.push_back(Request { state, slot: slot.clone() });
                    if guard.pending.len() >= self.batch_max {
                        self.batch_ready.notify_one();
                    }
                    break;
                }

                // Queue full: wake the master, release the lock, yield,
                // and retry (spec §4.8's documented backpressure policy).
                self.batch_ready.notify_one();
                drop(guard);
                backoff.snooze();
                guard = self.inner.lock().expect("inference queue mutex poisoned");
            }
        }

        let (slot_mutex, slot_cond) = &*slot;
        let mut slot_guard = slot_mutex.lock().expect("request slot mutex poisoned");
        while !slot_guard.ready {
            if self.is_shutdown() {
                // Shutdown was observed before this request was served;
                // the waiter must check under the queue mutex, not just
                // trust its own `ready` bit (spec §5).
                return SubmitOutcome::ShutDown;
            }
            let (guard, timeout) = slot_cond
                .wait_timeout(slot_guard, Duration::from_millis(5))
                .expect("request slot condvar poisoned");
            slot_guard = guard;
            let _ = timeout;
        }

        SubmitOutcome::Evaluated { policy: slot_guard.policy.clone(), value: slot_guard.value }
    }

    fn is_shutdown(&self) -> bool {
        self.inner.lock().expect("inference queue mutex poisoned").shutdown
    }

    /// The master's half of spec §4.8: wait for `batch_ready` up to the
    /// configured latency deadline, then -- if anything is pending --
    /// atomically swap it out into a local snapshot, evaluate it through
    /// `predictor`, and wake every waiter with its result. Returns the
    /// number of requests served, `0` if the deadline passed with nothing
    /// pending (the caller should treat that as "nothing to do this
    /// tick", not an error).
    pub fn drain_and_evaluate(&self, predictor: &dyn Predictor) -> usize {
        let mut guard = self.inner.lock().expect("inference queue mutex poisoned");

        if guard.pending.is_empty() && !guard.shutdown {
            let (g, _) = self
                .batch_ready
                .wait_timeout(guard, self.batch_deadline)
                .expect("inference queue condvar poisoned");
            guard = g;
        }

        if guard.pending.is_empty() {
            return 0;
        }

        let batch: Vec<Request> = guard.pending.drain(..).collect();
        drop(guard);

        let states: Vec<GameState> = batch.iter().map(|r| r.state.clone()).collect();
        let (policies, values) = predictor.evaluate(&states);
        let served = batch.len();

        if policies.len() != served || values.len() != served {
            log::warn!(
                "evaluator returned {} policies and {} values for a batch of {}; falling back to the draw score for all of them",
                policies.len(), values.len(), served,
            );
            for request in batch {
                self.serve_with_fallback(&request);
            }
            return served;
        }

        for (request, (policy, value)) in batch.into_iter().zip(policies.into_iter().zip(values)) {
            if self.is_malformed(&policy, value) {
                log::warn!("evaluator returned a malformed policy/value pair; falling back to the draw score");
                self.serve_with_fallback(&request);
                continue;
            }

            let (slot_mutex, slot_cond) = &*request.slot;
            let mut slot_guard = slot_mutex.lock().expect("request slot mutex poisoned");
            slot_guard.policy = policy;
            slot_guard.value = value;
            slot_guard.ready = true;
            drop(slot_guard);
            slot_cond.notify_one();
        }

        served
    }

    /// Spec §7's `EvaluatorFailed` recovery: a uniform policy and the
    /// configured draw score, so a malformed batch degrades search quality
    /// for the affected leaves instead of poisoning the whole run.
    fn serve_with_fallback(&self, request: &Request) {
        let (slot_mutex, slot_cond) = &*request.slot;
        let mut slot_guard = slot_mutex.lock().expect("request slot mutex poisoned");
        slot_guard.policy = vec![1.0 / POLICY_DIMENSION as f32; POLICY_DIMENSION];
        slot_guard.value = self.draw_score;
        slot_guard.ready = true;
        drop(slot_guard);
        slot_cond.notify_one();
    }

    fn is_malformed(&self, policy: &[f32], value: f32) -> bool {
        policy.len() != POLICY_DIMENSION
            || policy.iter().any(|p| !p.is_finite() || *p < 0.0)
            || !value.is_finite()
            || !(-1.0..=1.0).contains(&value)
    }

    /// Cooperative shutdown (spec §4.8/§5): sets the shutdown flag and
    /// wakes the master and every in-flight waiter so nobody blocks
    /// forever past this point.
    pub fn shutdown(&self) {
        {
            let mut guard = self.inner.lock().expect("inference queue mutex poisoned");
            guard.shutdown = true;
        }
        self.batch_ready.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("inference queue mutex poisoned").pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
