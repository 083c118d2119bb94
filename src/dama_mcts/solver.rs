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

//! The proven-win/loss/draw lattice of spec §4.7, tracked alongside the
//! ordinary statistics so that a fully-solved subtree can short-circuit
//! search instead of continuing to sample it.

use std::sync::atomic::{AtomicU8, Ordering};

/// A node's solver status. `Unsolved` is the default; the other three are
/// terminal conclusions about the node's true game-theoretic value from
/// the perspective of the player to move *at that node*.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Unsolved,
    ProvenWin,
    ProvenLoss,
    ProvenDraw,
}

impl SolverStatus {
    fn to_u8(self) -> u8 {
        match self {
            SolverStatus::Unsolved => 0,
            SolverStatus::ProvenWin => 1,
            SolverStatus::ProvenLoss => 2,
            SolverStatus::ProvenDraw => 3,
        }
    }

    fn from_u8(raw: u8) -> SolverStatus {
        match raw {
            1 => SolverStatus::ProvenWin,
            2 => SolverStatus::ProvenLoss,
            3 => SolverStatus::ProvenDraw,
            _ => SolverStatus::Unsolved,
        }
    }

    /// The value this status contributes to selection from the
    /// perspective of the player to move at the solved node: a
    /// `ProvenWin`/`ProvenLoss` is treated as `1`/`0` (spec §4.7), a
    /// `ProvenDraw` as the configured draw score.
    pub fn as_value(self, draw_score: f32) -> Option<f32> {
        match self {
            SolverStatus::Unsolved => None,
            SolverStatus::ProvenWin => Some(1.0),
            SolverStatus::ProvenLoss => Some(0.0),
            SolverStatus::ProvenDraw => Some(draw_score),
        }
    }

    pub fn is_solved(self) -> bool {
        !matches!(self, SolverStatus::Unsolved)
    }
}

/// An atomic cell holding one `SolverStatus`, so a node can expose and
/// update it without a mutex.
#[derive(Debug)]
pub struct SolverCell(AtomicU8);

impl SolverCell {
    pub fn new(status: SolverStatus) -> SolverCell {
        SolverCell(AtomicU8::new(status.to_u8()))
    }

    pub fn load(&self) -> SolverStatus {
        SolverStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, status: SolverStatus) {
        self.0.store(status.to_u8(), Ordering::Release);
    }
}

impl Default for SolverCell {
    fn default() -> SolverCell {
        SolverCell::new(SolverStatus::Unsolved)
    }
}

/// Recomputes a node's solver status from its children's statuses (spec
/// §4.7), given as perspective-consistent values (every child's status is
/// from *that child's own* side-to-move perspective, hence a child
/// `ProvenLoss` -- a loss for the child's mover -- is a win for the
/// parent). Returns `None` when the node cannot yet be concluded, either
/// because not every legal move has produced a child yet (per this
/// engine's resolved Open Question, full expansion is required before a
/// `ProvenLoss` verdict) or because the children are a genuine mix that
/// settles nothing.
pub fn propagate(children: &[SolverStatus], fully_expanded: bool) -> Option<SolverStatus> {
    if children.is_empty() {
        return None;
    }

    if children.iter().any(|&status| status == SolverStatus::ProvenLoss) {
        // Any child that is a loss for its own mover is an immediate win
        // for us: we would simply play into that child.
        return Some(SolverStatus::ProvenWin);
    }

    if !fully_expanded {
        return None;
    }

    if children.iter().all(|&status| status == SolverStatus::ProvenWin) {
        // Every reply wins for the opponent: whatever we play, we lose.
        return Some(SolverStatus::ProvenLoss);
    }

    let all_solved = children.iter().all(|status| status.is_solved());
    let any_draw = children.iter().any(|&status| status == SolverStatus::ProvenDraw);

    if all_solved && any_draw {
        return Some(SolverStatus::ProvenDraw);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_child_loss_is_a_proven_win() {
        let children = [SolverStatus::Unsolved, SolverStatus::ProvenLoss];
        assert_eq!(propagate(&children, false), Some(SolverStatus::ProvenWin));
    }

    #[test]
    fn all_children_wins_requires_full_expansion() {
        let children = [SolverStatus::ProvenWin, SolverStatus::ProvenWin];
        assert_eq!(propagate(&children, false), None);
        assert_eq!(propagate(&children, true), Some(SolverStatus::ProvenLoss));
    }

    #[test]
    fn mixed_win_and_draw_with_no_loss_is_a_draw() {
        let children = [SolverStatus::ProvenWin, SolverStatus::ProvenDraw];
        assert_eq!(propagate(&children, true), Some(SolverStatus::ProvenDraw));
    }

    #[test]
    fn unsolved_child_blocks_any_conclusion_except_a_loss_shortcut() {
        let children = [SolverStatus::ProvenWin, SolverStatus::Unsolved];
        assert_eq!(propagate(&children, true), None);
    }

    #[test]
    fn solver_cell_round_trips() {
        let cell = SolverCell::new(SolverStatus::ProvenDraw);
        assert_eq!(cell.load(), SolverStatus::ProvenDraw);
        cell.store(SolverStatus::ProvenWin);
        assert_eq!(cell.load(), SolverStatus::ProvenWin);
    }
}
