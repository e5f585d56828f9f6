//! Turn bookkeeping for the active level.

use thief_master_core::DEFAULT_MOVE_BUDGET;

/// Protocol violations reported by the [`TurnController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    /// A turn was started while another one was still in progress.
    #[error("turn {turn} is already in progress")]
    AlreadyInProgress {
        /// Turn that is still running.
        turn: u32,
    },
    /// A turn was completed while no turn was in progress.
    #[error("no turn is in progress (last turn was {turn})")]
    NotInProgress {
        /// Most recently started turn.
        turn: u32,
    },
}

/// Turn counters captured after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnSnapshot {
    /// Number of the current turn.
    pub turn: u32,
    /// Moves left in the budget.
    pub remaining_moves: u32,
}

/// Two-state machine that gates one player action per turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnController {
    current_turn: u32,
    remaining_moves: u32,
    in_progress: bool,
    move_budget: u32,
}

impl TurnController {
    /// Creates an idle controller granting `move_budget` moves.
    #[must_use]
    pub const fn new(move_budget: u32) -> Self {
        Self {
            current_turn: 0,
            remaining_moves: move_budget,
            in_progress: false,
            move_budget,
        }
    }

    /// Begins the next turn.
    ///
    /// Fails without changing state when a turn is already running.
    pub fn start_next_turn(&mut self) -> Result<TurnSnapshot, TurnError> {
        if self.in_progress {
            return Err(TurnError::AlreadyInProgress {
                turn: self.current_turn,
            });
        }

        self.current_turn = self.current_turn.saturating_add(1);
        self.in_progress = true;
        Ok(self.snapshot())
    }

    /// Finishes the running turn and consumes one move.
    ///
    /// Fails without changing state when no turn is running. The budget
    /// saturates at zero.
    pub fn complete_turn(&mut self) -> Result<TurnSnapshot, TurnError> {
        if !self.in_progress {
            return Err(TurnError::NotInProgress {
                turn: self.current_turn,
            });
        }

        self.remaining_moves = self.remaining_moves.saturating_sub(1);
        self.in_progress = false;
        Ok(self.snapshot())
    }

    /// Returns to the idle state with a fresh budget.
    pub fn reset(&mut self) {
        self.current_turn = 0;
        self.remaining_moves = self.move_budget;
        self.in_progress = false;
    }

    /// Number of the most recently started turn.
    #[must_use]
    pub const fn current_turn(&self) -> u32 {
        self.current_turn
    }

    /// Moves left in the budget.
    #[must_use]
    pub const fn remaining_moves(&self) -> u32 {
        self.remaining_moves
    }

    /// Reports whether a turn is running.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Current counters.
    #[must_use]
    pub const fn snapshot(&self) -> TurnSnapshot {
        TurnSnapshot {
            turn: self.current_turn,
            remaining_moves: self.remaining_moves,
        }
    }
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_BUDGET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_then_complete_advances_once() {
        let mut turns = TurnController::new(3);

        let started = turns.start_next_turn().expect("idle controller starts");
        assert_eq!(
            started,
            TurnSnapshot {
                turn: 1,
                remaining_moves: 3
            }
        );
        assert!(turns.is_in_progress());

        let completed = turns.complete_turn().expect("running turn completes");
        assert_eq!(
            completed,
            TurnSnapshot {
                turn: 1,
                remaining_moves: 2
            }
        );
        assert!(!turns.is_in_progress());
    }

    #[test]
    fn complete_without_start_changes_nothing() {
        let mut turns = TurnController::default();
        let before = turns.clone();

        assert_eq!(
            turns.complete_turn(),
            Err(TurnError::NotInProgress { turn: 0 })
        );
        assert_eq!(turns, before);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut turns = TurnController::default();
        let _ = turns.start_next_turn().expect("first start succeeds");
        let before = turns.clone();

        assert_eq!(
            turns.start_next_turn(),
            Err(TurnError::AlreadyInProgress { turn: 1 })
        );
        assert_eq!(turns, before);
    }

    #[test]
    fn budget_saturates_at_zero() {
        let mut turns = TurnController::new(1);
        for _ in 0..3 {
            let _ = turns.start_next_turn().expect("start");
            let _ = turns.complete_turn().expect("complete");
        }
        assert_eq!(turns.current_turn(), 3);
        assert_eq!(turns.remaining_moves(), 0);
    }

    #[test]
    fn reset_restores_initial_budget() {
        let mut turns = TurnController::new(4);
        let _ = turns.start_next_turn().expect("start");
        let _ = turns.complete_turn().expect("complete");
        let _ = turns.start_next_turn().expect("start");

        turns.reset();
        assert_eq!(turns, TurnController::new(4));
    }
}
