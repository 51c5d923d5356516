//! Per-run loop bookkeeping and the outcome handed back to callers

use serde::{Deserialize, Serialize};

/// How a task run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model stopped requesting actions
    Completed,
    /// `max_attempts` ran out first
    BudgetExhausted,
}

/// Mutable state of one loop run. Created at start, dropped at return.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub attempts_used: u32,
    pub max_attempts: u32,
    pub last_response_text: String,
    pub terminated: bool,
}

impl LoopState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts_used: 0,
            max_attempts,
            last_response_text: String::new(),
            terminated: false,
        }
    }

    pub fn has_budget(&self) -> bool {
        self.attempts_used < self.max_attempts
    }

    pub fn termination(&self) -> Termination {
        if self.terminated {
            Termination::Completed
        } else {
            Termination::BudgetExhausted
        }
    }

    pub fn into_outcome(self) -> TaskOutcome {
        TaskOutcome {
            termination: self.termination(),
            text: self.last_response_text,
            attempts_used: self.attempts_used,
        }
    }
}

/// Result of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Text of the last reply
    pub text: String,
    /// Iterations that dispatched at least one request
    pub attempts_used: u32,
    pub termination: Termination,
}

impl TaskOutcome {
    /// Outer passes made, including the final one with no requests
    pub fn iterations(&self) -> u32 {
        match self.termination {
            Termination::Completed => self.attempts_used + 1,
            Termination::BudgetExhausted => self.attempts_used,
        }
    }

    pub fn completed(&self) -> bool {
        self.termination == Termination::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_budget() {
        let state = LoopState::new(2);
        assert!(state.has_budget());
        assert_eq!(state.termination(), Termination::BudgetExhausted);
    }

    #[test]
    fn test_iterations_counts_final_pass_on_completion() {
        let mut state = LoopState::new(10);
        state.attempts_used = 1;
        state.terminated = true;
        state.last_response_text = "Done.".into();

        let outcome = state.into_outcome();
        assert!(outcome.completed());
        assert_eq!(outcome.text, "Done.");
        assert_eq!(outcome.iterations(), 2);
    }

    #[test]
    fn test_iterations_on_exhaustion() {
        let mut state = LoopState::new(3);
        state.attempts_used = 3;
        assert!(!state.has_budget());

        let outcome = state.into_outcome();
        assert_eq!(outcome.termination, Termination::BudgetExhausted);
        assert_eq!(outcome.iterations(), 3);
    }
}
