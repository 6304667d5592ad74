//! Win/lose state machine.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::PuzzleRules;

/// Outcome of the current attempt.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PuzzleOutcome {
    /// Ball still in play.
    #[default]
    Playing,
    /// Ball came to rest on the goal. Terminal until reset.
    Won,
    /// Ball fell off the playfield. Terminal until reset.
    Lost,
}

impl PuzzleOutcome {
    pub fn is_terminal(self) -> bool {
        self != Self::Playing
    }
}

/// Evaluates the ball against the floor and the goal zone once per step.
#[derive(Debug, Clone, Default)]
pub struct PuzzleStateMachine {
    outcome: PuzzleOutcome,
    rules: PuzzleRules,
}

impl PuzzleStateMachine {
    pub fn new(rules: PuzzleRules) -> Self {
        Self {
            outcome: PuzzleOutcome::Playing,
            rules,
        }
    }

    pub fn outcome(&self) -> PuzzleOutcome {
        self.outcome
    }

    pub fn rules(&self) -> &PuzzleRules {
        &self.rules
    }

    /// Advances the state from the latest ball and goal positions.
    ///
    /// Returns the new outcome only on the step that leaves `Playing`; every
    /// later call returns `None` until [`reset`](Self::reset). Without a ball
    /// nothing is checked, and without a goal only the lose check runs.
    pub fn evaluate(&mut self, ball: Option<Vec3>, goal: Option<Vec3>) -> Option<PuzzleOutcome> {
        if self.outcome.is_terminal() {
            return None;
        }
        let ball = ball?;

        if ball.y < self.rules.lose_floor_y {
            self.outcome = PuzzleOutcome::Lost;
            return Some(self.outcome);
        }

        let goal = goal?;
        let half = self.rules.goal_half_extent;
        let (low, high) = self.rules.win_band;
        let in_x = (ball.x - goal.x).abs() < half;
        let in_z = (ball.z - goal.z).abs() < half;
        let near_y = ball.y > low && ball.y < high;

        if in_x && in_z && near_y {
            self.outcome = PuzzleOutcome::Won;
            return Some(self.outcome);
        }
        None
    }

    /// Returns to `Playing` from any state.
    pub fn reset(&mut self) {
        self.outcome = PuzzleOutcome::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOAL: Vec3 = Vec3::new(0.0, 0.05, 1.5);

    #[test]
    fn test_initial_state() {
        let machine = PuzzleStateMachine::default();
        assert_eq!(machine.outcome(), PuzzleOutcome::Playing);
    }

    #[test]
    fn test_ball_in_goal_wins() {
        let mut machine = PuzzleStateMachine::default();
        let result = machine.evaluate(Some(Vec3::new(0.2, 0.5, 1.4)), Some(GOAL));
        assert_eq!(result, Some(PuzzleOutcome::Won));
        assert_eq!(machine.outcome(), PuzzleOutcome::Won);
    }

    #[test]
    fn test_win_band_is_open() {
        let mut machine = PuzzleStateMachine::default();
        assert_eq!(machine.evaluate(Some(Vec3::new(0.0, 1.0, 1.5)), Some(GOAL)), None);
        assert_eq!(machine.evaluate(Some(Vec3::new(0.0, 0.0, 1.5)), Some(GOAL)), None);
        assert_eq!(machine.evaluate(Some(Vec3::new(1.0, 0.5, 1.5)), Some(GOAL)), None);
        assert_eq!(machine.evaluate(Some(Vec3::new(0.0, 0.5, 2.5)), Some(GOAL)), None);
        assert_eq!(machine.outcome(), PuzzleOutcome::Playing);
    }

    #[test]
    fn test_falling_below_floor_loses() {
        let mut machine = PuzzleStateMachine::default();
        assert_eq!(machine.evaluate(Some(Vec3::new(5.0, -1.9, 0.0)), Some(GOAL)), None);
        assert_eq!(
            machine.evaluate(Some(Vec3::new(5.0, -2.1, 0.0)), Some(GOAL)),
            Some(PuzzleOutcome::Lost)
        );
    }

    #[test]
    fn test_outcome_fires_once() {
        let mut machine = PuzzleStateMachine::default();
        let lost = Some(Vec3::new(0.0, -3.0, 0.0));

        assert_eq!(machine.evaluate(lost, Some(GOAL)), Some(PuzzleOutcome::Lost));
        for _ in 0..10 {
            assert_eq!(machine.evaluate(lost, Some(GOAL)), None);
        }
        // A winning position does not override a loss either.
        assert_eq!(machine.evaluate(Some(Vec3::new(0.0, 0.5, 1.5)), Some(GOAL)), None);
        assert_eq!(machine.outcome(), PuzzleOutcome::Lost);
    }

    #[test]
    fn test_reset_allows_new_outcome() {
        let mut machine = PuzzleStateMachine::default();
        machine.evaluate(Some(Vec3::new(0.0, 0.5, 1.5)), Some(GOAL));
        machine.reset();
        machine.reset();

        assert_eq!(machine.outcome(), PuzzleOutcome::Playing);
        assert_eq!(
            machine.evaluate(Some(Vec3::new(0.0, -5.0, 0.0)), Some(GOAL)),
            Some(PuzzleOutcome::Lost)
        );
    }

    #[test]
    fn test_missing_objects_disable_checks() {
        let mut machine = PuzzleStateMachine::default();
        assert_eq!(machine.evaluate(None, Some(GOAL)), None);

        // No goal: winning is impossible but losing still works.
        assert_eq!(machine.evaluate(Some(Vec3::new(0.0, 0.5, 1.5)), None), None);
        assert_eq!(
            machine.evaluate(Some(Vec3::new(0.0, -2.5, 0.0)), None),
            Some(PuzzleOutcome::Lost)
        );
    }

    #[test]
    fn test_custom_rules() {
        let rules = PuzzleRules {
            lose_floor_y: -10.0,
            goal_half_extent: 2.0,
            win_band: (0.0, 3.0),
        };
        let mut machine = PuzzleStateMachine::new(rules);

        assert_eq!(machine.evaluate(Some(Vec3::new(0.0, -5.0, 0.0)), Some(GOAL)), None);
        assert_eq!(
            machine.evaluate(Some(Vec3::new(1.5, 2.5, 1.5)), Some(GOAL)),
            Some(PuzzleOutcome::Won)
        );
    }
}
