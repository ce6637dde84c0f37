//! The full prediction pipeline: form -> expected goals -> scoreline grid ->
//! outcome summary.

use super::expected_goals::{self, DEFAULT_LEAGUE_BASELINE};
use super::form::{self, MatchResult, DEFAULT_RECENT_WEIGHT, DEFAULT_RECENT_WINDOW};
use super::outcome::{self, OutcomeSummary};
use super::score_matrix::{self, DEFAULT_DIXON_COLES_RHO, DEFAULT_SCORE_CUTOFF};
use super::{EngineError, Side};

/// Tunables for the statistical model. Defaults match the published model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    /// League-average total goals per match.
    pub league_baseline: f64,
    /// Number of most-recent matches that get the recency weight.
    pub recent_window: usize,
    /// Weight multiplier inside the recency window.
    pub recent_weight: f64,
    /// Maximum goals per side in the scoreline grid.
    pub score_cutoff: u32,
    /// Dixon-Coles low-score correlation parameter.
    pub dixon_coles_rho: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            league_baseline: DEFAULT_LEAGUE_BASELINE,
            recent_window: DEFAULT_RECENT_WINDOW,
            recent_weight: DEFAULT_RECENT_WEIGHT,
            score_cutoff: DEFAULT_SCORE_CUTOFF,
            dixon_coles_rho: DEFAULT_DIXON_COLES_RHO,
        }
    }
}

/// Stateless match-outcome predictor.
///
/// Holds only the model tunables; every prediction computes fresh from the
/// supplied windows, so a single instance is safe to share across tasks.
#[derive(Debug, Clone)]
pub struct MatchPredictor {
    params: ModelParams,
}

impl MatchPredictor {
    pub fn new(params: ModelParams) -> Self {
        MatchPredictor { params }
    }

    /// Produce the outcome summary for one fixture.
    ///
    /// Both windows are most-recent-first. An empty window on either side
    /// surfaces as `EngineError::InsufficientData` for that side.
    pub fn predict(
        &self,
        home_form: &[MatchResult],
        away_form: &[MatchResult],
    ) -> Result<OutcomeSummary, EngineError> {
        let home = form::weighted_rates(
            Side::Home,
            home_form,
            self.params.recent_window,
            self.params.recent_weight,
        )?;
        let away = form::weighted_rates(
            Side::Away,
            away_form,
            self.params.recent_window,
            self.params.recent_weight,
        )?;

        let goals = expected_goals::expected_goals(home, away, self.params.league_baseline);
        let matrix = score_matrix::build(goals, self.params.score_cutoff, self.params.dixon_coles_rho);
        Ok(outcome::summarize(&matrix, goals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn repeat(goals_for: u32, goals_against: u32, n: usize) -> Vec<MatchResult> {
        vec![
            MatchResult {
                goals_for,
                goals_against,
            };
            n
        ]
    }

    #[test]
    fn empty_home_window_reports_the_home_side() {
        let predictor = MatchPredictor::new(ModelParams::default());
        let err = predictor.predict(&[], &repeat(1, 1, 5)).unwrap_err();
        assert_eq!(err, EngineError::InsufficientData(Side::Home));
    }

    #[test]
    fn empty_away_window_reports_the_away_side() {
        let predictor = MatchPredictor::new(ModelParams::default());
        let err = predictor.predict(&repeat(1, 1, 5), &[]).unwrap_err();
        assert_eq!(err, EngineError::InsufficientData(Side::Away));
    }

    #[test]
    fn stronger_home_form_favours_the_home_side() {
        // Five 2-1 wins against five 1-2 losses at the default baseline:
        // the home side must carry both the higher expected goals and the
        // higher win probability.
        let predictor = MatchPredictor::new(ModelParams::default());
        let summary = predictor
            .predict(&repeat(2, 1, 5), &repeat(1, 2, 5))
            .unwrap();

        assert!(summary.expected_goals_home > summary.expected_goals_away);
        assert!(summary.win_home > summary.win_away);
        assert_relative_eq!(
            summary.win_home + summary.draw + summary.win_away,
            100.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn mirrored_forms_swap_the_win_probabilities() {
        let predictor = MatchPredictor::new(ModelParams::default());
        let strong = repeat(3, 0, 6);
        let weak = repeat(0, 2, 6);
        let forward = predictor.predict(&strong, &weak).unwrap();
        let reversed = predictor.predict(&weak, &strong).unwrap();

        assert_relative_eq!(forward.win_home, reversed.win_away, epsilon = 1e-9);
        assert_relative_eq!(forward.win_away, reversed.win_home, epsilon = 1e-9);
        assert_relative_eq!(forward.draw, reversed.draw, epsilon = 1e-9);
    }

    #[test]
    fn scoreless_history_is_a_valid_degenerate_case() {
        let predictor = MatchPredictor::new(ModelParams::default());
        let summary = predictor
            .predict(&repeat(0, 0, 5), &repeat(0, 0, 5))
            .unwrap();
        assert_relative_eq!(summary.expected_goals_home, 0.0, epsilon = 1e-12);
        assert_relative_eq!(summary.draw, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn custom_params_flow_through_the_pipeline() {
        let params = ModelParams {
            league_baseline: 3.2,
            recent_window: 3,
            recent_weight: 2.0,
            score_cutoff: 8,
            dixon_coles_rho: 0.0,
        };
        let predictor = MatchPredictor::new(params);
        let summary = predictor
            .predict(&repeat(2, 1, 5), &repeat(1, 1, 5))
            .unwrap();
        assert!(summary.win_home > summary.win_away);
    }
}
