//! Betting-market aggregation over the scoreline grid.
//!
//! Collapses the joint distribution into the 1X2 split, both-teams-to-score
//! and over/under 2.5 goals, then attaches a risk index and a qualitative
//! recommendation. Field names and the percent scale are an observable
//! contract with existing consumers of the JSON payload.

use serde::{Deserialize, Serialize};

use super::expected_goals::ExpectedGoals;
use super::score_matrix::ScoreMatrix;

/// Risk index above which a fixture is labelled high confidence.
pub const HIGH_CONFIDENCE_RISK_INDEX: f64 = 45.0;

/// Risk index above which a fixture is labelled moderate confidence.
pub const MODERATE_CONFIDENCE_RISK_INDEX: f64 = 25.0;

pub const HIGH_CONFIDENCE_LABEL: &str = "Alta confiança";
pub const MODERATE_CONFIDENCE_LABEL: &str = "Moderada confiança";
pub const BALANCED_LABEL: &str = "Jogo equilibrado";

/// Combined goal count from which a scoreline counts toward over 2.5.
const OVER_GOAL_THRESHOLD: u32 = 3;

/// Full-precision outcome percentages for one fixture.
///
/// `win_home + draw + win_away` is exactly 100 after renormalization against
/// the truncated grid; the BTTS and over/under pairs are complements by
/// construction. Use [`OutcomeSummary::rounded`] for the published payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeSummary {
    pub win_home: f64,
    pub draw: f64,
    pub win_away: f64,
    pub btts_yes: f64,
    pub btts_no: f64,
    pub over25: f64,
    pub under25: f64,
    pub expected_goals_home: f64,
    pub expected_goals_away: f64,
    pub risk_index: f64,
    pub recommendation: String,
}

/// Collapse a scoreline grid into the outcome summary.
pub fn summarize(matrix: &ScoreMatrix, goals: ExpectedGoals) -> OutcomeSummary {
    let mut win_home = 0.0;
    let mut draw = 0.0;
    let mut win_away = 0.0;
    let mut btts = 0.0;
    let mut over = 0.0;

    for i in 0..=matrix.cutoff() {
        for j in 0..=matrix.cutoff() {
            let p = matrix.prob(i, j);
            if i > j {
                win_home += p;
            } else if i == j {
                draw += p;
            } else {
                win_away += p;
            }
            if i > 0 && j > 0 {
                btts += p;
            }
            if i + j >= OVER_GOAL_THRESHOLD {
                over += p;
            }
        }
    }

    // The grid truncation leaves a small tail outside [0, cutoff]^2, so the
    // raw 1X2 total lands slightly below one. Renormalize the split against
    // its own total; the binary markets stay on the truncated mass and close
    // via their complements instead.
    let total = win_home + draw + win_away;
    let win_home = win_home / total * 100.0;
    let draw = draw / total * 100.0;
    let win_away = win_away / total * 100.0;

    let btts_yes = btts * 100.0;
    let over25 = over * 100.0;
    let risk_index = (win_home - win_away).abs();

    OutcomeSummary {
        win_home,
        draw,
        win_away,
        btts_yes,
        btts_no: 100.0 - btts_yes,
        over25,
        under25: 100.0 - over25,
        expected_goals_home: goals.lambda,
        expected_goals_away: goals.mu,
        risk_index,
        recommendation: recommendation_for(risk_index).to_string(),
    }
}

fn recommendation_for(risk_index: f64) -> &'static str {
    if risk_index > HIGH_CONFIDENCE_RISK_INDEX {
        HIGH_CONFIDENCE_LABEL
    } else if risk_index > MODERATE_CONFIDENCE_RISK_INDEX {
        MODERATE_CONFIDENCE_LABEL
    } else {
        BALANCED_LABEL
    }
}

impl OutcomeSummary {
    /// Round the percent fields to `decimals` places for publication.
    ///
    /// `draw` and the binary complements are re-derived from the rounded
    /// values so the sum-to-100 invariants hold exactly at any precision.
    pub fn rounded(&self, decimals: u32) -> OutcomeSummary {
        let win_home = round_to(self.win_home, decimals);
        let win_away = round_to(self.win_away, decimals);
        let draw = round_to(100.0 - win_home - win_away, decimals);
        let btts_yes = round_to(self.btts_yes, decimals);
        let over25 = round_to(self.over25, decimals);
        let risk_index = round_to((win_home - win_away).abs(), decimals);

        OutcomeSummary {
            win_home,
            draw,
            win_away,
            btts_yes,
            btts_no: round_to(100.0 - btts_yes, decimals),
            over25,
            under25: round_to(100.0 - over25, decimals),
            expected_goals_home: round_to(self.expected_goals_home, 2),
            expected_goals_away: round_to(self.expected_goals_away, 2),
            risk_index,
            recommendation: self.recommendation.clone(),
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
