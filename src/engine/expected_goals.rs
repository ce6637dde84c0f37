//! Expected-goals model.
//!
//! Both teams' rates are normalized against the league-average total goals
//! per match, then recombined: a side's expected goals is its normalized
//! attack times the opponent's normalized defense, scaled back to goals.

use super::form::TeamRates;

/// League-average total goals per match used to normalize team rates.
pub const DEFAULT_LEAGUE_BASELINE: f64 = 2.6;

/// Poisson rate parameters for the two sides of a fixture.
///
/// `lambda` is the home side's expected goal count, `mu` the away side's.
/// Either may be zero when a team never scored (or the opponent never
/// conceded) in its window; that is a valid degenerate input downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedGoals {
    pub lambda: f64,
    pub mu: f64,
}

/// Combine two teams' rates into per-side expected goals.
pub fn expected_goals(home: TeamRates, away: TeamRates, league_baseline: f64) -> ExpectedGoals {
    let home_attack = home.attack_rate / league_baseline;
    let home_defense = home.defense_rate / league_baseline;
    let away_attack = away.attack_rate / league_baseline;
    let away_defense = away.defense_rate / league_baseline;

    ExpectedGoals {
        lambda: home_attack * away_defense * league_baseline,
        mu: away_attack * home_defense * league_baseline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rates(attack_rate: f64, defense_rate: f64) -> TeamRates {
        TeamRates {
            attack_rate,
            defense_rate,
        }
    }

    #[test]
    fn matches_the_normalized_product_formula() {
        let home = rates(2.0, 1.0);
        let away = rates(1.2, 1.8);
        let xg = expected_goals(home, away, DEFAULT_LEAGUE_BASELINE);
        // lambda = (2.0/2.6) * (1.8/2.6) * 2.6, mu = (1.2/2.6) * (1.0/2.6) * 2.6
        assert_relative_eq!(xg.lambda, 2.0 * 1.8 / 2.6, epsilon = 1e-12);
        assert_relative_eq!(xg.mu, 1.2 * 1.0 / 2.6, epsilon = 1e-12);
    }

    #[test]
    fn positive_rates_give_positive_expected_goals() {
        let xg = expected_goals(rates(0.1, 0.1), rates(0.1, 0.1), DEFAULT_LEAGUE_BASELINE);
        assert!(xg.lambda > 0.0);
        assert!(xg.mu > 0.0);
    }

    #[test]
    fn zero_attack_rate_yields_zero_lambda_not_an_error() {
        let xg = expected_goals(rates(0.0, 1.0), rates(1.5, 1.5), DEFAULT_LEAGUE_BASELINE);
        assert_relative_eq!(xg.lambda, 0.0, epsilon = 1e-12);
        assert!(xg.mu > 0.0);
    }

    #[test]
    fn symmetric_inputs_give_symmetric_outputs() {
        let a = rates(1.7, 0.9);
        let b = rates(0.8, 1.4);
        let forward = expected_goals(a, b, DEFAULT_LEAGUE_BASELINE);
        let reversed = expected_goals(b, a, DEFAULT_LEAGUE_BASELINE);
        assert_relative_eq!(forward.lambda, reversed.mu, epsilon = 1e-12);
        assert_relative_eq!(forward.mu, reversed.lambda, epsilon = 1e-12);
    }
}
