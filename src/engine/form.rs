//! Recency-weighted form aggregation.
//!
//! A team's recent results are reduced to two per-match rates: goals scored
//! (attack) and goals conceded (defense). The most recent matches count more
//! than older ones, but the divisor stays the plain match count so the boost
//! raises the rates instead of re-averaging them away.

use serde::{Deserialize, Serialize};

use super::{EngineError, Side};

/// Matches at positions below this (0-indexed, most recent first) receive
/// the recency weight.
pub const DEFAULT_RECENT_WINDOW: usize = 5;

/// Weight multiplier for matches inside the recency window.
pub const DEFAULT_RECENT_WEIGHT: f64 = 1.5;

/// One completed match from a single team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub goals_for: u32,
    pub goals_against: u32,
}

/// Recency-weighted scoring rates for one team, in goals per match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamRates {
    pub attack_rate: f64,
    pub defense_rate: f64,
}

/// Reduce a most-recent-first window of results to weighted attack/defense
/// rates.
///
/// Each match at position `p` contributes with weight `recent_weight` when
/// `p < recent_window` and `1.0` otherwise; both sums are divided by the
/// unweighted window length.
///
/// Returns `EngineError::InsufficientData` for an empty window. That error
/// must reach the caller: substituting zero rates here would silently turn
/// "we know nothing about this team" into "this team never scores".
pub fn weighted_rates(
    side: Side,
    window: &[MatchResult],
    recent_window: usize,
    recent_weight: f64,
) -> Result<TeamRates, EngineError> {
    if window.is_empty() {
        return Err(EngineError::InsufficientData(side));
    }

    let mut attack = 0.0;
    let mut defense = 0.0;
    for (position, result) in window.iter().enumerate() {
        let weight = if position < recent_window {
            recent_weight
        } else {
            1.0
        };
        attack += weight * f64::from(result.goals_for);
        defense += weight * f64::from(result.goals_against);
    }

    let n = window.len() as f64;
    Ok(TeamRates {
        attack_rate: attack / n,
        defense_rate: defense / n,
    })
}
