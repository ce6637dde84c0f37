//! Head-to-head form prognosis.
//!
//! A simple score tally alongside the Poisson model: both sides start level
//! and collect points for prior wins, with head-to-head meetings worth more
//! than general form. Winner policy: a decided winner credits only the
//! winning side's bucket; a meeting without a decided winner (draw,
//! abandonment, missing data) credits neither side, and a team's own past
//! losses never credit the opponent.

use serde::{Deserialize, Serialize};

use super::form::MatchResult;
use super::outcome::round_to;
use super::Side;

/// Starting score for each side before any history is applied.
pub const BASE_FORM_SCORE: f64 = 50.0;

/// Points for winning a prior head-to-head meeting.
pub const H2H_WIN_POINTS: f64 = 2.0;

/// Points for a win inside a team's own recent window.
pub const RECENT_WIN_POINTS: f64 = 1.5;

/// One prior meeting between the two teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    /// `None` when the meeting produced no decided winner.
    pub winner: Option<Side>,
}

/// Relative form strength as percentages summing to 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPrognosis {
    pub home_win: f64,
    pub away_win: f64,
}

impl FormPrognosis {
    pub fn rounded(&self, decimals: u32) -> FormPrognosis {
        let home_win = round_to(self.home_win, decimals);
        FormPrognosis {
            home_win,
            away_win: round_to(100.0 - home_win, decimals),
        }
    }
}

/// Tally both sides' form scores and normalize to percentages.
pub fn form_prognosis(
    home_form: &[MatchResult],
    away_form: &[MatchResult],
    head_to_head: &[HeadToHead],
) -> FormPrognosis {
    let mut home_score = BASE_FORM_SCORE;
    let mut away_score = BASE_FORM_SCORE;

    for meeting in head_to_head {
        match meeting.winner {
            Some(Side::Home) => home_score += H2H_WIN_POINTS,
            Some(Side::Away) => away_score += H2H_WIN_POINTS,
            None => {}
        }
    }

    home_score += RECENT_WIN_POINTS * wins_in(home_form) as f64;
    away_score += RECENT_WIN_POINTS * wins_in(away_form) as f64;

    let total = home_score + away_score;
    FormPrognosis {
        home_win: home_score / total * 100.0,
        away_win: away_score / total * 100.0,
    }
}

fn wins_in(window: &[MatchResult]) -> usize {
    window
        .iter()
        .filter(|r| r.goals_for > r.goals_against)
        .count()
}
