//! Bounded scoreline probability grid.
//!
//! The joint distribution over final scores is an independent-Poisson
//! product with a Dixon-Coles correction on the four lowest-scoring cells,
//! which real-world data shows are mispriced by the plain product (too few
//! low draws, too many 1-0/0-1).
//!
//! The grid is truncated at `cutoff` goals per side, so its total mass is
//! slightly below one (for realistic rates the missing tail is well under
//! 1%). The truncation error is accepted as-is here; the 1X2 aggregation
//! renormalizes its own split and everything else is reported against the
//! truncated mass.

use tracing::warn;

use super::expected_goals::ExpectedGoals;

/// Maximum goals per side in the grid, inclusive.
pub const DEFAULT_SCORE_CUTOFF: u32 = 6;

/// Dixon-Coles low-score correlation parameter.
pub const DEFAULT_DIXON_COLES_RHO: f64 = -0.1;

/// Largest k evaluated with a direct factorial; beyond this the pmf switches
/// to log-space to keep large cutoffs from overflowing.
const DIRECT_EVAL_MAX_K: u32 = 20;

/// Joint scoreline probabilities for home goals `i` and away goals `j`,
/// both in `[0, cutoff]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    cutoff: u32,
    cells: Vec<f64>,
}

impl ScoreMatrix {
    pub fn cutoff(&self) -> u32 {
        self.cutoff
    }

    /// Probability of the exact scoreline `home_goals:away_goals`.
    pub fn prob(&self, home_goals: u32, away_goals: u32) -> f64 {
        debug_assert!(home_goals <= self.cutoff && away_goals <= self.cutoff);
        self.cells[self.index(home_goals, away_goals)]
    }

    /// Total probability mass inside the truncated grid.
    #[allow(dead_code)]
    pub fn total_mass(&self) -> f64 {
        self.cells.iter().sum()
    }

    fn index(&self, home_goals: u32, away_goals: u32) -> usize {
        (home_goals * (self.cutoff + 1) + away_goals) as usize
    }
}

/// Build the scoreline grid for the given expected goals.
///
/// When `rho` is large relative to `1/lambda` or `1/mu` the correction can
/// push a corrected cell below zero; those cells are clamped to zero before
/// they can corrupt downstream totals, and the clamp is logged.
pub fn build(goals: ExpectedGoals, cutoff: u32, rho: f64) -> ScoreMatrix {
    let size = (cutoff + 1) as usize;
    let mut cells = vec![0.0; size * size];

    let home_pmf: Vec<f64> = (0..=cutoff).map(|k| poisson_pmf(k, goals.lambda)).collect();
    let away_pmf: Vec<f64> = (0..=cutoff).map(|k| poisson_pmf(k, goals.mu)).collect();

    let mut clamped = 0usize;
    for i in 0..=cutoff {
        for j in 0..=cutoff {
            let base = home_pmf[i as usize] * away_pmf[j as usize];
            let cell = base * low_score_correction(i, j, goals.lambda, goals.mu, rho);
            if cell < 0.0 {
                clamped += 1;
            }
            cells[(i * (cutoff + 1) + j) as usize] = cell.max(0.0);
        }
    }

    if clamped > 0 {
        warn!(
            "Dixon-Coles correction produced {} negative cell(s) for lambda={:.3}, mu={:.3}, rho={:.3}; clamped to zero",
            clamped, goals.lambda, goals.mu, rho
        );
    }

    ScoreMatrix { cutoff, cells }
}

/// Dixon-Coles tau factor: reshapes the four lowest-scoring cells, leaves
/// everything else untouched.
fn low_score_correction(i: u32, j: u32, lambda: f64, mu: f64, rho: f64) -> f64 {
    match (i, j) {
        (0, 0) => 1.0 - lambda * mu * rho,
        (0, 1) => 1.0 + lambda * rho,
        (1, 0) => 1.0 + mu * rho,
        (1, 1) => 1.0 - rho,
        _ => 1.0,
    }
}

/// Poisson probability mass `e^-rate * rate^k / k!`.
///
/// Direct evaluation up to `DIRECT_EVAL_MAX_K`; log-space beyond, since the
/// factorial grows past what f64 holds long before k gets interesting.
pub(crate) fn poisson_pmf(k: u32, rate: f64) -> f64 {
    if rate <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if k <= DIRECT_EVAL_MAX_K {
        (-rate).exp() * rate.powi(k as i32) / factorial(k)
    } else {
        (f64::from(k) * rate.ln() - rate - ln_factorial(k)).exp()
    }
}

fn factorial(k: u32) -> f64 {
    (2..=k).fold(1.0, |acc, i| acc * f64::from(i))
}

fn ln_factorial(k: u32) -> f64 {
    (2..=k).map(|i| f64::from(i).ln()).sum()
}
