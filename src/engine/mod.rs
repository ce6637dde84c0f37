pub mod expected_goals;
pub mod form;
pub mod outcome;
pub mod predictor;
pub mod prognosis;
pub mod score_matrix;

pub use form::MatchResult;
pub use outcome::OutcomeSummary;
pub use predictor::{MatchPredictor, ModelParams};
pub use prognosis::{form_prognosis, FormPrognosis, HeadToHead};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which side of the fixture a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => write!(f, "home"),
            Side::Away => write!(f, "away"),
        }
    }
}

/// Engine failures are values returned to the caller, never panics.
///
/// A zero expected-goals side is NOT an error (a team that never scored in
/// its window produces a valid, degenerate distribution); an empty match
/// history is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The given side's recent-match window was empty.
    #[error("insufficient match history for the {0} side")]
    InsufficientData(Side),
}
