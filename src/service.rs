//! Prediction service: owns the fixture provider, the predictor and the
//! caches, and assembles one report per fixture.
//!
//! Upstream fetches go through the adaptive cache, so repeated predictions
//! for the same teams within the TTL reuse the fetched histories, and
//! concurrent requests for the same team trigger a single upstream call.
//! The engine itself is stateless and recomputes on every request.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join3;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::cache::{AdaptiveCache, ComputeFailure};
use crate::engine::{
    form_prognosis, EngineError, FormPrognosis, HeadToHead, MatchPredictor, MatchResult,
    OutcomeSummary,
};
use crate::fixtures::FixtureProvider;

/// Everything computed for one fixture.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub outcome: OutcomeSummary,
    pub form_prognosis: FormPrognosis,
}

impl MatchReport {
    pub fn rounded(&self, decimals: u32) -> MatchReport {
        MatchReport {
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            outcome: self.outcome.rounded(decimals),
            form_prognosis: self.form_prognosis.rounded(decimals),
        }
    }
}

/// A prediction fails either because the data is missing (structured,
/// non-fatal) or because the upstream fetch failed (never cached).
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    InsufficientData(#[from] EngineError),
    #[error(transparent)]
    Fetch(#[from] ComputeFailure),
}

pub struct PredictionService {
    provider: Arc<dyn FixtureProvider>,
    predictor: MatchPredictor,
    form_cache: AdaptiveCache<Vec<MatchResult>>,
    h2h_cache: AdaptiveCache<Vec<HeadToHead>>,
    cache_ttl: Duration,
}

impl PredictionService {
    pub fn new(
        provider: Arc<dyn FixtureProvider>,
        predictor: MatchPredictor,
        cache_ttl: Duration,
    ) -> Self {
        PredictionService {
            provider,
            predictor,
            form_cache: AdaptiveCache::new(),
            h2h_cache: AdaptiveCache::new(),
            cache_ttl,
        }
    }

    async fn team_form(&self, team_id: u32) -> Result<Vec<MatchResult>, ComputeFailure> {
        let provider = Arc::clone(&self.provider);
        self.form_cache
            .get_or_compute(&format!("form:{team_id}"), self.cache_ttl, move || {
                async move { provider.recent_results(team_id).await }
            })
            .await
    }

    async fn head_to_head(
        &self,
        home_id: u32,
        away_id: u32,
    ) -> Result<Vec<HeadToHead>, ComputeFailure> {
        let provider = Arc::clone(&self.provider);
        self.h2h_cache
            .get_or_compute(
                &format!("h2h:{home_id}-{away_id}"),
                self.cache_ttl,
                move || async move { provider.head_to_head(home_id, away_id).await },
            )
            .await
    }

    /// Compute the full report for one fixture.
    pub async fn predict(
        &self,
        home_id: u32,
        away_id: u32,
    ) -> Result<MatchReport, PredictionError> {
        let (home_form, away_form, h2h) = try_join3(
            self.team_form(home_id),
            self.team_form(away_id),
            self.head_to_head(home_id, away_id),
        )
        .await?;

        let outcome = self.predictor.predict(&home_form, &away_form)?;
        let prognosis = form_prognosis(&home_form, &away_form, &h2h);

        info!(
            "Prediction for {} vs {}: home {:.1}%, draw {:.1}%, away {:.1}% ({})",
            home_id,
            away_id,
            outcome.win_home,
            outcome.draw,
            outcome.win_away,
            outcome.recommendation
        );

        Ok(MatchReport {
            home_team_id: home_id,
            away_team_id: away_id,
            outcome,
            form_prognosis: prognosis,
        })
    }
}
