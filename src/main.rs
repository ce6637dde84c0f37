use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod cache;
mod config;
mod engine;
mod fixtures;
mod service;

use config::Config;
use engine::MatchPredictor;
use fixtures::{ApiFootball, FixtureProvider};
use service::{PredictionError, PredictionService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let api_key = config
        .api_key
        .clone()
        .context("API_FOOTBALL_KEY is required (flag --api-key or env var)")?;

    let provider = ApiFootball::new(&api_key, Some(&config.api_url), config.form_matches)?;
    info!("Fixture provider: {}", provider.name());

    let service = PredictionService::new(
        Arc::new(provider),
        MatchPredictor::new(config.model_params()),
        Duration::from_secs(config.cache_ttl_secs),
    );

    match service.predict(config.home_team, config.away_team).await {
        Ok(report) => {
            let payload = report.rounded(config.percent_decimals);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Err(PredictionError::InsufficientData(e)) => {
            // Missing history is a structured, non-fatal answer, matching
            // the error payload existing consumers already handle.
            warn!("Prediction unavailable: {}", e);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "error": e.to_string() }))?
            );
        }
        Err(PredictionError::Fetch(e)) => return Err(e.into()),
    }

    Ok(())
}
