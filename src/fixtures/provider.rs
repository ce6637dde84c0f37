use anyhow::Result;
use async_trait::async_trait;

use crate::engine::{HeadToHead, MatchResult};

/// Trait that every fixture-data provider must implement.
#[async_trait]
pub trait FixtureProvider: Send + Sync {
    /// Return the team's most recent completed matches, most recent first,
    /// each from that team's perspective.
    async fn recent_results(&self, team_id: u32) -> Result<Vec<MatchResult>>;

    /// Return the most recent completed meetings between the two teams.
    async fn head_to_head(&self, home_id: u32, away_id: u32) -> Result<Vec<HeadToHead>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
