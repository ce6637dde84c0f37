use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::provider::FixtureProvider;
use crate::engine::{HeadToHead, MatchResult, Side};

/// Fixture provider backed by the API-Football v3 REST API.
/// Docs: <https://www.api-football.com/documentation-v3>
pub struct ApiFootball {
    http: Client,
    api_key: String,
    /// Base URL, overridable in tests.
    base_url: String,
    /// How many completed fixtures to request per query.
    last_n: u32,
}

impl ApiFootball {
    pub fn new(api_key: &str, base_url: Option<&str>, last_n: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiFootball {
            http,
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or("https://v3.football.api-sports.io")
                .to_string(),
            last_n,
        })
    }

    async fn fetch_fixtures(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Fixture>> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Fetching fixtures from {} with {:?}", url, query);

        let resp = self
            .http
            .get(&url)
            .query(query)
            .header("x-apisports-key", &self.api_key)
            .send()
            .await
            .context("API-Football request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("API-Football error: {}", resp.status());
        }

        let body: FixturesResponse = resp
            .json()
            .await
            .context("Failed to parse API-Football response")?;

        let mut fixtures = body.response;
        // The API usually returns newest-first already; sort by kickoff to
        // guarantee it, since the recency weighting depends on the order.
        fixtures.sort_by(|a, b| b.fixture.date.cmp(&a.fixture.date));
        Ok(fixtures)
    }
}

#[async_trait]
impl FixtureProvider for ApiFootball {
    fn name(&self) -> &str {
        "API-Football"
    }

    async fn recent_results(&self, team_id: u32) -> Result<Vec<MatchResult>> {
        let fixtures = self
            .fetch_fixtures(
                "fixtures",
                &[
                    ("team", team_id.to_string()),
                    ("last", self.last_n.to_string()),
                    ("status", "FT".to_string()),
                ],
            )
            .await?;

        Ok(fixtures
            .iter()
            .filter_map(|f| f.result_for(team_id))
            .collect())
    }

    async fn head_to_head(&self, home_id: u32, away_id: u32) -> Result<Vec<HeadToHead>> {
        let fixtures = self
            .fetch_fixtures(
                "fixtures/headtohead",
                &[
                    ("h2h", format!("{}-{}", home_id, away_id)),
                    ("last", self.last_n.to_string()),
                    ("status", "FT".to_string()),
                ],
            )
            .await?;

        Ok(fixtures
            .iter()
            .map(|f| HeadToHead {
                winner: f.winner_for(home_id),
            })
            .collect())
    }
}

// ── Response shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FixturesResponse {
    #[serde(default)]
    response: Vec<Fixture>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    fixture: FixtureInfo,
    teams: FixtureTeams,
    goals: FixtureGoals,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct FixtureTeams {
    home: FixtureTeam,
    away: FixtureTeam,
}

#[derive(Debug, Deserialize)]
struct FixtureTeam {
    id: u32,
    /// `true` for the winning side, `false`/`null` otherwise; `null` on both
    /// sides for draws and undecided fixtures.
    #[serde(default)]
    winner: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct FixtureGoals {
    home: Option<u32>,
    away: Option<u32>,
}

impl Fixture {
    /// Map the fixture to the given team's perspective. Returns `None` when
    /// the team did not play in it or final goals are missing.
    fn result_for(&self, team_id: u32) -> Option<MatchResult> {
        let home_goals = self.goals.home?;
        let away_goals = self.goals.away?;
        if self.teams.home.id == team_id {
            Some(MatchResult {
                goals_for: home_goals,
                goals_against: away_goals,
            })
        } else if self.teams.away.id == team_id {
            Some(MatchResult {
                goals_for: away_goals,
                goals_against: home_goals,
            })
        } else {
            None
        }
    }

    /// Decide the winner relative to `reference_home_id` (the team treated
    /// as the home side of the upcoming fixture, wherever it played in this
    /// historical one). `None` when neither side carries a winner flag.
    fn winner_for(&self, reference_home_id: u32) -> Option<Side> {
        let winner_id = if self.teams.home.winner == Some(true) {
            self.teams.home.id
        } else if self.teams.away.winner == Some(true) {
            self.teams.away.id
        } else {
            return None;
        };
        if winner_id == reference_home_id {
            Some(Side::Home)
        } else {
            Some(Side::Away)
        }
    }
}
