use clap::Parser;

use crate::engine::ModelParams;

/// Scoreline probability engine for football fixtures
#[derive(Parser, Debug, Clone)]
#[command(name = "scorecast", version, about)]
pub struct Config {
    /// API-Football team ID for the home side
    #[arg(long, env = "HOME_TEAM_ID")]
    pub home_team: u32,

    /// API-Football team ID for the away side
    #[arg(long, env = "AWAY_TEAM_ID")]
    pub away_team: u32,

    /// API-Football base URL
    #[arg(
        long,
        env = "API_FOOTBALL_URL",
        default_value = "https://v3.football.api-sports.io"
    )]
    pub api_url: String,

    /// API-Football API key
    #[arg(long, env = "API_FOOTBALL_KEY")]
    pub api_key: Option<String>,

    /// Completed fixtures fetched per team (and per head-to-head query)
    #[arg(long, env = "FORM_MATCHES", default_value = "10")]
    pub form_matches: u32,

    /// Matches at positions below this count (most recent first) get the
    /// recency weight
    #[arg(long, env = "RECENT_WINDOW", default_value = "5")]
    pub recent_window: usize,

    /// Weight multiplier applied inside the recency window
    #[arg(long, env = "RECENT_WEIGHT", default_value = "1.5")]
    pub recent_weight: f64,

    /// League-average total goals per match
    #[arg(long, env = "LEAGUE_BASELINE", default_value = "2.6")]
    pub league_baseline: f64,

    /// Maximum goals per side in the scoreline grid
    #[arg(long, env = "SCORE_CUTOFF", default_value = "6")]
    pub score_cutoff: u32,

    /// Dixon-Coles low-score correlation parameter
    #[arg(
        long,
        env = "DIXON_COLES_RHO",
        default_value = "-0.1",
        allow_hyphen_values = true
    )]
    pub dixon_coles_rho: f64,

    /// Fixture cache TTL in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "300")]
    pub cache_ttl_secs: u64,

    /// Decimal places for percentage fields in the report (1 or 2)
    #[arg(long, env = "PERCENT_DECIMALS", default_value = "1")]
    pub percent_decimals: u32,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.form_matches == 0 {
            anyhow::bail!("form_matches must be at least 1");
        }
        if self.recent_weight < 0.0 {
            anyhow::bail!("recent_weight must be non-negative");
        }
        if self.league_baseline <= 0.0 {
            anyhow::bail!("league_baseline must be positive");
        }
        if self.score_cutoff < 1 {
            anyhow::bail!("score_cutoff must be at least 1");
        }
        if self.dixon_coles_rho.abs() >= 1.0 {
            anyhow::bail!("dixon_coles_rho must lie strictly between -1 and 1");
        }
        if !(1..=2).contains(&self.percent_decimals) {
            anyhow::bail!("percent_decimals must be 1 or 2");
        }
        Ok(())
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            league_baseline: self.league_baseline,
            recent_window: self.recent_window,
            recent_weight: self.recent_weight,
            score_cutoff: self.score_cutoff,
            dixon_coles_rho: self.dixon_coles_rho,
        }
    }
}
