use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.transfermarkt.ch".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimits {
    pub requests_per_second: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlTemplates {
    /// Placeholders: `{base_url}`, `{slug}`, `{player_id}`, `{season}`.
    pub player_stats: String,
    /// Placeholders: `{base_url}`, `{season}`.
    pub matches: String,
}

impl Default for UrlTemplates {
    fn default() -> Self {
        Self {
            player_stats: "{base_url}/{slug}/leistungsdaten/spieler/{player_id}/plus/0?saison={season}".to_string(),
            matches: "{base_url}/promotion-league/gesamtspielplan/wettbewerb/CHPR/saison_id/{season}".to_string(),
        }
    }
}

/// Seasons to collect, as the half-open range `start_year..end_year`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonRange {
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for SeasonRange {
    fn default() -> Self {
        Self {
            start_year: 2025,
            end_year: 2026,
        }
    }
}

impl SeasonRange {
    pub fn years(&self) -> std::ops::Range<i32> {
        self.start_year..self.end_year
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectorConfig {
    pub parallelism: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    pub scraping: ScrapingConfig,
    pub rate_limits: RateLimits,
    pub retry: RetryConfig,
    pub urls: UrlTemplates,
    pub seasons: SeasonRange,
    pub collector: CollectorConfig,
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = env::var("TM_BASE_URL") {
            config.scraping.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(user_agent) = env::var("TM_USER_AGENT") {
            config.scraping.user_agent = user_agent;
        }
        if let Some(timeout) = env_parsed("TM_TIMEOUT_SECS") {
            config.scraping.request_timeout_secs = timeout;
        }
        if let Some(rps) = env_parsed("TM_RATE_LIMIT_RPS") {
            config.rate_limits.requests_per_second = rps;
        }
        if let Some(attempts) = env_parsed("TM_MAX_ATTEMPTS") {
            config.retry.max_attempts = attempts;
        }
        if let Some(start) = env_parsed("TM_START_YEAR") {
            config.seasons.start_year = start;
        }
        if let Some(end) = env_parsed("TM_END_YEAR") {
            config.seasons.end_year = end;
        }
        if let Some(parallelism) = env_parsed("TM_PARALLELISM") {
            config.collector.parallelism = parallelism;
        }

        config
    }

    pub fn player_stats_url(&self, slug: &str, player_id: &str, season: i32) -> String {
        self.urls
            .player_stats
            .replace("{base_url}", &self.scraping.base_url)
            .replace("{slug}", slug)
            .replace("{player_id}", player_id)
            .replace("{season}", &season.to_string())
    }

    pub fn matches_url(&self, season: i32) -> String {
        self.urls
            .matches
            .replace("{base_url}", &self.scraping.base_url)
            .replace("{season}", &season.to_string())
    }
}
