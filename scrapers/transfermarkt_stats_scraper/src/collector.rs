//! Batch job: performance pages for every player and season, joined with the
//! fixture list and attributed against the match reports.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

use crate::{
    attribution::{attribute_goals, derive_starting_and_window},
    cache::MatchCache,
    config::ScraperConfig,
    error::FetchError,
    fetch::DocumentSource,
    match_report::extract_substitution_minutes_with,
    matches::parse_matches,
    metrics::{FetchKind, MetricsCollector, SkipReason},
    output::MatchRow,
    performance::PerformancePage,
    types::{MatchInfo, PerformanceRow, Player, PlayerMatchStat},
    utils::absolute_url,
    vocabulary::Vocabulary,
};

pub struct PlayerStatsCollector<S> {
    source: S,
    config: ScraperConfig,
    vocabulary: Vocabulary,
    cache: MatchCache,
    metrics: MetricsCollector,
}

impl<S: DocumentSource> PlayerStatsCollector<S> {
    pub fn new(source: S, config: ScraperConfig) -> Self {
        Self::with_vocabulary(source, config, Vocabulary::default())
    }

    pub fn with_vocabulary(source: S, config: ScraperConfig, vocabulary: Vocabulary) -> Self {
        Self {
            source,
            config,
            vocabulary,
            cache: MatchCache::with_vocabulary(vocabulary),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    /// Collects stats for every player over the configured seasons.
    ///
    /// Output is unique per (player, match), keeping the first occurrence in
    /// season order, and sorted by player id then match id. A player whose page
    /// cannot be fetched is logged and skipped.
    pub fn collect(&self, players: &[Player], matches: &[MatchInfo]) -> Result<Vec<PlayerMatchStat>> {
        let fixtures: HashMap<&str, &MatchInfo> = matches.iter().map(|m| (m.match_id.as_str(), m)).collect();
        let threads = self.config.collector.parallelism.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build collector thread pool")?;

        let mut stats = Vec::new();
        for season in self.config.seasons.years() {
            info!("Collecting season {} for {} players", season, players.len());
            let season_stats: Vec<Vec<PlayerMatchStat>> = pool.install(|| {
                players
                    .par_iter()
                    .map(|player| match self.collect_player_season(player, season, &fixtures) {
                        Ok(stats) => stats,
                        Err(e) => {
                            error!("Player {} season {}: {:#}", player.player_id, season, e);
                            self.metrics.record_error(format!("{}: {:#}", player.player_id, e));
                            Vec::new()
                        }
                    })
                    .collect()
            });
            stats.extend(season_stats.into_iter().flatten());
        }

        let mut seen = HashSet::new();
        stats.retain(|s| seen.insert((s.player_id.clone(), s.match_id.clone())));
        stats.sort_by(|a, b| (&a.player_id, &a.match_id).cmp(&(&b.player_id, &b.match_id)));

        info!(
            "Collected {} player-match rows ({} match reports cached)",
            stats.len(),
            self.cache.len()
        );
        Ok(stats)
    }

    /// Stats for one player in one season. Errors only when the performance
    /// page itself cannot be fetched or is empty.
    pub fn collect_player_season(
        &self,
        player: &Player,
        season: i32,
        fixtures: &HashMap<&str, &MatchInfo>,
    ) -> Result<Vec<PlayerMatchStat>> {
        let url = self
            .config
            .player_stats_url(&player.player_slug, &player.player_id, season);
        debug!("Fetching performance page {}", url);

        let tracker = self.metrics.record_fetch_start(FetchKind::PerformancePage);
        let html = match self.source.fetch(&url) {
            Ok(html) => {
                tracker.finish(true);
                html
            }
            Err(e) => {
                tracker.finish(false);
                return Err(e).with_context(|| format!("Failed to fetch {}", url));
            }
        };

        let page = PerformancePage::parse_with(&html, self.vocabulary)
            .with_context(|| format!("Invalid performance page {}", url))?;
        let rows = match page.select_performance_table() {
            Some(table) => table.extract_rows(),
            None => {
                warn!("No performance table for player {} season {}", player.player_id, season);
                self.metrics.record_page_without_table();
                return Ok(Vec::new());
            }
        };

        let stats: Vec<PlayerMatchStat> = rows
            .iter()
            .filter_map(|row| self.stat_for_row(player, row, fixtures))
            .collect();
        self.metrics.record_rows(rows.len() as u64, stats.len() as u64);
        Ok(stats)
    }

    fn stat_for_row(
        &self,
        player: &Player,
        row: &PerformanceRow,
        fixtures: &HashMap<&str, &MatchInfo>,
    ) -> Option<PlayerMatchStat> {
        let skip = |reason: SkipReason| {
            debug!("Skipping match {} for player {}: {:?}", row.match_id, player.player_id, reason);
            self.metrics.record_skip(reason);
            None
        };

        let Some(fixture) = fixtures.get(row.match_id.as_str()) else {
            return skip(SkipReason::UnknownMatch);
        };
        let Some(club_id) = row.club_id.as_deref() else {
            return skip(SkipReason::MissingClub);
        };
        if !fixture.involves(club_id) {
            return skip(SkipReason::ClubNotInMatch);
        }
        if !row.played() {
            return skip(SkipReason::DidNotPlay);
        }

        let report_url = absolute_url(&self.config.scraping.base_url, &row.match_href);
        let report = self.cache.get_or_fetch(&row.match_id, || {
            let tracker = self.metrics.record_fetch_start(FetchKind::MatchReport);
            let result = self.source.fetch(&report_url);
            tracker.finish(result.is_ok());
            result
        });
        let report = match report {
            Ok(report) => report,
            Err(FetchError::PreviouslyFailed { .. }) => return skip(SkipReason::ReportUnavailable),
            Err(e) => {
                warn!("Match report {} unavailable: {}", report_url, e);
                self.metrics.record_error(e.to_string());
                return skip(SkipReason::ReportUnavailable);
            }
        };

        let substitutions =
            extract_substitution_minutes_with(&report.document, &player.player_id, &self.vocabulary);
        let candidates: Vec<u32> = substitutions.into_iter().collect();
        let window = derive_starting_and_window(row.minutes_played, &candidates);
        let tally = attribute_goals(&report.goals, window.on_minute, window.off_minute, club_id);

        Some(PlayerMatchStat {
            player_id: player.player_id.clone(),
            match_id: row.match_id.clone(),
            club_id: club_id.to_string(),
            goals: row.goals,
            assists: row.assists,
            yellow: row.yellow,
            yellow_red: row.yellow_red,
            red: row.red,
            start_11: u8::from(window.starting_eleven),
            minutes: row.minutes_played.unwrap_or(0),
            on_min: window.on_minute,
            off_min: window.off_minute,
            team_goals: tally.goals_for,
            team_conceded: tally.goals_conceded,
            result: fixture.result_for(club_id),
        })
    }
}

/// Fetches the fixture list of every configured season for `league`.
///
/// Fixtures are unique by match id, the earliest season winning. Undated
/// fixtures and fixtures after `today` are dropped, and the rest are sorted by
/// season, league, date and match id.
pub fn collect_matches<S: DocumentSource>(
    source: &S,
    config: &ScraperConfig,
    league: &str,
    today: NaiveDate,
) -> Result<Vec<MatchRow>> {
    let mut rows = Vec::new();
    for season in config.seasons.years() {
        let url = config.matches_url(season);
        info!("Fetching fixture list {}", url);
        let html = source.fetch(&url).with_context(|| format!("Failed to fetch {}", url))?;
        let matches = parse_matches(&html).with_context(|| format!("Invalid fixture list {}", url))?;
        debug!("Season {}: {} fixtures", season, matches.len());
        rows.extend(matches.iter().map(|m| MatchRow::from_match(m, Some(season), Some(league))));
    }

    let mut seen = HashSet::new();
    rows.retain(|row| seen.insert(row.match_id.clone()));
    let unique = rows.len();
    rows.retain(|row| row.date.is_some_and(|date| date <= today));
    rows.sort_by(|a, b| {
        (a.season, &a.league, a.date, &a.match_id).cmp(&(b.season, &b.league, b.date, &b.match_id))
    });

    info!(
        "Collected {} played fixtures ({} undated or after {})",
        rows.len(),
        unique - rows.len(),
        today
    );
    Ok(rows)
}
