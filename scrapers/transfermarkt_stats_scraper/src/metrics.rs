use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

/// Why a performance row did not produce an output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Match id is not in the fixture list being collected.
    UnknownMatch,
    /// No club identifier in the row.
    MissingClub,
    /// The row's club is neither home nor away team of the fixture.
    ClubNotInMatch,
    /// Minutes played missing or zero.
    DidNotPlay,
    /// The match report could not be fetched.
    ReportUnavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub unknown_match: u64,
    pub missing_club: u64,
    pub club_not_in_match: u64,
    pub did_not_play: u64,
    pub report_unavailable: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetrics {
    pub pages_fetched: u64,
    pub page_failures: u64,
    pub pages_without_table: u64,
    pub reports_fetched: u64,
    pub report_failures: u64,
    pub rows_seen: u64,
    pub rows_emitted: u64,
    pub skipped: SkipCounts,
    pub avg_fetch_time_ms: f64,
    pub last_error: Option<String>,
}

impl fmt::Display for CollectionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Pages: {} fetched, {} failed, {} without performance table",
            self.pages_fetched, self.page_failures, self.pages_without_table
        )?;
        writeln!(
            f,
            "Match reports: {} fetched, {} failed (avg fetch {:.0}ms)",
            self.reports_fetched, self.report_failures, self.avg_fetch_time_ms
        )?;
        writeln!(f, "Rows: {} seen, {} emitted", self.rows_seen, self.rows_emitted)?;
        write!(
            f,
            "Skipped: {} unknown match, {} missing club, {} club not in match, {} did not play, {} report unavailable",
            self.skipped.unknown_match,
            self.skipped.missing_club,
            self.skipped.club_not_in_match,
            self.skipped.did_not_play,
            self.skipped.report_unavailable
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    PerformancePage,
    MatchReport,
}

#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<CollectionMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut CollectionMetrics) -> R) -> R {
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut metrics)
    }

    pub fn record_fetch_start(&self, kind: FetchKind) -> FetchTracker {
        FetchTracker {
            start_time: Instant::now(),
            kind,
            collector: self.clone(),
        }
    }

    pub fn record_skip(&self, reason: SkipReason) {
        self.with(|m| match reason {
            SkipReason::UnknownMatch => m.skipped.unknown_match += 1,
            SkipReason::MissingClub => m.skipped.missing_club += 1,
            SkipReason::ClubNotInMatch => m.skipped.club_not_in_match += 1,
            SkipReason::DidNotPlay => m.skipped.did_not_play += 1,
            SkipReason::ReportUnavailable => m.skipped.report_unavailable += 1,
        });
    }

    pub fn record_page_without_table(&self) {
        self.with(|m| m.pages_without_table += 1);
    }

    pub fn record_rows(&self, seen: u64, emitted: u64) {
        self.with(|m| {
            m.rows_seen += seen;
            m.rows_emitted += emitted;
        });
    }

    pub fn record_error(&self, error: String) {
        self.with(|m| m.last_error = Some(error));
    }

    pub fn get_metrics(&self) -> CollectionMetrics {
        self.with(|m| m.clone())
    }
}

pub struct FetchTracker {
    start_time: Instant,
    kind: FetchKind,
    collector: MetricsCollector,
}

impl FetchTracker {
    pub fn finish(self, success: bool) {
        let duration = self.start_time.elapsed();
        let kind = self.kind;
        self.collector.with(|m| {
            match (kind, success) {
                (FetchKind::PerformancePage, true) => m.pages_fetched += 1,
                (FetchKind::PerformancePage, false) => m.page_failures += 1,
                (FetchKind::MatchReport, true) => m.reports_fetched += 1,
                (FetchKind::MatchReport, false) => m.report_failures += 1,
            }

            // Exponential moving average of fetch time
            let alpha = 0.1;
            m.avg_fetch_time_ms = m.avg_fetch_time_ms * (1.0 - alpha) + duration.as_millis() as f64 * alpha;
        });
    }
}
