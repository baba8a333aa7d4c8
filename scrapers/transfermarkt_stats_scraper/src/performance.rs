//! Season performance page ("Leistungsdaten").
//!
//! The page carries several tables and none of them is reliably marked, so
//! every table is scored and the best one is taken as the per-match table.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{
    error::EngineError,
    minute::{cell_count, parse_minutes_played},
    types::PerformanceRow,
    utils::element_text,
    vocabulary::Vocabulary,
};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("thead th").unwrap());
static BODY_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody tr").unwrap());
static MATCH_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="spielbericht/"]"#).unwrap());
static BODY_MATCH_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"tbody a[href*="spielbericht/"]"#).unwrap());

static MATCH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/spielbericht/(\d+)").unwrap());
static CLUB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/verein/(\d+)").unwrap());

const FOR_HEADER_WEIGHT: f64 = 3.0;
const RESULT_HEADER_WEIGHT: f64 = 2.0;
const LINKS_PER_POINT: f64 = 8.0;
const MAX_LINK_POINTS: f64 = 6.0;
/// Columns preceding the minutes cell: goals, assists, yellow, yellow-red, red.
const STAT_COLUMNS: usize = 5;

/// Score components for one table, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableScore {
    pub index: usize,
    pub has_for_header: bool,
    pub has_result_header: bool,
    pub match_links: usize,
    pub dominant_club: Option<String>,
    pub dominance_ratio: f64,
}

impl TableScore {
    pub fn total(&self) -> f64 {
        let mut score = 0.0;
        if self.has_for_header {
            score += FOR_HEADER_WEIGHT;
        }
        if self.has_result_header {
            score += RESULT_HEADER_WEIGHT;
        }
        score + (self.match_links as f64 / LINKS_PER_POINT).min(MAX_LINK_POINTS) + self.dominance_ratio
    }
}

pub struct PerformancePage {
    html: Html,
    vocabulary: Vocabulary,
}

impl PerformancePage {
    pub fn parse(html: &str) -> Result<Self, EngineError> {
        Self::parse_with(html, Vocabulary::default())
    }

    pub fn parse_with(html: &str, vocabulary: Vocabulary) -> Result<Self, EngineError> {
        if html.trim().is_empty() {
            return Err(EngineError::EmptyDocument);
        }
        Ok(Self {
            html: Html::parse_document(html),
            vocabulary,
        })
    }

    pub fn score_tables(&self) -> Vec<TableScore> {
        self.html
            .select(&TABLE)
            .enumerate()
            .map(|(index, table)| score_table(index, &table, &self.vocabulary))
            .collect()
    }

    /// Highest scoring table. Ties go to the table that appears first.
    pub fn select_performance_table(&self) -> Option<PerformanceTable<'_>> {
        let mut best: Option<(ElementRef<'_>, TableScore)> = None;
        for (index, table) in self.html.select(&TABLE).enumerate() {
            let score = score_table(index, &table, &self.vocabulary);
            let better = match &best {
                Some((_, current)) => score.total() > current.total(),
                None => true,
            };
            if better {
                best = Some((table, score));
            }
        }

        let (element, score) = best?;
        debug!(
            "Selected table {} with score {:.2} ({} match links)",
            score.index,
            score.total(),
            score.match_links
        );
        let headers = header_texts(&element);
        let for_column = headers
            .iter()
            .position(|h| self.vocabulary.is_for_header(h));
        Some(PerformanceTable {
            element,
            score,
            for_column,
        })
    }
}

fn header_texts(table: &ElementRef<'_>) -> Vec<String> {
    table
        .select(&HEADER_CELL)
        .map(|th| element_text(&th).to_lowercase())
        .collect()
}

fn score_table(index: usize, table: &ElementRef<'_>, vocabulary: &Vocabulary) -> TableScore {
    let headers = header_texts(table);
    let has_for_header = headers.iter().any(|h| vocabulary.is_for_header(h));
    let has_result_header = headers.iter().any(|h| vocabulary.is_result_header(h));
    let match_links = table.select(&BODY_MATCH_LINK).count();

    let row_clubs: Vec<String> = table
        .select(&BODY_ROW)
        .filter_map(|row| first_club_id(&row.html()))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for club in &row_clubs {
        *counts.entry(club.as_str()).or_default() += 1;
    }
    // Most frequent club; the one seen first wins a tie.
    let mut dominant: Option<(&str, usize)> = None;
    for club in &row_clubs {
        let n = counts[club.as_str()];
        if dominant.map_or(true, |(_, best)| n > best) {
            dominant = Some((club.as_str(), n));
        }
    }
    let dominance_ratio = match dominant {
        Some((_, n)) => n as f64 / row_clubs.len() as f64,
        None => 0.0,
    };

    TableScore {
        index,
        has_for_header,
        has_result_header,
        match_links,
        dominant_club: dominant.map(|(club, _)| club.to_string()),
        dominance_ratio,
    }
}

fn first_club_id(markup: &str) -> Option<String> {
    CLUB_ID
        .captures(markup)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The table selected as a player's per-match performance table.
pub struct PerformanceTable<'a> {
    element: ElementRef<'a>,
    score: TableScore,
    for_column: Option<usize>,
}

impl<'a> PerformanceTable<'a> {
    pub fn score(&self) -> &TableScore {
        &self.score
    }

    pub fn for_column(&self) -> Option<usize> {
        self.for_column
    }

    /// One row per body row that links a match report. Rows without a link
    /// (season totals, separators) are skipped.
    pub fn extract_rows(&self) -> Vec<PerformanceRow> {
        self.element
            .select(&BODY_ROW)
            .filter_map(|row| self.extract_row(&row))
            .collect()
    }

    fn extract_row(&self, row: &ElementRef<'_>) -> Option<PerformanceRow> {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .collect();
        if cells.is_empty() {
            return None;
        }

        let href = row
            .select(&MATCH_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())?;
        let Some(match_id) = MATCH_ID.captures(href).and_then(|c| c.get(1)) else {
            debug!("Match link without id: {}", href);
            return None;
        };

        let club_id = self
            .for_column
            .and_then(|idx| cells.get(idx))
            .and_then(|cell| first_club_id(&cell.html()))
            .or_else(|| first_club_id(&row.html()));

        // Minutes played is the right-most cell that is exactly one clock minute.
        let texts: Vec<String> = cells.iter().map(element_text).collect();
        let anchor = texts
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, text)| parse_minutes_played(text).map(|minutes| (idx, minutes)));
        let minutes_played = anchor.map(|(_, minutes)| minutes);

        let stats: [u32; STAT_COLUMNS] = match anchor {
            Some((idx, _)) if idx >= STAT_COLUMNS => {
                std::array::from_fn(|i| cell_count(&texts[idx - STAT_COLUMNS + i]))
            }
            _ if texts.len() > STAT_COLUMNS => {
                // No usable anchor: the five cells before the last column.
                let start = texts.len() - (STAT_COLUMNS + 1);
                std::array::from_fn(|i| cell_count(&texts[start + i]))
            }
            _ => [0; STAT_COLUMNS],
        };
        let [goals, assists, yellow, yellow_red, red] = stats;

        Some(PerformanceRow {
            match_id: match_id.as_str().to_string(),
            match_href: href.to_string(),
            club_id,
            goals,
            assists,
            yellow,
            yellow_red,
            red,
            minutes_played,
        })
    }
}
