//! Season fixture list ("Gesamtspielplan").

use std::collections::HashSet;

use anyhow::Result;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{
    types::MatchInfo,
    utils::{element_text, snippet},
};

static MATCH_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="spielbericht/"]"#).unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

static MATCH_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"/([^/]+)/.*?/spielbericht/(\d+)").unwrap());
static CLUB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/verein/(\d+)").unwrap());
static SCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*:\s*(\d+)").unwrap());
static KICK_OFF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}\b").unwrap());
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2})[./](\d{2})[./](\d{2,4})").unwrap());

/// Parses `dd.mm.yy`, `dd.mm.yyyy` or the `/` separated variants. Two digit
/// years are taken as 20xx.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year_text = &caps[3];
    let mut year: i32 = year_text.parse().ok()?;
    if year_text.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_score(text: &str) -> Option<(u32, u32)> {
    let caps = SCORE.captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// First two distinct values, in order of appearance.
fn first_two_unique<'a>(values: impl Iterator<Item = &'a str>) -> Option<(&'a str, &'a str)> {
    let mut first: Option<&str> = None;
    for value in values {
        match first {
            None => first = Some(value),
            Some(f) if f != value => return Some((f, value)),
            Some(_) => {}
        }
    }
    None
}

/// Closest `tr` ancestor, else `li`, else `div`, else the direct parent.
fn container<'a>(link: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    let ancestor = |name: &str| {
        link.ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == name)
    };
    ancestor("tr")
        .or_else(|| ancestor("li"))
        .or_else(|| ancestor("div"))
        .or_else(|| link.parent().and_then(ElementRef::wrap))
}

/// Lists every fixture on a schedule page. Fixtures without two club links are
/// skipped; a missing date inherits the previous fixture's date.
pub fn parse_matches(html: &str) -> Result<Vec<MatchInfo>> {
    let document = Html::parse_document(html);

    let links: Vec<ElementRef<'_>> = document.select(&MATCH_LINK).collect();
    if links.is_empty() {
        let title = document
            .select(&TITLE)
            .next()
            .map(|t| element_text(&t))
            .unwrap_or_else(|| "NO_TITLE".to_string());
        let text = element_text(&document.root_element());
        anyhow::bail!(
            "No spielbericht links found. title={:?} snippet={:?}",
            title,
            snippet(&text, 300)
        );
    }

    let mut matches = Vec::new();
    let mut seen = HashSet::new();
    let mut last_date: Option<NaiveDate> = None;

    for link in links {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(caps) = MATCH_HREF.captures(href) else {
            continue;
        };
        let match_slug = caps[1].to_string();
        let match_id = caps[2].to_string();
        if !seen.insert(match_id.clone()) {
            continue;
        }

        let Some(container) = container(&link) else {
            continue;
        };
        let container_html = container.html();
        let clubs = CLUB_ID
            .captures_iter(&container_html)
            .filter_map(|c| c.get(1).map(|m| m.as_str()));
        let Some((home, away)) = first_two_unique(clubs) else {
            debug!("Match {} has fewer than two clubs in its row", match_id);
            continue;
        };
        let (home_club_id, away_club_id) = (home.to_string(), away.to_string());

        let text = element_text(&container);
        let date = parse_date(&text).or(last_date);
        if date.is_some() {
            last_date = date;
        }

        // Row text also carries the kick-off time, which must not pass for a score.
        let score = parse_score(&element_text(&link))
            .or_else(|| parse_score(&KICK_OFF.replace_all(&text, "")));

        matches.push(MatchInfo {
            match_id,
            match_slug: Some(match_slug),
            date,
            home_club_id,
            away_club_id,
            score_home: score.map(|(home, _)| home),
            score_away: score.map(|(_, away)| away),
        });
    }

    Ok(matches)
}
