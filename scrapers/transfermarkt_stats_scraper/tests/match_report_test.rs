use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

use transfermarkt_stats_scraper::{
    attribute, extract_goal_events, extract_substitution_minutes,
    scanner::scan,
    types::{AttributionResult, GoalEvent, MatchDocument, PerformanceRow},
};

const REPORT_4001: &str = include_str!("fixtures/match_report/spielbericht_4001.html");
const REPORT_4002: &str = include_str!("fixtures/match_report/spielbericht_4002.html");
const REPORT_4004: &str = include_str!("fixtures/match_report/spielbericht_4004.html");

fn document(html: &str) -> MatchDocument {
    MatchDocument::new(html).expect("fixture is not empty")
}

fn minutes(values: &[u32]) -> BTreeSet<u32> {
    values.iter().copied().collect()
}

fn row(match_id: &str, club_id: &str, minutes_played: Option<u32>) -> PerformanceRow {
    PerformanceRow {
        match_id: match_id.to_string(),
        match_href: format!("/spielbericht/index/spielbericht/{match_id}"),
        club_id: Some(club_id.to_string()),
        goals: 0,
        assists: 0,
        yellow: 0,
        yellow_red: 0,
        red: 0,
        minutes_played,
    }
}

#[test_log::test]
fn test_goal_events_with_stoppage_time() {
    let goals = extract_goal_events(&document(REPORT_4001));
    assert_eq!(
        goals,
        vec![
            GoalEvent::new(12, "10"),
            GoalEvent::new(46, "20"),
            GoalEvent::new(78, "10"),
        ]
    );
}

#[test]
fn test_both_notations_are_scanned() {
    let doc = document(REPORT_4001);
    let twelve: Vec<_> = scan(&doc).filter(|event| event.minute == 12).collect();
    assert_eq!(twelve.len(), 2);
    assert_ne!(twelve[0].notation, twelve[1].notation);
}

#[test]
fn test_cards_and_substitutions_are_not_goals() {
    let goals = extract_goal_events(&document(REPORT_4002));
    assert_eq!(goals, vec![GoalEvent::new(23, "10"), GoalEvent::new(55, "30")]);
}

#[test]
fn test_substitution_minutes_by_player() {
    let doc = document(REPORT_4001);
    assert_eq!(extract_substitution_minutes(&doc, "77"), minutes(&[70]));
    assert_eq!(extract_substitution_minutes(&doc, "16"), minutes(&[70]));
    // "/profil/spieler/77" must not count for player 7
    assert_eq!(extract_substitution_minutes(&doc, "7"), minutes(&[]));

    assert_eq!(extract_substitution_minutes(&document(REPORT_4002), "7"), minutes(&[62]));
    assert_eq!(extract_substitution_minutes(&document(REPORT_4004), "7"), minutes(&[60]));
}

#[test]
fn test_attribution_for_full_match() {
    let doc = document(REPORT_4001);
    let result = attribute(
        &row("4001", "10", Some(90)),
        &extract_goal_events(&doc),
        &extract_substitution_minutes(&doc, "7"),
    );
    assert_eq!(
        result,
        Some(AttributionResult {
            starting_eleven: true,
            on_minute: 0,
            off_minute: 90,
            team_goals_while_on: 2,
            team_goals_conceded_while_on: 1,
        })
    );
}

#[test]
fn test_attribution_for_player_substituted_off() {
    let doc = document(REPORT_4002);
    let result = attribute(
        &row("4002", "10", Some(62)),
        &extract_goal_events(&doc),
        &extract_substitution_minutes(&doc, "7"),
    );
    assert_eq!(
        result,
        Some(AttributionResult {
            starting_eleven: true,
            on_minute: 0,
            off_minute: 62,
            team_goals_while_on: 1,
            team_goals_conceded_while_on: 1,
        })
    );
}

#[test]
fn test_attribution_for_substitute() {
    let doc = document(REPORT_4004);
    let result = attribute(
        &row("4004", "10", Some(30)),
        &extract_goal_events(&doc),
        &extract_substitution_minutes(&doc, "7"),
    );
    assert_eq!(
        result,
        Some(AttributionResult {
            starting_eleven: false,
            on_minute: 60,
            off_minute: 90,
            team_goals_while_on: 2,
            team_goals_conceded_while_on: 0,
        })
    );
}

#[test]
fn test_no_attribution_without_minutes() {
    let doc = document(REPORT_4004);
    let result = attribute(
        &row("4004", "10", None),
        &extract_goal_events(&doc),
        &extract_substitution_minutes(&doc, "7"),
    );
    assert_eq!(result, None);
}
