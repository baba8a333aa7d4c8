//! Goal and substitution extraction from match reports.
//!
//! Both extractors share the scanner's event stream and differ only in how a
//! window is classified.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{
    scanner::{scan, MinuteEvent},
    types::{GoalEvent, MatchDocument},
    vocabulary::Vocabulary,
};

static CLUB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/verein/(\d+)").unwrap());

/// Keyword signals present in an event window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSignals {
    pub goal: bool,
    pub substitution: bool,
    pub card: bool,
}

impl WindowSignals {
    pub fn classify(window: &str, vocabulary: &Vocabulary) -> Self {
        let lower = window.to_lowercase();
        Self {
            goal: vocabulary.mentions_goal(&lower),
            substitution: vocabulary.mentions_substitution(&lower),
            card: vocabulary.mentions_card(&lower),
        }
    }

    /// Substitution and card mentions veto the goal keyword.
    pub fn is_goal(&self) -> bool {
        self.goal && !self.substitution && !self.card
    }

    pub fn is_substitution(&self) -> bool {
        self.substitution
    }
}

/// Club id whose link lies closest to the event's notation. Equal distances
/// resolve to the earlier link.
pub fn nearest_club_id(event: &MinuteEvent<'_>) -> Option<String> {
    let anchor = event.anchor();
    CLUB_ID
        .captures_iter(event.window)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1)?.as_str();
            let distance = if whole.end() <= anchor.start {
                anchor.start - whole.end()
            } else if whole.start() >= anchor.end {
                whole.start() - anchor.end
            } else {
                0
            };
            Some((distance, id))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, id)| id.to_string())
}

pub fn extract_goal_events(document: &MatchDocument) -> Vec<GoalEvent> {
    extract_goal_events_with(document, &Vocabulary::default())
}

/// Goals in the report, de-duplicated by (minute, club) and ordered by minute.
pub fn extract_goal_events_with(document: &MatchDocument, vocabulary: &Vocabulary) -> Vec<GoalEvent> {
    let mut goals = BTreeSet::new();
    for event in scan(document) {
        if !WindowSignals::classify(event.window, vocabulary).is_goal() {
            continue;
        }
        match nearest_club_id(&event) {
            Some(club_id) => {
                goals.insert(GoalEvent::new(event.minute, club_id));
            }
            None => debug!("Goal at minute {} has no club link in its window", event.minute),
        }
    }
    goals.into_iter().collect()
}

fn player_pattern(player_id: &str) -> Option<Regex> {
    Regex::new(&format!(r"/profil/spieler/{}(?:\D|$)", regex::escape(player_id))).ok()
}

pub fn extract_substitution_minutes(document: &MatchDocument, player_id: &str) -> BTreeSet<u32> {
    extract_substitution_minutes_with(document, player_id, &Vocabulary::default())
}

/// Candidate minutes at which `player_id` was substituted in or out. The same
/// event reported in both notations collapses to one minute.
pub fn extract_substitution_minutes_with(
    document: &MatchDocument,
    player_id: &str,
    vocabulary: &Vocabulary,
) -> BTreeSet<u32> {
    let player_id = player_id.trim();
    if player_id.is_empty() {
        debug!("No player id given, no substitution minutes");
        return BTreeSet::new();
    }
    let Some(player) = player_pattern(player_id) else {
        return BTreeSet::new();
    };

    scan(document)
        .filter(|event| WindowSignals::classify(event.window, vocabulary).is_substitution())
        .filter(|event| player.is_match(event.window))
        .map(|event| event.minute)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> MatchDocument {
        MatchDocument::new(html).unwrap()
    }

    #[test]
    fn test_goal_requires_keyword_and_club() {
        let d = doc(r#"<li>23' Tor <a href="/fc-a/startseite/verein/10">FC A</a></li>"#);
        assert_eq!(extract_goal_events(&d), vec![GoalEvent::new(23, "10")]);

        let no_club = doc("<li>23' Tor durch Kopfball</li>");
        assert!(extract_goal_events(&no_club).is_empty());

        let no_keyword = doc(r#"<li>23' Ecke <a href="/verein/10">FC A</a></li>"#);
        assert!(extract_goal_events(&no_keyword).is_empty());
    }

    #[test]
    fn test_substitution_and_card_veto_goal() {
        let sub = doc(r#"<li>60' Tor-Chance, Wechsel <a href="/verein/10">FC A</a></li>"#);
        assert!(extract_goal_events(&sub).is_empty());

        let card = doc(r#"<li>60' Gelbe Karte nach Tor <a href="/verein/10">FC A</a></li>"#);
        assert!(extract_goal_events(&card).is_empty());
    }

    #[test]
    fn test_english_goal_and_substitution_is_not_a_goal() {
        let d = doc(r#"<li>60' goal disallowed, substitution <a href="/verein/10">A</a></li>"#);
        assert!(extract_goal_events_with(&d, &Vocabulary::ENGLISH).is_empty());

        let goal = doc(r#"<li>61' goal <a href="/verein/10">A</a></li>"#);
        assert_eq!(
            extract_goal_events_with(&goal, &Vocabulary::ENGLISH),
            vec![GoalEvent::new(61, "10")]
        );
    }

    #[test]
    fn test_nearest_club_is_chosen() {
        let filler = "·".repeat(40);
        let html = format!(
            r#"<a href="/verein/10">A</a>{filler}{filler}<li>77' Tor <a href="/verein/20">B</a></li>"#
        );
        assert_eq!(extract_goal_events(&doc(&html)), vec![GoalEvent::new(77, "20")]);
    }

    #[test]
    fn test_goals_deduplicated_and_sorted() {
        let html = r#"
            <li>80' Tor <a href="/verein/20">B</a></li>
            <li>12' Tor <a href="/verein/10">A</a></li>
        "#;
        let d = doc(html);
        let goals = extract_goal_events(&d);
        assert_eq!(goals.first().map(|g| g.minute), Some(12));
        assert!(goals.windows(2).all(|w| w[0].minute <= w[1].minute));
        let unique: BTreeSet<_> = goals.iter().cloned().collect();
        assert_eq!(unique.len(), goals.len());
        assert_eq!(extract_goal_events(&d), goals);
    }

    #[test]
    fn test_substitution_minutes_for_player() {
        let html = r#"
            <div>Auswechslung 64' <a href="/max-muster/profil/spieler/777">Muster</a></div>
            <div>Einwechslung 64. Min. <a href="/max-muster/profil/spieler/777">Muster</a></div>
        "#;
        let d = doc(html);
        let minutes = extract_substitution_minutes(&d, "777");
        assert_eq!(minutes.into_iter().collect::<Vec<_>>(), vec![64]);
    }

    #[test]
    fn test_substitution_ignores_other_players_and_prefix_ids() {
        let html = r#"<div>Wechsel 70' <a href="/x/profil/spieler/7770">X</a></div>"#;
        assert!(extract_substitution_minutes(&doc(html), "777").is_empty());
        assert!(extract_substitution_minutes(&doc(html), "").is_empty());
    }

    #[test]
    fn test_substitution_requires_keyword() {
        let html = r#"<div>Tor 70' <a href="/x/profil/spieler/777">X</a></div>"#;
        assert!(extract_substitution_minutes(&doc(html), "777").is_empty());
    }

    #[test]
    fn test_club_link_past_multibyte_text_is_found() {
        let html = format!(r#"<li>23' Tor {}<a href="/verein/10">A</a></li>"#, "ü".repeat(850));
        assert_eq!(extract_goal_events(&doc(&html)), vec![GoalEvent::new(23, "10")]);
    }

    #[test]
    fn test_player_link_past_multibyte_text_is_found() {
        let html = format!(
            r#"<div>Wechsel 64' {}<a href="/x/profil/spieler/777">X</a></div>"#,
            "é".repeat(850)
        );
        let minutes = extract_substitution_minutes(&doc(&html), "777");
        assert_eq!(minutes.into_iter().collect::<Vec<_>>(), vec![64]);
    }
}
