//! Starting status, pitch window and goal attribution for one player in one match.
//!
//! Official minutes played and the substitution minutes found in the report
//! are sourced independently and often disagree by a few minutes. Each
//! candidate minute is tested against two hypotheses and the closest fit wins.

use std::collections::BTreeSet;

use crate::types::{AttributionResult, GoalEvent, GoalTally, PerformanceRow, PitchWindow};

const FULL_TIME: i64 = 90;
/// Below this many minutes a player without a substitution event is assumed
/// to have come off the bench.
const SUBSTITUTE_THRESHOLD: i64 = 46;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Substitution {
    /// Went off at the candidate minute.
    Out,
    /// Came on at the candidate minute.
    In,
}

/// Closest (minute, direction) over all candidates. `Out` wins an exact tie
/// within a candidate; an earlier candidate wins a tie across candidates.
fn closest_substitution(minutes_played: i64, candidates: &[u32]) -> Option<(u32, Substitution)> {
    let mut best: Option<(u32, Substitution, i64)> = None;
    for &minute in candidates {
        let m = i64::from(minute);
        let diff_out = (m - minutes_played).abs();
        let diff_in = (m - (FULL_TIME - minutes_played)).abs();
        let (kind, diff) = if diff_out <= diff_in {
            (Substitution::Out, diff_out)
        } else {
            (Substitution::In, diff_in)
        };
        if best.map_or(true, |(_, _, best_diff)| diff < best_diff) {
            best = Some((minute, kind, diff));
        }
    }
    best.map(|(minute, kind, _)| (minute, kind))
}

fn clamp_window(starting_eleven: bool, on_minute: u32, off_minute: u32) -> PitchWindow {
    let off_minute = if off_minute < on_minute {
        on_minute.max(FULL_TIME as u32)
    } else {
        off_minute
    };
    PitchWindow {
        starting_eleven,
        on_minute,
        off_minute,
    }
}

/// Derives whether the player started and the minutes they were on the pitch.
///
/// `substitution_minutes` must be sorted ascending; the first minute is used
/// when minutes played are unknown.
pub fn derive_starting_and_window(minutes_played: Option<u32>, substitution_minutes: &[u32]) -> PitchWindow {
    let Some(played) = minutes_played else {
        return match substitution_minutes.first() {
            Some(&on) => clamp_window(false, on, FULL_TIME as u32),
            None => clamp_window(true, 0, FULL_TIME as u32),
        };
    };
    let played = i64::from(played);

    let mut came_on: Option<u32> = None;
    let mut went_off: Option<u32> = None;
    let starting_eleven = match closest_substitution(played, substitution_minutes) {
        Some((minute, Substitution::Out)) => {
            went_off = Some(minute);
            true
        }
        Some((minute, Substitution::In)) => {
            came_on = Some(minute);
            false
        }
        None if played < SUBSTITUTE_THRESHOLD => {
            came_on = Some((FULL_TIME - played).max(0) as u32);
            false
        }
        None => true,
    };

    let on_minute = if starting_eleven {
        0
    } else {
        came_on.unwrap_or_else(|| (FULL_TIME - played).max(0) as u32)
    };
    let off_minute = match went_off {
        Some(minute) => minute,
        None if starting_eleven && played < FULL_TIME => played as u32,
        None => FULL_TIME as u32,
    };

    clamp_window(starting_eleven, on_minute, off_minute)
}

/// Goals for and against the player's club while they were on the pitch,
/// both bounds inclusive.
pub fn attribute_goals(goals: &[GoalEvent], on_minute: u32, off_minute: u32, club_id: &str) -> GoalTally {
    goals
        .iter()
        .filter(|goal| (on_minute..=off_minute).contains(&goal.minute))
        .fold(GoalTally::default(), |mut tally, goal| {
            if goal.club_id == club_id {
                tally.goals_for += 1;
            } else {
                tally.goals_conceded += 1;
            }
            tally
        })
}

/// Full attribution for a performance row. `None` when the player did not
/// play or the row has no club.
pub fn attribute(
    row: &PerformanceRow,
    goals: &[GoalEvent],
    substitution_minutes: &BTreeSet<u32>,
) -> Option<AttributionResult> {
    if !row.played() {
        return None;
    }
    let club_id = row.club_id.as_deref()?;
    let candidates: Vec<u32> = substitution_minutes.iter().copied().collect();
    let window = derive_starting_and_window(row.minutes_played, &candidates);
    let tally = attribute_goals(goals, window.on_minute, window.off_minute, club_id);
    Some(AttributionResult {
        starting_eleven: window.starting_eleven,
        on_minute: window.on_minute,
        off_minute: window.off_minute,
        team_goals_while_on: tally.goals_for,
        team_goals_conceded_while_on: tally.goals_conceded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(starting_eleven: bool, on_minute: u32, off_minute: u32) -> PitchWindow {
        PitchWindow {
            starting_eleven,
            on_minute,
            off_minute,
        }
    }

    #[test]
    fn test_full_match_without_substitution() {
        assert_eq!(derive_starting_and_window(Some(90), &[]), window(true, 0, 90));
    }

    #[test]
    fn test_substitute_coming_on() {
        // diff_out = 50, diff_in = 0
        assert_eq!(derive_starting_and_window(Some(20), &[70]), window(false, 70, 90));
    }

    #[test]
    fn test_starter_going_off() {
        // diff_out = 0, diff_in = 50
        assert_eq!(derive_starting_and_window(Some(70), &[70]), window(true, 0, 70));
    }

    #[test]
    fn test_exact_tie_prefers_going_off() {
        // 45 minutes: diff_out == diff_in for minute 45
        assert_eq!(derive_starting_and_window(Some(45), &[45]), window(true, 0, 45));
    }

    #[test]
    fn test_earlier_candidate_wins_tie_across_candidates() {
        // minutes 58 and 62 are both 2 away from 60 played
        assert_eq!(derive_starting_and_window(Some(60), &[58, 62]), window(true, 0, 58));
    }

    #[test]
    fn test_unknown_minutes() {
        assert_eq!(derive_starting_and_window(None, &[]), window(true, 0, 90));
        assert_eq!(derive_starting_and_window(None, &[63, 80]), window(false, 63, 90));
    }

    #[test]
    fn test_unknown_minutes_stoppage_substitution_is_clamped() {
        assert_eq!(derive_starting_and_window(None, &[93]), window(false, 93, 93));
    }

    #[test]
    fn test_short_appearance_without_event_is_substitute() {
        assert_eq!(derive_starting_and_window(Some(15), &[]), window(false, 75, 90));
        assert_eq!(derive_starting_and_window(Some(46), &[]), window(true, 0, 46));
    }

    #[test]
    fn test_starter_with_partial_minutes_goes_off_at_minutes_played() {
        assert_eq!(derive_starting_and_window(Some(78), &[]), window(true, 0, 78));
    }

    #[test]
    fn test_extra_time_minutes() {
        let w = derive_starting_and_window(Some(120), &[]);
        assert_eq!(w, window(true, 0, 90));
        let w = derive_starting_and_window(Some(120), &[105]);
        assert!(w.on_minute <= w.off_minute);
    }

    #[test]
    fn test_window_never_inverted() {
        let candidate_sets: [&[u32]; 6] = [&[], &[1], &[45], &[89, 95], &[0, 120], &[93]];
        for minutes in [None, Some(0), Some(1), Some(30), Some(45), Some(46), Some(89), Some(90), Some(120)] {
            for candidates in candidate_sets {
                let w = derive_starting_and_window(minutes, candidates);
                assert!(
                    w.on_minute <= w.off_minute,
                    "inverted window {:?} for {:?} / {:?}",
                    w,
                    minutes,
                    candidates
                );
            }
        }
    }

    #[test]
    fn test_attribute_goals() {
        let goals = vec![GoalEvent::new(30, "A"), GoalEvent::new(80, "B")];
        let tally = attribute_goals(&goals, 0, 90, "A");
        assert_eq!(tally, GoalTally { goals_for: 1, goals_conceded: 1 });

        let tally = attribute_goals(&goals, 31, 79, "A");
        assert_eq!(tally, GoalTally::default());

        // bounds are inclusive
        let tally = attribute_goals(&goals, 30, 80, "B");
        assert_eq!(tally, GoalTally { goals_for: 1, goals_conceded: 1 });
    }

    #[test]
    fn test_attribute_row() {
        let row = PerformanceRow {
            match_id: "1".to_string(),
            match_href: "/x/index/spielbericht/1".to_string(),
            club_id: Some("A".to_string()),
            goals: 0,
            assists: 0,
            yellow: 0,
            yellow_red: 0,
            red: 0,
            minutes_played: Some(20),
        };
        let goals = vec![GoalEvent::new(30, "A"), GoalEvent::new(80, "B")];
        let subs: BTreeSet<u32> = [70].into_iter().collect();
        let result = attribute(&row, &goals, &subs).unwrap();
        assert!(!result.starting_eleven);
        assert_eq!((result.on_minute, result.off_minute), (70, 90));
        assert_eq!(result.team_goals_while_on, 0);
        assert_eq!(result.team_goals_conceded_while_on, 1);

        let bench = PerformanceRow {
            minutes_played: None,
            ..row
        };
        assert!(attribute(&bench, &goals, &subs).is_none());
    }
}
