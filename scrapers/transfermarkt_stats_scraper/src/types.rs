use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Raw markup of one match report ("Spielbericht").
///
/// JSON-escaped slashes (`\/`) are normalized to `/` on construction so that
/// identifier patterns match inside embedded script payloads too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDocument {
    text: String,
}

impl MatchDocument {
    pub fn new(raw: &str) -> Result<Self, EngineError> {
        if raw.trim().is_empty() {
            return Err(EngineError::EmptyDocument);
        }
        Ok(Self {
            text: raw.replace("\\/", "/"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A goal scored at `minute` by the club with id `club_id`.
///
/// Ordering is by minute first, which keeps goal sequences minute-ascending.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoalEvent {
    pub minute: u32,
    pub club_id: String,
}

impl GoalEvent {
    pub fn new(minute: u32, club_id: impl Into<String>) -> Self {
        Self {
            minute,
            club_id: club_id.into(),
        }
    }
}

/// One appearance row from a player's season performance table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub match_id: String,
    pub match_href: String,
    pub club_id: Option<String>,
    pub goals: u32,
    pub assists: u32,
    pub yellow: u32,
    pub yellow_red: u32,
    pub red: u32,
    pub minutes_played: Option<u32>,
}

impl PerformanceRow {
    /// Rows without minutes, or with zero minutes, are appearances on the bench.
    pub fn played(&self) -> bool {
        matches!(self.minutes_played, Some(minutes) if minutes > 0)
    }
}

/// When a player was on the pitch, as derived from minutes played and
/// substitution evidence. `on_minute <= off_minute` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchWindow {
    pub starting_eleven: bool,
    pub on_minute: u32,
    pub off_minute: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalTally {
    pub goals_for: u32,
    pub goals_conceded: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub starting_eleven: bool,
    pub on_minute: u32,
    pub off_minute: u32,
    pub team_goals_while_on: u32,
    pub team_goals_conceded_while_on: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamResult {
    Win,
    Draw,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    #[serde(rename = "win_home")]
    HomeWin,
    #[serde(rename = "draw")]
    Draw,
    #[serde(rename = "win_away")]
    AwayWin,
}

/// A fixture as listed on a season schedule page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub match_id: String,
    pub match_slug: Option<String>,
    pub date: Option<NaiveDate>,
    pub home_club_id: String,
    pub away_club_id: String,
    pub score_home: Option<u32>,
    pub score_away: Option<u32>,
}

impl MatchInfo {
    pub fn involves(&self, club_id: &str) -> bool {
        self.home_club_id == club_id || self.away_club_id == club_id
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        let (home, away) = (self.score_home?, self.score_away?);
        Some(if home == away {
            MatchOutcome::Draw
        } else if home > away {
            MatchOutcome::HomeWin
        } else {
            MatchOutcome::AwayWin
        })
    }

    /// Result from the point of view of `club_id`. `None` without a score or
    /// when the club did not take part.
    pub fn result_for(&self, club_id: &str) -> Option<TeamResult> {
        let outcome = self.outcome()?;
        let is_home = if self.home_club_id == club_id {
            true
        } else if self.away_club_id == club_id {
            false
        } else {
            return None;
        };
        Some(match (outcome, is_home) {
            (MatchOutcome::Draw, _) => TeamResult::Draw,
            (MatchOutcome::HomeWin, true) | (MatchOutcome::AwayWin, false) => TeamResult::Win,
            _ => TeamResult::Loss,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub player_slug: String,
}

/// Output row: one player in one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMatchStat {
    pub player_id: String,
    pub match_id: String,
    pub club_id: String,
    pub goals: u32,
    pub assists: u32,
    pub yellow: u32,
    pub yellow_red: u32,
    pub red: u32,
    /// 1 when the player was in the starting eleven.
    pub start_11: u8,
    pub minutes: u32,
    pub on_min: u32,
    pub off_min: u32,
    pub team_goals: u32,
    pub team_conceded: u32,
    pub result: Option<TeamResult>,
}
