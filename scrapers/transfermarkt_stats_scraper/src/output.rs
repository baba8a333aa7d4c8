use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

use crate::types::{MatchInfo, MatchOutcome, Player, PlayerMatchStat};

/// One line of the matches CSV. Column names follow the existing data files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    pub match_id: String,
    pub season: Option<i32>,
    #[serde(rename = "datum")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "liga")]
    pub league: Option<String>,
    #[serde(rename = "heimmannschaft")]
    pub home_club_id: String,
    #[serde(rename = "gastmannschaft")]
    pub away_club_id: String,
    pub score_home: Option<u32>,
    pub score_away: Option<u32>,
    pub result: Option<MatchOutcome>,
}

impl MatchRow {
    pub fn from_match(info: &MatchInfo, season: Option<i32>, league: Option<&str>) -> Self {
        Self {
            match_id: info.match_id.clone(),
            season,
            date: info.date,
            league: league.map(str::to_string),
            home_club_id: info.home_club_id.clone(),
            away_club_id: info.away_club_id.clone(),
            score_home: info.score_home,
            score_away: info.score_away,
            result: info.outcome(),
        }
    }
}

impl From<MatchRow> for MatchInfo {
    fn from(row: MatchRow) -> Self {
        MatchInfo {
            match_id: row.match_id,
            match_slug: None,
            date: row.date,
            home_club_id: row.home_club_id,
            away_club_id: row.away_club_id,
            score_home: row.score_home,
            score_away: row.score_away,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlayerRecord {
    player_id: Option<String>,
    player_slug: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Reads `player_id,player_slug`. Rows missing either value are dropped and
/// extra columns are ignored.
pub fn read_players(path: &Path) -> Result<Vec<Player>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut players = Vec::new();
    for record in rdr.deserialize::<PlayerRecord>() {
        let record = record.with_context(|| format!("Invalid player row in {}", path.display()))?;
        if let (Some(player_id), Some(player_slug)) = (non_empty(record.player_id), non_empty(record.player_slug)) {
            players.push(Player { player_id, player_slug });
        }
    }
    Ok(players)
}

pub fn read_matches(path: &Path) -> Result<Vec<MatchInfo>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    rdr.deserialize::<MatchRow>()
        .map(|row| {
            row.map(MatchInfo::from)
                .with_context(|| format!("Invalid match row in {}", path.display()))
        })
        .collect()
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_matches(path: &Path, matches: &[MatchInfo], season: Option<i32>, league: Option<&str>) -> Result<()> {
    let rows: Vec<MatchRow> = matches
        .iter()
        .map(|m| MatchRow::from_match(m, season, league))
        .collect();
    write_rows(path, &rows)
}

pub fn write_match_rows(path: &Path, rows: &[MatchRow]) -> Result<()> {
    write_rows(path, rows)
}

pub fn write_player_stats(path: &Path, stats: &[PlayerMatchStat]) -> Result<()> {
    write_rows(path, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TeamResult;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn fixture() -> MatchInfo {
        MatchInfo {
            match_id: "4001".to_string(),
            match_slug: Some("fc-a_fc-b".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 8, 2),
            home_club_id: "10".to_string(),
            away_club_id: "20".to_string(),
            score_home: Some(0),
            score_away: Some(3),
        }
    }

    #[test]
    fn test_read_players_drops_incomplete_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.csv");
        fs::write(
            &path,
            "player_id,player_slug,name\n7,max-muster,Max\n,leer,\n8,,Ohne Slug\n9, hans-huber ,Hans\n",
        )
        .unwrap();

        let players = read_players(&path).unwrap();
        assert_eq!(
            players,
            vec![
                Player {
                    player_id: "7".to_string(),
                    player_slug: "max-muster".to_string()
                },
                Player {
                    player_id: "9".to_string(),
                    player_slug: "hans-huber".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_matches_csv_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("matches.csv");
        write_matches(&path, &[fixture()], Some(2025), Some("CHPR")).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("match_id,season,datum,liga,heimmannschaft,gastmannschaft,score_home,score_away,result")
        );
        assert_eq!(lines.next(), Some("4001,2025,2025-08-02,CHPR,10,20,0,3,win_away"));

        let read = read_matches(&path).unwrap();
        let expected = MatchInfo {
            match_slug: None,
            ..fixture()
        };
        assert_eq!(read, vec![expected]);
    }

    #[test]
    fn test_unscored_match_has_empty_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matches.csv");
        let pending = MatchInfo {
            date: None,
            score_home: None,
            score_away: None,
            ..fixture()
        };
        write_matches(&path, &[pending], None, None).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(1), Some("4001,,,,10,20,,,"));
        let read = read_matches(&path).unwrap();
        assert_eq!(read[0].score_home, None);
        assert_eq!(read[0].date, None);
    }

    #[test]
    fn test_write_player_stats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("player_stats.csv");
        let stat = PlayerMatchStat {
            player_id: "7".to_string(),
            match_id: "4001".to_string(),
            club_id: "20".to_string(),
            goals: 1,
            assists: 0,
            yellow: 1,
            yellow_red: 0,
            red: 0,
            start_11: 0,
            minutes: 30,
            on_min: 60,
            off_min: 90,
            team_goals: 2,
            team_conceded: 0,
            result: Some(TeamResult::Win),
        };
        write_player_stats(&path, &[stat]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "player_id,match_id,club_id,goals,assists,yellow,yellow_red,red,start_11,minutes,on_min,off_min,team_goals,team_conceded,result",
                "7,4001,20,1,0,1,0,0,0,30,60,90,2,0,win",
            ]
        );
    }
}
