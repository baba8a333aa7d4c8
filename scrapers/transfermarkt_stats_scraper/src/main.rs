use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::info;

use transfermarkt_stats_scraper::{
    attribution::{attribute_goals, derive_starting_and_window},
    collector::{collect_matches, PlayerStatsCollector},
    config::ScraperConfig,
    fetch::HttpSource,
    match_report::{extract_goal_events, extract_substitution_minutes},
    matches::parse_matches,
    output::{read_matches, read_players, write_match_rows, write_matches, write_player_stats},
    performance::PerformancePage,
    types::MatchDocument,
};

/// League label of the default fixture list template.
const DEFAULT_LEAGUE: &str = "CHPR";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the rows of a saved performance page as CSV
    Performance {
        /// Path to the performance page HTML
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Attribute goals in a saved match report to one player
    Report {
        /// Path to the match report HTML
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        player: String,
        #[arg(short, long)]
        club: String,
        /// Minutes played, if known
        #[arg(short, long)]
        minutes: Option<u32>,
    },
    /// Write the matches CSV from a saved fixture list page, or fetch the
    /// played fixtures of the configured seasons when no file is given
    Matches {
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        /// Single season to fetch or to label the saved page with
        #[arg(short, long)]
        season: Option<i32>,
        #[arg(short, long)]
        league: Option<String>,
    },
    /// Fetch performance pages and match reports and write player match stats
    Collect {
        #[arg(long)]
        players: PathBuf,
        #[arg(long)]
        matches: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn read_html(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_performance(file: &Path) -> Result<()> {
    let page = PerformancePage::parse(&read_html(file)?)?;
    let Some(table) = page.select_performance_table() else {
        anyhow::bail!("No performance table found in {}", file.display());
    };
    let mut wtr = csv::Writer::from_writer(io::stdout());
    for row in table.extract_rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_report(file: &Path, player: &str, club: &str, minutes: Option<u32>) -> Result<()> {
    let document = MatchDocument::new(&read_html(file)?)?;
    let goals = extract_goal_events(&document);
    let substitutions: Vec<u32> = extract_substitution_minutes(&document, player).into_iter().collect();
    let window = derive_starting_and_window(minutes, &substitutions);
    let tally = attribute_goals(&goals, window.on_minute, window.off_minute, club);

    let report = serde_json::json!({
        "goals": goals,
        "substitution_minutes": substitutions,
        "window": window,
        "tally": tally,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn fetch_matches(output: &Path, season: Option<i32>, league: &str) -> Result<()> {
    let mut config = ScraperConfig::from_env();
    if let Some(season) = season {
        config.seasons.start_year = season;
        config.seasons.end_year = season + 1;
    }
    let source = HttpSource::new(&config)?;
    let today = Local::now().date_naive();
    let rows = collect_matches(&source, &config, league, today)?;
    write_match_rows(output, &rows)
}

fn collect(players: &Path, matches: &Path, output: &Path) -> Result<()> {
    let config = ScraperConfig::from_env();
    let players = read_players(players)?;
    let matches = read_matches(matches)?;
    info!(
        "Collecting {} players against {} matches, seasons {:?}",
        players.len(),
        matches.len(),
        config.seasons.years()
    );

    let source = HttpSource::new(&config)?;
    let collector = PlayerStatsCollector::new(source, config);
    let stats = collector.collect(&players, &matches)?;
    write_player_stats(output, &stats)?;

    println!("{}", collector.metrics().get_metrics());
    Ok(())
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Performance { file } => print_performance(&file)?,
        Commands::Report {
            file,
            player,
            club,
            minutes,
        } => print_report(&file, &player, &club, minutes)?,
        Commands::Matches {
            file: Some(file),
            output,
            season,
            league,
        } => {
            let matches = parse_matches(&read_html(&file)?)?;
            write_matches(&output, &matches, season, league.as_deref())?;
            info!("Parsed {} matches from {}", matches.len(), file.display());
        }
        Commands::Matches {
            file: None,
            output,
            season,
            league,
        } => fetch_matches(&output, season, league.as_deref().unwrap_or(DEFAULT_LEAGUE))?,
        Commands::Collect {
            players,
            matches,
            output,
        } => collect(&players, &matches, &output)?,
    }

    Ok(())
}
