use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use epl_desk::export;
use epl_desk::params::{AnalyticsParams, load_params};
use epl_desk::query::SeasonAnalytics;

fn main() -> Result<()> {
    let csv_path = parse_path_arg("--csv").ok_or_else(|| {
        anyhow!("usage: epl_desk --csv <season.csv> [--params <params.json>] [--export <report.xlsx>] [--team <name>] [--fixture <home>:<away>]")
    })?;

    let params = match parse_path_arg("--params") {
        Some(path) => load_params(&path)?,
        None => AnalyticsParams::default(),
    };

    let mut season = SeasonAnalytics::from_csv_path(&csv_path, params)
        .with_context(|| format!("load season from {}", csv_path.display()))?;

    print_warnings(&season);
    print_standings(&mut season);
    print_referees(&mut season);
    print_value_bets(&mut season);

    if let Some(team) = parse_value_arg("--team") {
        print_team_detail(&mut season, &team);
    }

    if let Some(fixture) = parse_value_arg("--fixture") {
        let (home, away) = fixture
            .split_once(':')
            .ok_or_else(|| anyhow!("--fixture expects <home>:<away>"))?;
        print_fixture(&mut season, home, away);
    }

    if let Some(path) = parse_path_arg("--export") {
        let report = export::export_season(&path, &mut season)?;
        println!();
        println!(
            "Exported {}: {} standings rows, {} referees, {} value bets, {} implied rows",
            path.display(),
            report.standings_rows,
            report.referee_rows,
            report.value_bet_rows,
            report.implied_rows
        );
    }

    Ok(())
}

fn print_warnings(season: &SeasonAnalytics) {
    let report = season.validation_report();
    if report.warnings.is_empty() {
        return;
    }
    println!("Data warnings ({}):", report.warnings.len());
    for warning in report.warnings.iter().take(20) {
        println!("  - {}", warning.describe());
    }
    if report.warnings.len() > 20 {
        println!("  ... and {} more", report.warnings.len() - 20);
    }
    println!();
}

fn print_standings(season: &mut SeasonAnalytics) {
    println!(
        "{:>3} {:<20} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>5} {:>4}  {:<6} {:>5}",
        "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts", "Form", "Mom"
    );
    for row in season.standings() {
        println!(
            "{:>3} {:<20} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>5} {:>4}  {:<6} {:>5}",
            row.position,
            row.team,
            row.played,
            row.wins,
            row.draws,
            row.losses,
            row.goals_for,
            row.goals_against,
            row.goal_difference,
            row.points,
            row.form,
            row.momentum
                .map(|m| format!("{m:.2}"))
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_referees(season: &mut SeasonAnalytics) {
    let board = season.referee_leaderboard();
    if board.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<20} {:>3} {:>4} {:>4} {:>6} {:>6}",
        "Referee", "M", "Yel", "Red", "Cards", "Fouls"
    );
    for rec in board {
        println!(
            "{:<20} {:>3} {:>4} {:>4} {:>6} {:>6}",
            rec.referee,
            rec.matches,
            rec.yellows,
            rec.reds,
            rec.cards_per_match
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string()),
            rec.fouls_per_match
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_value_bets(season: &mut SeasonAnalytics) {
    let bets = season.value_bets();
    if bets.is_empty() {
        return;
    }
    println!();
    println!("Value-bet candidates ({}):", bets.len());
    for bet in bets.iter().take(15) {
        println!(
            "  {} {} v {} [{}] odds {:.2} implied {:.3} baseline {:.3} edge {:+.3}",
            bet.date.format("%d/%m/%Y"),
            bet.home_team,
            bet.away_team,
            bet.outcome.code(),
            bet.market_odds,
            bet.implied,
            bet.baseline,
            bet.edge
        );
    }
}

fn print_team_detail(season: &mut SeasonAnalytics, team: &str) {
    println!();
    match season.team_detail(team) {
        Ok(detail) => {
            println!(
                "{team}: form {} momentum {}",
                detail.form,
                detail
                    .momentum
                    .map(|m| format!("{m:.2}"))
                    .unwrap_or_else(|| "-".to_string())
            );
            for (label, stats) in [
                ("home", &detail.home),
                ("away", &detail.away),
                ("overall", &detail.overall),
            ] {
                println!(
                    "  {label}: {}W {}D {}L, GF {} GA {}",
                    stats.wins, stats.draws, stats.losses, stats.goals_for, stats.goals_against
                );
            }
        }
        Err(err) => println!("{err}"),
    }
}

fn print_fixture(season: &mut SeasonAnalytics, home: &str, away: &str) {
    println!();
    let wp = season.win_probability(home, away);
    println!(
        "{home} v {away}: home {:.1}% draw {:.1}% away {:.1}% (confidence {:?})",
        wp.home_win * 100.0,
        wp.draw * 100.0,
        wp.away_win * 100.0,
        wp.confidence
    );
    match season.h2h_summary(home, away) {
        Ok(rec) => println!(
            "  h2h: {} meetings, {}-{}-{} (goals {}-{})",
            rec.meetings,
            rec.team_a_wins,
            rec.draws,
            rec.team_b_wins,
            rec.team_a_goals,
            rec.team_b_goals
        ),
        Err(err) => println!("  {err}"),
    }
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    parse_value_arg(flag).map(PathBuf::from)
}

fn parse_value_arg(flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
