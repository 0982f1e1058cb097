use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::query::SeasonAnalytics;

pub struct ExportReport {
    pub standings_rows: usize,
    pub referee_rows: usize,
    pub value_bet_rows: usize,
    pub implied_rows: usize,
}

/// Write the season's headline tables into one workbook, one sheet per
/// table.
pub fn export_season(path: &Path, season: &mut SeasonAnalytics) -> Result<ExportReport> {
    let mut standings_rows = vec![vec![
        "Pos".to_string(),
        "Team".to_string(),
        "P".to_string(),
        "W".to_string(),
        "D".to_string(),
        "L".to_string(),
        "GF".to_string(),
        "GA".to_string(),
        "GD".to_string(),
        "Pts".to_string(),
        "Form".to_string(),
        "Momentum".to_string(),
    ]];
    for row in season.standings() {
        standings_rows.push(vec![
            row.position.to_string(),
            row.team.clone(),
            row.played.to_string(),
            row.wins.to_string(),
            row.draws.to_string(),
            row.losses.to_string(),
            row.goals_for.to_string(),
            row.goals_against.to_string(),
            row.goal_difference.to_string(),
            row.points.to_string(),
            row.form.clone(),
            opt_to_string(row.momentum.map(|m| format!("{m:.2}"))),
        ]);
    }

    let mut referee_rows = vec![vec![
        "Referee".to_string(),
        "Matches".to_string(),
        "Yellows".to_string(),
        "Reds".to_string(),
        "Cards/Match".to_string(),
        "Fouls/Match".to_string(),
    ]];
    for rec in season.referee_leaderboard() {
        referee_rows.push(vec![
            rec.referee.clone(),
            rec.matches.to_string(),
            rec.yellows.to_string(),
            rec.reds.to_string(),
            opt_to_string(rec.cards_per_match.map(|v| format!("{v:.2}"))),
            opt_to_string(rec.fouls_per_match.map(|v| format!("{v:.2}"))),
        ]);
    }

    let mut value_bet_rows = vec![vec![
        "Date".to_string(),
        "Home".to_string(),
        "Away".to_string(),
        "Outcome".to_string(),
        "Odds".to_string(),
        "Implied".to_string(),
        "Baseline".to_string(),
        "Edge".to_string(),
    ]];
    for bet in season.value_bets() {
        value_bet_rows.push(vec![
            bet.date.format("%d/%m/%Y").to_string(),
            bet.home_team.clone(),
            bet.away_team.clone(),
            bet.outcome.code().to_string(),
            format!("{:.2}", bet.market_odds),
            format!("{:.3}", bet.implied),
            format!("{:.3}", bet.baseline),
            format!("{:+.3}", bet.edge),
        ]);
    }

    let mut implied_rows = vec![vec![
        "Date".to_string(),
        "Home".to_string(),
        "Away".to_string(),
        "P(Home)".to_string(),
        "P(Draw)".to_string(),
        "P(Away)".to_string(),
        "Overround".to_string(),
    ]];
    for row in season.implied_table() {
        let mut cells = vec![
            row.date.format("%d/%m/%Y").to_string(),
            row.home_team.clone(),
            row.away_team.clone(),
        ];
        match row.probs {
            Some(p) => cells.extend([
                format!("{:.3}", p.home),
                format!("{:.3}", p.draw),
                format!("{:.3}", p.away),
                format!("{:.3}", p.overround),
            ]),
            None => cells.extend([String::new(), String::new(), String::new(), String::new()]),
        }
        implied_rows.push(cells);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Standings")?;
        write_rows(sheet, &standings_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Referees")?;
        write_rows(sheet, &referee_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("ValueBets")?;
        write_rows(sheet, &value_bet_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("ImpliedProbs")?;
        write_rows(sheet, &implied_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        standings_rows: standings_rows.len().saturating_sub(1),
        referee_rows: referee_rows.len().saturating_sub(1),
        value_bet_rows: value_bet_rows.len().saturating_sub(1),
        implied_rows: implied_rows.len().saturating_sub(1),
    })
}

fn opt_to_string(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
