use std::path::PathBuf;

use chrono::NaiveDate;

use epl_desk::dataset::DatasetError;
use epl_desk::export::export_season;
use epl_desk::h2h::Confidence;
use epl_desk::params::AnalyticsParams;
use epl_desk::query::SeasonAnalytics;
use epl_desk::validate::DataWarning;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn load_sample() -> SeasonAnalytics {
    SeasonAnalytics::from_csv_path(&fixture_path("season_sample.csv"), AnalyticsParams::default())
        .expect("fixture should load")
}

#[test]
fn sample_season_table_is_consistent() {
    let mut season = load_sample();
    let standings = season.standings();
    assert_eq!(standings.len(), 4);
    // Duplicate fixture row is warned about but still counted.
    assert_eq!(standings.iter().map(|s| s.played).sum::<u32>(), 18);

    let order: Vec<&str> = standings.iter().map(|s| s.team.as_str()).collect();
    assert_eq!(order, ["Liverpool", "Arsenal", "Spurs", "Chelsea"]);
    let liverpool = &standings[0];
    assert_eq!(liverpool.points, 8);
    assert_eq!((liverpool.wins, liverpool.draws, liverpool.losses), (2, 2, 0));
    assert_eq!(liverpool.form, "WDWD");

    for row in &standings {
        assert_eq!(row.points, 3 * row.wins + row.draws);
        assert_eq!(row.goal_difference, row.goals_for - row.goals_against);
        assert_eq!(row.position, standings.iter().position(|s| s.team == row.team).unwrap() + 1);
    }
}

#[test]
fn sample_season_surfaces_warnings() {
    let season = load_sample();
    let report = season.validation_report();

    assert_eq!(report.duplicates(), 1);
    let dup = report
        .warnings
        .iter()
        .find_map(|w| match w {
            DataWarning::DuplicateRecord {
                date,
                home_team,
                rows,
                ..
            } => Some((date, home_team, rows)),
            _ => None,
        })
        .expect("duplicate warning");
    assert_eq!(*dup.0, NaiveDate::from_ymd_opt(2024, 9, 21).unwrap());
    assert_eq!(dup.1, "Spurs");
    assert_eq!(dup.2, &vec![8, 9]);

    // Out-of-range B365 home price and the impossible shots-on-target.
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        DataWarning::DataQuality { row: 3, field, .. } if field == "B365H"
    )));
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        DataWarning::DataQuality { row: 2, field, .. } if field == "home shots"
    )));
}

#[test]
fn sample_season_is_cleaned() {
    let season = load_sample();
    let matches = season.matches();

    // BW had no draw price in the opening fixture; the only other book did.
    let bw = matches[0].odds.books.get("BW").unwrap();
    assert_eq!(bw.draw, Some(3.40));

    // Row 3's B365 home price was recoded out, then imputed from BW.
    let b365 = matches[2].odds.books.get("B365").unwrap();
    assert_eq!(b365.home, Some(3.05));

    // Blank referee cell becomes the explicit unknown bucket.
    assert_eq!(matches[3].referee.as_deref(), Some("Unknown"));
}

#[test]
fn sample_season_referees_and_fixture_views() {
    let mut season = load_sample();
    let board = season.referee_leaderboard();
    assert_eq!(board[0].referee, "M Oliver");
    assert_eq!(board[0].matches, 3);
    assert!(board.iter().any(|r| r.referee == "Unknown" && r.matches == 1));
    assert!(matches!(
        season.referee_row("J Moss"),
        Err(DatasetError::InsufficientData { .. })
    ));

    let wp = season.win_probability("Arsenal", "Chelsea");
    assert!((wp.home_win + wp.draw + wp.away_win - 1.0).abs() < 1e-9);
    assert_eq!(wp.confidence, Confidence::High);

    let h2h = season.h2h_summary("Spurs", "Chelsea").unwrap();
    assert_eq!(h2h.meetings, 3);
    assert_eq!(h2h.team_a_wins, 2);
    assert_eq!(h2h.draws, 1);
}

#[test]
fn export_writes_workbook() {
    let mut season = load_sample();
    let path = std::env::temp_dir().join(format!(
        "epl_desk_export_{}.xlsx",
        std::process::id()
    ));
    let report = export_season(&path, &mut season).expect("export should succeed");
    assert!(path.exists());
    assert_eq!(report.standings_rows, 4);
    assert_eq!(report.implied_rows, 9);
    assert!(report.referee_rows >= 4);
    let _ = std::fs::remove_file(&path);
}
