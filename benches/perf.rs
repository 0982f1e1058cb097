use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use epl_desk::dataset::{MatchRecord, parse_matches};
use epl_desk::h2h::win_probability;
use epl_desk::odds::value_bets;
use epl_desk::params::AnalyticsParams;
use epl_desk::standings::compute_standings;

const HEADER: &str = "Div,Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HTHG,HTAG,HTR,HS,AS,HST,AST,HF,AF,HC,AC,HY,AY,HR,AR,Referee,AvgH,AvgD,AvgA";

// Deterministic double round-robin, roughly a full 20-team season.
fn synthetic_season() -> Vec<MatchRecord> {
    let teams: Vec<String> = (0..20).map(|i| format!("Team {i:02}")).collect();
    let mut csv = String::from(HEADER);
    csv.push('\n');
    let mut day = 0u32;
    for (i, home) in teams.iter().enumerate() {
        for (j, away) in teams.iter().enumerate() {
            if i == j {
                continue;
            }
            let hg = (i * 7 + j * 3) % 4;
            let ag = (i * 5 + j * 11) % 3;
            let ftr = if hg > ag {
                'H'
            } else if hg < ag {
                'A'
            } else {
                'D'
            };
            let date = format!("{:02}/{:02}/2024", 1 + day % 28, 1 + (day / 28) % 12);
            day += 1;
            let avg_h = 1.5 + (i % 5) as f64 * 0.4;
            let avg_d = 3.2 + (j % 3) as f64 * 0.2;
            let avg_a = 2.0 + (j % 6) as f64 * 0.5;
            csv.push_str(&format!(
                "E0,{date},{home},{away},{hg},{ag},{ftr},,,,,,,,,,,,,,,,Ref {},{avg_h:.2},{avg_d:.2},{avg_a:.2}\n",
                (i + j) % 10
            ));
        }
    }
    parse_matches(&csv).expect("synthetic season should parse")
}

fn bench_standings(c: &mut Criterion) {
    let matches = synthetic_season();
    let params = AnalyticsParams::default();
    c.bench_function("standings_full_season", |b| {
        b.iter(|| {
            let table = compute_standings(black_box(&matches), &params);
            black_box(table.len());
        });
    });
}

fn bench_win_probability(c: &mut Criterion) {
    let matches = synthetic_season();
    let params = AnalyticsParams::default();
    c.bench_function("win_probability", |b| {
        b.iter(|| {
            let wp = win_probability(black_box(&matches), "Team 03", "Team 11", &params);
            black_box(wp.home_win);
        });
    });
}

fn bench_value_bets(c: &mut Criterion) {
    let matches = synthetic_season();
    let params = AnalyticsParams::default();
    c.bench_function("value_bet_screen", |b| {
        b.iter(|| {
            let bets = value_bets(black_box(&matches), &params);
            black_box(bets.len());
        });
    });
}

criterion_group!(benches, bench_standings, bench_win_probability, bench_value_bets);
criterion_main!(benches);
