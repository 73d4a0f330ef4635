use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use f1_terminal::api::parse_standings_json;
use f1_terminal::chart::series_for;
use f1_terminal::standings::{Points, StandingsRecord, build_matrix, style_map};

/// A 22-round season for 20 drivers, shuffled, with a few drivers missing rounds.
fn synthetic_season() -> Vec<StandingsRecord> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut records = Vec::new();
    for driver in 0..20 {
        let mut total = 0.0;
        for round in 1..=22u32 {
            if rng.gen_bool(0.05) {
                continue;
            }
            total += f64::from(rng.gen_range(0..=26u32));
            records.push(StandingsRecord::new(
                round,
                format!("driver_{driver:02}"),
                Points::Value(total),
            ));
        }
    }
    records.shuffle(&mut rng);
    records
}

fn bench_build_matrix(c: &mut Criterion) {
    let records = synthetic_season();
    c.bench_function("build_matrix", |b| {
        b.iter(|| {
            let matrix = build_matrix(black_box(&records));
            black_box(matrix.rows().len());
        })
    });
}

fn bench_chart_series(c: &mut Criterion) {
    let matrix = build_matrix(&synthetic_season());
    let styles = style_map(matrix.competitors(), Some("driver_07"));
    c.bench_function("chart_series", |b| {
        b.iter(|| {
            let series = series_for(black_box(&matrix), &styles);
            black_box(series.len());
        })
    });
}

fn bench_standings_parse(c: &mut Criterion) {
    c.bench_function("standings_parse", |b| {
        b.iter(|| {
            let rows = parse_standings_json(black_box(STANDINGS_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_build_matrix,
    bench_chart_series,
    bench_standings_parse
);
criterion_main!(perf);

static STANDINGS_JSON: &str = include_str!("../tests/fixtures/driver_standings.json");
