use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use f1_terminal::standings::{
    Points, SeriesStyle, StandingsRecord, StrokeWeight, build_matrix, resolve_style, style_map,
};

fn rec(round: u32, competitor: &str, points: f64) -> StandingsRecord {
    StandingsRecord::new(round, competitor, Points::Value(points))
}

fn sample_season() -> Vec<StandingsRecord> {
    vec![
        rec(1, "ham", 25.0),
        rec(1, "vet", 18.0),
        rec(1, "bot", 15.0),
        rec(2, "ham", 43.0),
        rec(2, "bot", 40.0),
        rec(3, "vet", 36.0),
        rec(3, "lec", 2.0),
        rec(4, "ham", 68.0),
        rec(4, "vet", 0.0),
    ]
}

#[test]
fn example_season_matches_expected_rows() {
    let records = vec![rec(1, "ham", 10.0), rec(1, "vet", 8.0), rec(2, "ham", 18.0)];
    let matrix = build_matrix(&records);

    assert_eq!(matrix.competitors(), ["ham", "vet"]);
    let rows = matrix.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].round, 1);
    assert_eq!(rows[0].get("ham"), Some(Some(10.0)));
    assert_eq!(rows[0].get("vet"), Some(Some(8.0)));
    assert_eq!(rows[1].round, 2);
    assert_eq!(rows[1].get("ham"), Some(Some(18.0)));
    assert_eq!(rows[1].get("vet"), Some(None));
}

#[test]
fn rows_serialize_as_flat_objects() {
    let records = vec![rec(1, "ham", 10.0), rec(1, "vet", 8.0), rec(2, "ham", 18.0)];
    let matrix = build_matrix(&records);
    let json = serde_json::to_value(matrix.rows()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"round": 1, "ham": 10.0, "vet": 8.0},
            {"round": 2, "ham": 18.0, "vet": null}
        ])
    );
}

#[test]
fn competitor_named_round_does_not_duplicate_the_key() {
    let matrix = build_matrix(&[rec(1, "ham", 7.0), rec(1, "round", 5.0)]);
    assert_eq!(matrix.competitors(), ["ham", "round"]);
    assert_eq!(matrix.rows()[0].get("round"), Some(Some(5.0)));

    let json = serde_json::to_string(matrix.rows()).unwrap();
    assert_eq!(json, r#"[{"round":1,"ham":7.0}]"#);
}

#[test]
fn empty_input_gives_empty_matrix() {
    let matrix = build_matrix(&[]);
    assert!(matrix.is_empty());
    assert!(matrix.rows().is_empty());
    assert!(matrix.competitors().is_empty());
    assert_eq!(matrix.value_range(), None);
}

#[test]
fn non_numeric_points_become_zero() {
    let records = vec![StandingsRecord::new(1, "ham", Points::NotANumber)];
    let matrix = build_matrix(&records);
    assert_eq!(matrix.rows()[0].get("ham"), Some(Some(0.0)));

    let parsed: StandingsRecord =
        serde_json::from_str(r#"{"round": 1, "competitor": "ham", "points": "DNF"}"#).unwrap();
    let matrix = build_matrix(&[parsed]);
    assert_eq!(matrix.rows()[0].get("ham"), Some(Some(0.0)));
}

#[test]
fn absence_is_distinct_from_reported_zero() {
    let matrix = build_matrix(&sample_season());
    let r4 = matrix.row(4).unwrap();
    assert_eq!(r4.get("vet"), Some(Some(0.0)));
    assert_eq!(r4.get("bot"), Some(None));
    assert_eq!(r4.get("lec"), Some(None));
    assert_eq!(r4.get("nobody"), None);
}

#[test]
fn every_row_has_every_competitor() {
    let matrix = build_matrix(&sample_season());
    let expected: Vec<&str> = vec!["bot", "ham", "lec", "vet"];
    assert_eq!(matrix.competitors(), expected.as_slice());
    for row in matrix.rows() {
        let keys: Vec<&str> = row.cells.keys().map(String::as_str).collect();
        assert_eq!(keys, expected, "round {} is not dense", row.round);
    }
}

#[test]
fn rows_are_ascending_by_round() {
    let mut records = sample_season();
    records.reverse();
    let matrix = build_matrix(&records);
    let rounds: Vec<u32> = matrix.rows().iter().map(|r| r.round).collect();
    assert_eq!(rounds, vec![1, 2, 3, 4]);
}

#[test]
fn input_order_does_not_change_the_matrix() {
    let baseline = build_matrix(&sample_season());
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let mut shuffled = sample_season();
        shuffled.shuffle(&mut rng);
        assert_eq!(build_matrix(&shuffled), baseline);
    }
    assert_eq!(build_matrix(&sample_season()), baseline);
}

#[test]
fn duplicate_records_last_seen_wins() {
    let records = vec![rec(1, "ham", 10.0), rec(1, "vet", 8.0), rec(1, "ham", 12.0)];
    let matrix = build_matrix(&records);
    assert_eq!(matrix.rows().len(), 1);
    assert_eq!(matrix.rows()[0].get("ham"), Some(Some(12.0)));

    let reversed = vec![rec(1, "ham", 12.0), rec(1, "vet", 8.0), rec(1, "ham", 10.0)];
    assert_eq!(build_matrix(&reversed).rows()[0].get("ham"), Some(Some(10.0)));
}

#[test]
fn flattened_records_rebuild_the_same_matrix() {
    let mut records = sample_season();
    records.push(StandingsRecord::new(5, "lec", Points::NotANumber));
    let matrix = build_matrix(&records);
    let rebuilt = build_matrix(&matrix.to_records());
    assert_eq!(rebuilt, matrix);
}

#[test]
fn projection_keeps_rounds_and_selected_columns() {
    let matrix = build_matrix(&sample_season());
    let h2h = matrix.retain_competitors(&["ham", "lec"]);
    assert_eq!(h2h.competitors(), ["ham", "lec"]);
    assert_eq!(h2h.rows().len(), matrix.rows().len());
    let r2 = h2h.row(2).unwrap();
    assert_eq!(r2.get("ham"), Some(Some(43.0)));
    assert_eq!(r2.get("lec"), Some(None));
    assert_eq!(r2.get("vet"), None);
}

#[test]
fn value_range_ignores_gaps() {
    let matrix = build_matrix(&sample_season());
    assert_eq!(matrix.value_range(), Some((0.0, 68.0)));
}

#[test]
fn subject_series_is_emphasized() {
    for id in ["ham", "vet", "max_verstappen", ""] {
        let style = resolve_style(id, id);
        assert!(style.emphasized);
        assert_eq!(style.stroke_weight, StrokeWeight::Bold);
    }
}

#[test]
fn other_series_are_muted() {
    assert_eq!(resolve_style("vet", "ham"), SeriesStyle::MUTED);
    assert_eq!(resolve_style("Ham", "ham"), SeriesStyle::MUTED);
    assert_eq!(resolve_style("ham ", "ham"), SeriesStyle::HIGHLIGHT);
}

#[test]
fn style_map_covers_every_column() {
    let matrix = build_matrix(&sample_season());
    let styles = style_map(matrix.competitors(), Some("ham"));
    assert_eq!(styles.len(), 4);
    assert_eq!(styles["ham"], SeriesStyle::HIGHLIGHT);
    assert_eq!(styles["vet"], SeriesStyle::MUTED);

    let none = style_map(matrix.competitors(), None);
    assert!(none.values().all(|s| *s == SeriesStyle::MUTED));
}
