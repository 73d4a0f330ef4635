use std::fs;
use std::path::PathBuf;

use f1_terminal::api::{
    parse_driver_points_json, parse_driver_stats_json, parse_driver_years_json,
    parse_drivers_json, parse_podiums_by_season_json, parse_standings_json,
    parse_starting_positions_json,
};
use f1_terminal::standings::{Points, build_matrix};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_drivers_fixture() {
    let drivers = parse_drivers_json(&read_fixture("drivers.json")).expect("fixture should parse");
    assert_eq!(drivers.len(), 3);
    assert_eq!(drivers[0].driver, "vettel");
    assert_eq!(drivers[1].full_name, "Lewis Hamilton");
}

#[test]
fn drivers_must_be_a_list() {
    assert!(parse_drivers_json(r#"{"driver": "hamilton"}"#).is_err());
    assert!(parse_drivers_json("null").unwrap().is_empty());
}

#[test]
fn parses_driver_years_in_received_order() {
    let years = parse_driver_years_json(&read_fixture("driver_years.json")).unwrap();
    assert_eq!(years, vec![2021, 2020, 2019, 2018]);
}

#[test]
fn missing_or_null_years_mean_no_data() {
    assert!(parse_driver_years_json(r#"{"driver": "x"}"#).unwrap().is_empty());
    assert!(parse_driver_years_json(r#"{"available_years": null}"#).unwrap().is_empty());
    assert!(parse_driver_years_json("").unwrap().is_empty());
}

#[test]
fn wrong_shape_years_is_an_error() {
    let err = parse_driver_years_json(r#"{"available_years": 2021}"#).unwrap_err();
    assert!(err.to_string().contains("available_years"));
    assert!(parse_driver_years_json("[2021, 2020]").is_err());
    assert!(parse_driver_years_json("{not json").is_err());
}

#[test]
fn parses_standings_fixture_with_nan_tokens() {
    let records = parse_standings_json(&read_fixture("driver_standings.json")).unwrap();
    // Round 0 fails the shape check and is dropped.
    assert_eq!(records.len(), 9);
    assert!(records.iter().all(|r| r.round >= 1));

    let raikkonen_r2 = records
        .iter()
        .find(|r| r.competitor == "raikkonen" && r.round == 2)
        .unwrap();
    assert_eq!(raikkonen_r2.points, Points::NotANumber);

    let vettel_r3 = records
        .iter()
        .find(|r| r.competitor == "vettel" && r.round == 3)
        .unwrap();
    assert_eq!(vettel_r3.points, Points::NotANumber);

    let hamilton_r3 = records
        .iter()
        .find(|r| r.competitor == "hamilton" && r.round == 3)
        .unwrap();
    assert_eq!(hamilton_r3.points, Points::Value(45.0));
}

#[test]
fn standings_fixture_builds_dense_matrix() {
    let records = parse_standings_json(&read_fixture("driver_standings.json")).unwrap();
    let matrix = build_matrix(&records);
    assert_eq!(
        matrix.competitors(),
        ["hamilton", "raikkonen", "sainz", "vettel"]
    );
    assert_eq!(matrix.rows().len(), 3);

    let r2 = matrix.row(2).unwrap();
    assert_eq!(r2.get("raikkonen"), Some(Some(0.0)));
    assert_eq!(r2.get("sainz"), Some(None));

    let r3 = matrix.row(3).unwrap();
    assert_eq!(r3.get("vettel"), Some(Some(0.0)));
    assert_eq!(r3.get("sainz"), Some(Some(0.0)));
    assert_eq!(r3.get("raikkonen"), Some(None));
}

#[test]
fn standings_collection_must_be_a_list() {
    assert!(parse_standings_json(r#"{"standings_data": {"round": 1}}"#).is_err());
    assert!(parse_standings_json(r#"{"standings_data": []}"#).unwrap().is_empty());
}

#[test]
fn parses_points_sorted_by_round() {
    let rows = parse_driver_points_json(&read_fixture("driver_points.json")).unwrap();
    let rounds: Vec<u32> = rows.iter().map(|r| r.round).collect();
    assert_eq!(rounds, vec![1, 2, 3]);
    assert_eq!(rows[0].gp_name, "Australian Grand Prix");
    assert_eq!(rows[1].points, Points::Value(12.0));
}

#[test]
fn parses_starting_positions_sorted_by_round() {
    let slots =
        parse_starting_positions_json(&read_fixture("driver_starting_positions.json")).unwrap();
    let grid: Vec<u32> = slots.iter().map(|s| s.grid).collect();
    assert_eq!(grid, vec![1, 9, 4]);
}

#[test]
fn points_gaps_do_not_fail_the_season() {
    let rows = parse_driver_points_json(&read_fixture("driver_points_gaps.json")).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].points, Points::Value(12.0));
    assert_eq!(rows[1].points, Points::NotANumber);
    assert_eq!(rows[2].round, 3);
    assert_eq!(rows[2].points, Points::NotANumber);
    assert_eq!(rows[2].points.cell_value(), 0.0);
}

#[test]
fn starting_positions_accept_whole_floats() {
    let slots =
        parse_starting_positions_json(&read_fixture("driver_starting_positions_float.json"))
            .unwrap();
    let grid: Vec<u32> = slots.iter().map(|s| s.grid).collect();
    assert_eq!(grid, vec![3, 1, 0]);

    let fractional = r#"{"starting_positions": [{"gp_name": "x", "grid": 2.5, "round": 1}]}"#;
    assert!(parse_starting_positions_json(fractional).is_err());
}

#[test]
fn parses_podiums_sorted_by_year() {
    let rows =
        parse_podiums_by_season_json(&read_fixture("driver_podiums_by_season.json")).unwrap();
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2018, 2019, 2020]);
    assert_eq!(rows[2].podiums, 14);
}

#[test]
fn parses_driver_stats_fixture() {
    let stats = parse_driver_stats_json(&read_fixture("driver_stats.json"))
        .unwrap()
        .expect("stats present");
    assert_eq!(stats.total_wins, 103);
    assert_eq!(stats.best_position, 1);
    assert_eq!(stats.avg_qualifying_pos, 3.0);
    assert_eq!(stats.total_points, 4405.5);
    assert_eq!(stats.best_worst_finishes.len(), 2);
    assert_eq!(stats.best_worst_finishes[0].worst_finish, 12);
}

#[test]
fn driver_stats_null_is_no_data() {
    assert!(parse_driver_stats_json("null").unwrap().is_none());
    assert!(parse_driver_stats_json("[1, 2]").is_err());
}

#[test]
fn driver_stats_missing_fields_default() {
    let stats = parse_driver_stats_json(r#"{"driver": "rookie"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(stats.driver, "rookie");
    assert_eq!(stats.total_races, 0);
    assert!(stats.best_worst_finishes.is_empty());
}
