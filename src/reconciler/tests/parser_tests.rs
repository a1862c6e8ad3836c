//! Tests for race and qualifying table parsing

use super::*;
use crate::error::ArchiveError;
use crate::reconciler::{parse_qualy_table, parse_race_table};

#[test]
fn test_parse_race_table() {
    let table = raw_table(
        &["Pos", "No", "Driver", "Car", "Laps", "PTS"],
        &[
            &["1", "8", "Fernando Alonso ALO", "Ferrari", "49", "25"],
            &["NC", "23", "Kamui Kobayashi KOB", "BMW Sauber Ferrari", "11", "0"],
            &["3", "1", "", "McLaren Mercedes", "49", "15"],
        ],
    );

    let entries = parse_race_table(&table, &session("bahrain")).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].driver, "Fernando Alonso");
    assert_eq!(entries[0].number, Some(8));
    assert_eq!(entries[0].cell.points, 25.0);
    assert_eq!(entries[1].cell.position, Position::Unclassified("NC".to_string()));
}

#[test]
fn test_parse_race_table_without_points_scores_zero() {
    let table = raw_table(&["Pos", "Driver", "Car"], &[&["1", "Jim Clark", "Lotus Climax"]]);

    let entries = parse_race_table(&table, &session("monaco")).unwrap();

    assert_eq!(entries[0].cell.points, 0.0);
}

#[test]
fn test_parse_race_table_half_points() {
    let table = raw_table(
        &["Pos", "Driver", "Car", "PTS"],
        &[&["1", "Alain Prost", "McLaren TAG", "4.5"]],
    );

    let entries = parse_race_table(&table, &session("monaco")).unwrap();

    assert_eq!(entries[0].cell.points, 4.5);
}

#[test]
fn test_parse_race_table_missing_car_is_rejected() {
    let table = raw_table(&["Pos", "Driver", "PTS"], &[&["1", "Jim Clark", "9"]]);

    let err = parse_race_table(&table, &session("monaco")).unwrap_err();

    match err {
        ArchiveError::MissingData { session, column } => {
            assert_eq!(session, "monaco");
            assert_eq!(column, "Car");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_parse_knockout_qualifying_collapses_stages() {
    let table = raw_table(
        &["Pos", "No", "Driver", "Car", "Q1", "Q2", "Q3", "Laps"],
        &[
            &["1", "5", "Sebastian Vettel VET", "Red Bull Racing Renault", "1:23.456", "1:22.100", "1:21.900", "12"],
            &["11", "9", "Jarno Trulli TRU", "Lotus Cosworth", "1:23.456", "1:22.100", "", "10"],
            &["20", "21", "Bruno Senna SEN", "HRT Cosworth", "DNF", "", "", "2"],
        ],
    );

    let entries = parse_qualy_table(&table, &session("bahrain"), &season_2010()).unwrap();

    assert_eq!(entries[0].cell.time.unwrap().to_string(), "1:21.900");
    assert_eq!(entries[1].cell.time.unwrap().to_string(), "1:22.100");
    assert!(entries[2].cell.time.is_none());
}

#[test]
fn test_parse_legacy_qualifying_uses_time_column() {
    let table = raw_table(
        &["Pos", "Driver", "Car", "Time"],
        &[&["1", "Ayrton Senna SEN", "McLaren Honda", "1:18.774"]],
    );

    let entries = parse_qualy_table(&table, &session("monaco"), &Season::new(1988)).unwrap();

    assert_eq!(entries[0].driver, "Ayrton Senna");
    assert_eq!(entries[0].cell.time.unwrap().as_millis(), 78_774);
}

#[test]
fn test_parse_qualifying_drops_duplicate_positions() {
    let table = raw_table(
        &["Pos", "Driver", "Car", "Time"],
        &[
            &["1", "Ayrton Senna", "McLaren Honda", "1:18.774"],
            &["1", "Ayrton Senna", "McLaren Honda", "1:18.774"],
            &["2", "Alain Prost", "McLaren Honda", "1:20.453"],
        ],
    );

    let entries = parse_qualy_table(&table, &session("monaco"), &Season::new(1988)).unwrap();

    assert_eq!(entries.len(), 2);
}

#[test]
fn test_parse_qualifying_keeps_distinct_unclassified_rows() {
    let table = raw_table(
        &["Pos", "Driver", "Car", "Time"],
        &[
            &["1", "Ayrton Senna", "McLaren Honda", "1:18.774"],
            &["NC", "Julian Bailey", "Tyrrell Ford", ""],
            &["NC", "Stefano Modena", "EuroBrun Ford", ""],
            &["NC", "Stefano Modena", "EuroBrun Ford", ""],
            &["", "Pierre-Henri Raphanel", "Larrousse Ford", ""],
        ],
    );

    let entries = parse_qualy_table(&table, &session("monaco"), &Season::new(1988)).unwrap();

    let drivers: Vec<&str> = entries.iter().map(|e| e.driver.as_str()).collect();
    assert_eq!(
        drivers,
        vec!["Ayrton Senna", "Julian Bailey", "Stefano Modena", "Pierre-Henri Raphanel"]
    );
}

#[test]
fn test_parse_qualifying_without_time_columns_is_rejected() {
    let table = raw_table(&["Pos", "Driver", "Car"], &[&["1", "Ayrton Senna", "McLaren Honda"]]);

    let err = parse_qualy_table(&table, &session("monaco"), &Season::new(1988)).unwrap_err();

    assert!(matches!(err, ArchiveError::MissingData { ref column, .. } if column == "Time"));
}
