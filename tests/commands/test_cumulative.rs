//! Tests for cumulative command

use super::{fixture_config, read_json};
use ab_decision::commands::cumulative;

#[test]
fn test_cumulative_json_rows_are_monotonic() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("cumulative.json");

    cumulative::run(&config, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    assert_eq!(json["cross_group_visitors"], 1);

    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 10);

    for group in ["A", "B"] {
        let rows: Vec<&serde_json::Value> =
            records.iter().filter(|r| r["group"] == group).collect();
        assert_eq!(rows.len(), 5);
        for pair in rows.windows(2) {
            for field in ["orders", "buyers", "visitors"] {
                assert!(pair[1][field].as_u64() >= pair[0][field].as_u64());
            }
            assert!(pair[1]["revenue"].as_f64() >= pair[0]["revenue"].as_f64());
        }
    }

    let last_a = records.iter().filter(|r| r["group"] == "A").last().unwrap();
    assert_eq!(last_a["orders"], 15);
    assert_eq!(last_a["visitors"], 500);
}

#[test]
fn test_cumulative_relative_difference_covers_a_dates() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("cumulative.json");

    cumulative::run(&config, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    let diffs = json["series"]["conversion_difference"].as_array().unwrap();
    assert_eq!(diffs.len(), 5);
    // B converts at 6 per 100 visits against 3
    let first = diffs[0]["difference"].as_f64().unwrap();
    assert!((first - 1.0).abs() < 1e-9);
}

#[test]
fn test_cumulative_missing_orders_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture_config(dir.path());
    config.data.orders = dir.path().join("missing.csv");
    assert!(cumulative::run(&config, "table", None).is_err());
}
