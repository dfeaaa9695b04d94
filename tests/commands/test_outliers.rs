//! Tests for outliers command

use super::{fixture_config, read_json};
use ab_decision::commands::outliers;

#[test]
fn test_outliers_flags_large_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("outliers.json");

    outliers::run(&config, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    // every visitor ordered once; revenue p95 is 85
    assert_eq!(json["thresholds"]["max_orders"].as_f64(), Some(1.0));
    assert_eq!(json["thresholds"]["max_revenue"].as_f64(), Some(85.0));
    assert_eq!(json["anomalous_visitors"], serde_json::json!([2999]));
    assert_eq!(json["orders_raw"], 46);
    assert_eq!(json["orders_filtered"], 45);
}

#[test]
fn test_outliers_fixed_thresholds_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture_config(dir.path());
    config.outliers.max_orders = Some(1.0);
    config.outliers.max_revenue = Some(70.0);
    let output = dir.path().join("outliers.json");

    outliers::run(&config, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    // B orders at 75, 80, 85 on each of 5 days, plus the 5000 order
    assert_eq!(json["anomalous_visitors"].as_array().unwrap().len(), 16);
    assert_eq!(json["orders_filtered"], 30);
}

#[test]
fn test_outliers_table_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("outliers.txt");

    outliers::run(&config, "table", Some(output.clone())).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("Anomalous visitors: 1"));
    assert!(text.contains("Orders removed: 1 of 46"));
}
