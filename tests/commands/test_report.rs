//! Tests for report command

use super::{fixture_config, read_json};
use ab_decision::commands::report;

#[test]
fn test_report_declares_b_winner_on_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("report.json");

    report::run(&config, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    assert_eq!(json["prioritization"].as_array().unwrap().len(), 2);

    let experiment = &json["experiment"];
    assert_eq!(experiment["orders_total"], 48);
    assert_eq!(experiment["cross_group_visitors"], 1);
    assert_eq!(experiment["orders_analyzed"], 46);
    assert_eq!(experiment["anomalous_visitors"], 1);
    assert_eq!(
        experiment["decision"],
        serde_json::json!({"action": "stop_winner", "group": "B", "metric": "conversion"})
    );
}

#[test]
fn test_report_table_contains_conclusions() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("report.txt");

    report::run(&config, "table", Some(output.clone())).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("ICE ranking"));
    assert!(text.contains("A/B test report"));
    assert!(text.contains("Stop the test: group B leads on conversion"));
}

#[test]
fn test_report_keeps_cross_group_visitors_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture_config(dir.path());
    config.drop_cross_group_visitors = false;
    let output = dir.path().join("report.yaml");

    report::run(&config, "yaml", Some(output.clone())).unwrap();

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(yaml["experiment"]["orders_analyzed"].as_u64(), Some(48));
    assert_eq!(yaml["experiment"]["cross_group_visitors"].as_u64(), Some(0));
}
