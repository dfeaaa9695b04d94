//! Tests for prioritize command

use super::{fixture_config, read_json};
use ab_decision::commands::prioritize;

#[test]
fn test_prioritize_both_frameworks_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("rankings.json");

    prioritize::run(&config, "both", None, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    let rankings = json.as_array().unwrap();
    assert_eq!(rankings.len(), 2);
    assert_eq!(rankings[0]["framework"], "ice");
    assert_eq!(rankings[1]["framework"], "rice");

    // ICE: 13.33, 2.0, 7.0, 11.2, 16.2
    let ice: Vec<u64> = rankings[0]["hypotheses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["index"].as_u64().unwrap())
        .collect();
    assert_eq!(ice, vec![4, 0, 3, 2, 1]);

    // RICE: 40, 4, 56, 112, 16.2
    let rice: Vec<u64> = rankings[1]["hypotheses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["index"].as_u64().unwrap())
        .collect();
    assert_eq!(rice, vec![3, 2, 0, 4, 1]);
}

#[test]
fn test_prioritize_top_limits_rows() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("top.yaml");

    prioritize::run(&config, "rice", Some(2), "yaml", Some(output.clone())).unwrap();

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let rows = yaml[0]["hypotheses"].as_sequence().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["index"].as_u64(), Some(3));
}

#[test]
fn test_prioritize_rejects_unknown_framework() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    assert!(prioritize::run(&config, "moscow", None, "table", None).is_err());
}

#[test]
fn test_prioritize_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    assert!(prioritize::run(&config, "ice", None, "xml", None).is_err());
}
