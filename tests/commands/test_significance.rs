//! Tests for significance command

use super::{fixture_config, read_json};
use ab_decision::commands::significance;

#[test]
fn test_significance_reports_four_tests() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("significance.json");

    significance::run(&config, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    let tests = json.as_array().unwrap();
    assert_eq!(tests.len(), 4);

    let labels: Vec<(&str, &str)> = tests
        .iter()
        .map(|t| (t["metric"].as_str().unwrap(), t["sample"].as_str().unwrap()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("conversion", "raw"),
            ("order_value", "raw"),
            ("conversion", "filtered"),
            ("order_value", "filtered"),
        ]
    );

    for t in tests {
        let p = t["p_value"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert_eq!(t["method"], "asymptotic");
    }
}

#[test]
fn test_significance_conversion_samples_are_padded() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let output = dir.path().join("significance.json");

    significance::run(&config, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    let conv_raw = &json[0];
    // one entry per visit: 500 in each group
    assert_eq!(conv_raw["size_a"], 500);
    assert_eq!(conv_raw["size_b"], 500);
    assert_eq!(conv_raw["significant"], true);

    // the 5000 buyer is dropped but padding stays at 500 - 31
    let conv_filtered = &json[2];
    assert_eq!(conv_filtered["size_b"], 499);
    assert_eq!(conv_filtered["significant"], true);
}

#[test]
fn test_significance_alpha_controls_flag() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture_config(dir.path());
    config.alpha = 0.001;
    let output = dir.path().join("significance.json");

    significance::run(&config, "json", Some(output.clone())).unwrap();

    let json = read_json(&output);
    // filtered conversion p is about 0.02
    assert_eq!(json[2]["significant"], false);
}
