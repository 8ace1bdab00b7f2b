//! Tests for configuration parsing and validation

use ferry_crossing::config::{FerryConfig, TimingConfig, WorkloadConfig};
use ferry_crossing::core::{FerryError, Side};

#[test]
fn test_partial_json_keeps_defaults() {
    let cfg = FerryConfig::from_json_str(r#"{ "capacity": 12, "timing": { "dwell_units": 0 } }"#)
        .unwrap();
    assert_eq!(cfg.capacity, 12);
    assert_eq!(cfg.timing.dwell_units, 0);
    assert_eq!(cfg.timing.load_timeout_ms, 1_000);
    assert_eq!(cfg.fleet.light, 12);
    assert_eq!(cfg.high_watermark(), 9);
}

#[test]
fn test_workload_and_side_parse() {
    let cfg = FerryConfig::from_json_str(
        r#"{ "initial_side": "east", "seed": 9, "workload": { "kind": "spin", "iterations": 500 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.initial_side, Some(Side::East));
    assert_eq!(cfg.seed, Some(9));
    assert_eq!(cfg.workload, WorkloadConfig::Spin { iterations: 500 });
}

#[test]
fn test_invalid_json_reports_parse_error() {
    let err = FerryConfig::from_json_str("{ capacity: }").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_zero_booths_rejected() {
    let err = FerryConfig::from_json_str(r#"{ "tolls_per_side": 0 }"#).unwrap_err();
    assert!(err.contains("tolls_per_side"));
}

#[test]
fn test_backoff_bounds_checked() {
    let cfg = FerryConfig {
        timing: TimingConfig {
            partial_backoff_base_ms: 10,
            partial_backoff_max_ms: 5,
            ..TimingConfig::fast()
        },
        ..FerryConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_file_missing_is_io_error() {
    let err = FerryConfig::from_file("/definitely/not/here/ferry.json").unwrap_err();
    assert!(matches!(err, FerryError::Io { .. }));
}

#[test]
fn test_from_file_round_trip() {
    let path = std::env::temp_dir().join(format!("ferry-config-{}.json", std::process::id()));
    let cfg = FerryConfig {
        capacity: 9,
        timing: TimingConfig::fast(),
        workload: WorkloadConfig::Noop,
        ..FerryConfig::default()
    };
    std::fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();

    let loaded = FerryConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, cfg);
}

#[test]
fn test_from_file_invalid_is_config_error() {
    let path = std::env::temp_dir().join(format!("ferry-bad-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "capacity": 0 }"#).unwrap();

    let err = FerryConfig::from_file(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, FerryError::InvalidConfig(_)));
}
