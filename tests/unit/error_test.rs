//! Tests for error types

use ferry_crossing::core::{AppResult, FerryError, Side, StopRequested};

#[test]
fn test_invalid_config_error() {
    let err = FerryError::InvalidConfig("capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: capacity must be greater than 0"
    );
}

#[test]
fn test_no_toll_booths_error() {
    let err = FerryError::NoTollBooths(Side::East);
    assert_eq!(format!("{err}"), "no toll booths on side 1");
}

#[test]
fn test_spawn_error_keeps_source() {
    let err = FerryError::Spawn {
        name: "vehicle-light-1".to_string(),
        source: std::io::Error::other("out of threads"),
    };
    assert_eq!(
        format!("{err}"),
        "failed to spawn vehicle-light-1: out of threads"
    );
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_stop_requested_display() {
    assert_eq!(format!("{StopRequested}"), "stop requested");
}

#[test]
fn test_app_result_wraps_ferry_error() {
    fn fails() -> AppResult<()> {
        Err(FerryError::NoTollBooths(Side::West))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<FerryError>().is_some());
}
