//! Tests for builder modules

use std::sync::Arc;

use ferry_crossing::builders::{build_workload, SimulationBuilder};
use ferry_crossing::config::{FerryConfig, TimingConfig, WorkloadConfig};
use ferry_crossing::core::{
    Fleet, FerryError, NoopWork, RoundRobinSelector, Side, VehicleClass, VehicleId, VehicleSpec,
    WorkTask,
};

#[test]
fn test_build_workload_variants() {
    for cfg in [
        WorkloadConfig::Noop,
        WorkloadConfig::Sleep { millis: 0 },
        WorkloadConfig::Spin { iterations: 10 },
    ] {
        build_workload(&cfg).perform(WorkTask::Planning);
    }
}

#[test]
fn test_builder_generates_fleet_from_config() {
    let cfg = FerryConfig {
        seed: Some(3),
        ..FerryConfig::default()
    };
    let simulation = SimulationBuilder::new(cfg).build().unwrap();
    assert_eq!(simulation.fleet().len(), 30);
    assert_eq!(simulation.config().capacity, 20);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let cfg = FerryConfig {
        capacity: 0,
        ..FerryConfig::default()
    };
    let err = SimulationBuilder::new(cfg).build().unwrap_err();
    assert!(matches!(err, FerryError::InvalidConfig(_)));
}

#[test]
fn test_builder_rejects_oversized_vehicle() {
    let cfg = FerryConfig {
        capacity: 3,
        timing: TimingConfig::fast(),
        ..FerryConfig::default()
    };
    let fleet = Fleet::new(
        vec![VehicleSpec {
            id: VehicleId::new(VehicleClass::Heavy, 1),
            size: 4,
            home: Side::West,
        }],
        Side::West,
    );
    let err = SimulationBuilder::new(cfg)
        .fleet(fleet)
        .workload(Arc::new(NoopWork))
        .selector(Arc::new(RoundRobinSelector::default()))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("heavy-1"));
}
