//! Configuration models for the crossing, the fleet and controller timing.

pub mod ferry;

pub use ferry::{FerryConfig, FleetConfig, TimingConfig, UnitSizes, WorkloadConfig};
