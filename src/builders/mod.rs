//! Builders to assemble simulations from configuration.

pub mod simulation_builder;

pub use simulation_builder::{build_workload, SimulationBuilder};
