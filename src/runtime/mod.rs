//! Thread orchestration for a full run, plus the async entry point.

pub mod simulation;
#[cfg(feature = "tokio-runtime")]
pub mod async_run;

pub use simulation::{
    ControllerExit, RunningSimulation, Simulation, SimulationReport, StopHandle, CONTROLLER_THREAD,
};
#[cfg(feature = "tokio-runtime")]
pub use async_run::run_async;
