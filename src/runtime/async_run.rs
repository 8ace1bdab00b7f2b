//! Running a simulation from async code.

use crate::core::AppResult;
use crate::runtime::{Simulation, SimulationReport};

/// Run `simulation` on tokio's blocking pool and await its report.
///
/// Vehicle and controller threads are still OS threads; only the driver's joins move
/// off the async worker threads.
///
/// # Errors
///
/// Fails if the run cannot start or the blocking task panics.
pub async fn run_async(simulation: Simulation) -> AppResult<SimulationReport> {
    let report = tokio::task::spawn_blocking(move || simulation.run()).await??;
    Ok(report)
}
