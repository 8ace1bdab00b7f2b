//! Builder wiring configuration, fleet, workload, booth selection and tracing into a
//! [`Simulation`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::{FerryConfig, WorkloadConfig};
use crate::core::{
    Fleet, FerryError, NoopWork, RandomSelector, SleepWork, SpinWork, TollPool, TollSelector,
    Trace, TraceSink, Workload,
};
use crate::runtime::Simulation;

/// Build the workload named by configuration.
#[must_use]
pub fn build_workload(cfg: &WorkloadConfig) -> Arc<dyn Workload> {
    match *cfg {
        WorkloadConfig::Noop => Arc::new(NoopWork),
        WorkloadConfig::Sleep { millis } => Arc::new(SleepWork::new(Duration::from_millis(millis))),
        WorkloadConfig::Spin { iterations } => Arc::new(SpinWork::new(iterations)),
    }
}

/// Assembles a [`Simulation`]. Anything not supplied is derived from the config:
/// the fleet is generated, the workload comes from `workload`, booths are chosen at
/// random, and tracing goes nowhere.
pub struct SimulationBuilder {
    config: FerryConfig,
    fleet: Option<Fleet>,
    workload: Option<Arc<dyn Workload>>,
    selector: Option<Arc<dyn TollSelector>>,
    sink: Option<Box<dyn TraceSink>>,
}

impl SimulationBuilder {
    /// Start from a configuration.
    #[must_use]
    pub fn new(config: FerryConfig) -> Self {
        Self {
            config,
            fleet: None,
            workload: None,
            selector: None,
            sink: None,
        }
    }

    /// Use an explicit fleet instead of generating one.
    #[must_use]
    pub fn fleet(mut self, fleet: Fleet) -> Self {
        self.fleet = Some(fleet);
        self
    }

    /// Override the configured workload.
    #[must_use]
    pub fn workload(mut self, workload: Arc<dyn Workload>) -> Self {
        self.workload = Some(workload);
        self
    }

    /// Override booth selection.
    #[must_use]
    pub fn selector(mut self, selector: Arc<dyn TollSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Record trace events to `sink`.
    #[must_use]
    pub fn trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Configuration being built.
    #[must_use]
    pub const fn config(&self) -> &FerryConfig {
        &self.config
    }

    /// Validate and assemble.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::InvalidConfig`] if the configuration does not validate
    /// or a supplied fleet has a vehicle larger than the ferry, and
    /// [`FerryError::NoTollBooths`] if a side has no booths.
    pub fn build(self) -> Result<Simulation, FerryError> {
        self.config.validate().map_err(FerryError::InvalidConfig)?;

        let fleet = self
            .fleet
            .unwrap_or_else(|| Fleet::from_config(&self.config));
        if let Some(v) = fleet.vehicles.iter().find(|v| v.size == 0 || v.size > self.config.capacity) {
            return Err(FerryError::InvalidConfig(format!(
                "vehicle {} has size {} outside 1..={}",
                v.id, v.size, self.config.capacity
            )));
        }

        let tolls = TollPool::symmetric(self.config.tolls_per_side)?;
        let workload = self
            .workload
            .unwrap_or_else(|| build_workload(&self.config.workload));
        let selector = self
            .selector
            .unwrap_or_else(|| Arc::new(RandomSelector));
        let trace = self.sink.map_or_else(Trace::disabled, Trace::new);

        Ok(Simulation::new(
            self.config,
            fleet,
            Arc::new(tolls),
            selector,
            workload,
            Arc::new(trace),
        ))
    }
}

impl std::fmt::Debug for SimulationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationBuilder")
            .field("config", &self.config)
            .field("fleet", &self.fleet)
            .finish_non_exhaustive()
    }
}
