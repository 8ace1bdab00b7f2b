//! Running a full crossing: one controller thread plus one thread per vehicle.
//!
//! [`Simulation::start`] spawns every thread and returns a [`RunningSimulation`].
//! [`RunningSimulation::wait`] joins the vehicles, then gives the controller a
//! bounded grace period to notice termination. A controller that misses it is
//! detached and reported as [`ControllerExit::Abandoned`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::FerryConfig;
use crate::core::{
    AgentContext, BoothUsage, CompletionTracker, ControllerReport, CounterSnapshot,
    DeparturePolicy, Ferry, FerryController, FerryError, FerrySnapshot, Fleet, TollPool,
    TollSelector, Trace, VehicleAgent, VehicleOutcome, Workload,
};

/// Name of the controller thread.
pub const CONTROLLER_THREAD: &str = "ferry-controller";

/// How the controller thread ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerExit {
    /// Stopped within the grace period and was joined.
    Joined,
    /// Missed the grace period and was detached.
    Abandoned,
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Unique id of the run.
    pub run_id: String,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
    /// Vehicles in the run.
    pub population: usize,
    /// Final counters.
    pub counters: CounterSnapshot,
    /// Final ferry state.
    pub ferry: FerrySnapshot,
    /// Departure breakdown, absent if the controller was abandoned.
    pub controller: Option<ControllerReport>,
    /// How the controller thread ended.
    pub controller_exit: ControllerExit,
    /// Per-booth usage.
    pub booths: Vec<BoothUsage>,
    /// Whether every booth was free when the run ended.
    pub booths_released: bool,
    /// Per-vehicle outcome, in fleet order.
    pub outcomes: Vec<VehicleOutcome>,
}

impl SimulationReport {
    /// Whether every vehicle completed its round trip.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.counters.completed == self.population
    }
}

/// Requests a cooperative stop of a running simulation.
#[derive(Debug, Clone)]
pub struct StopHandle {
    ferry: Arc<Ferry>,
}

impl StopHandle {
    /// Raise the stop flag and wake every waiter.
    pub fn stop(&self) {
        if self.ferry.tracker().request_stop() {
            info!("stop requested");
        }
        self.ferry.signal();
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.ferry.tracker().stop_requested()
    }
}

/// A fully wired run that has not started yet.
pub struct Simulation {
    config: FerryConfig,
    fleet: Fleet,
    tolls: Arc<TollPool>,
    selector: Arc<dyn TollSelector>,
    workload: Arc<dyn Workload>,
    trace: Arc<Trace>,
}

impl Simulation {
    pub(crate) fn new(
        config: FerryConfig,
        fleet: Fleet,
        tolls: Arc<TollPool>,
        selector: Arc<dyn TollSelector>,
        workload: Arc<dyn Workload>,
        trace: Arc<Trace>,
    ) -> Self {
        Self {
            config,
            fleet,
            tolls,
            selector,
            workload,
            trace,
        }
    }

    /// Configuration of the run.
    #[must_use]
    pub const fn config(&self) -> &FerryConfig {
        &self.config
    }

    /// Vehicles of the run.
    #[must_use]
    pub const fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// Start the controller and every vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Spawn`] if a thread cannot be started. Threads already
    /// running are told to stop and are joined within the shutdown grace period
    /// before the error is returned; any still running after it are detached.
    pub fn start(self) -> Result<RunningSimulation, FerryError> {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let tracker = Arc::new(CompletionTracker::new(self.fleet.len()));
        let ferry = Arc::new(Ferry::new(
            self.config.capacity,
            self.fleet.initial_side,
            tracker,
            Arc::clone(&self.trace),
        ));
        let stop = StopHandle {
            ferry: Arc::clone(&ferry),
        };

        info!(
            run_id = %run_id,
            vehicles = self.fleet.len(),
            units = self.fleet.total_units(),
            capacity = self.config.capacity,
            side = %self.fleet.initial_side,
            booths_per_side = self.config.tolls_per_side,
            "starting ferry simulation"
        );

        let (report_tx, report_rx) = bounded(1);
        let controller = FerryController::new(
            Arc::clone(&ferry),
            DeparturePolicy::from_config(&self.config),
            self.config.timing.load_timeout(),
            Arc::clone(&self.workload),
        );
        let controller = thread::Builder::new()
            .name(CONTROLLER_THREAD.to_string())
            .spawn(move || {
                let report = controller.run();
                let _ = report_tx.send(report);
            })
            .map_err(|source| FerryError::Spawn {
                name: CONTROLLER_THREAD.to_string(),
                source,
            })?;

        let ctx = AgentContext {
            ferry: Arc::clone(&ferry),
            tolls: Arc::clone(&self.tolls),
            selector: Arc::clone(&self.selector),
            workload: Arc::clone(&self.workload),
            retry_interval: self.config.timing.retry_interval(),
            dwell_units: self.config.timing.dwell_units,
        };

        let grace = self.config.timing.shutdown_grace();
        let (done_tx, done_rx) = unbounded();
        let mut vehicles = Vec::with_capacity(self.fleet.len());
        for spec in &self.fleet.vehicles {
            let name = format!("vehicle-{}", spec.id);
            let agent = VehicleAgent::new(*spec, ctx.clone());
            let done = done_tx.clone();
            let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
                let _done = ExitSignal(done);
                agent.run()
            });
            match spawned {
                Ok(handle) => vehicles.push(handle),
                Err(source) => {
                    warn!(thread = %name, error = %source, "spawn failed; stopping run");
                    stop.stop();
                    let deadline = Instant::now() + grace;
                    if let Err(running) = join_signalled(vehicles, &done_rx, deadline) {
                        warn!(running, "vehicles still running after grace period; detaching them");
                    }
                    match report_rx.recv_deadline(deadline) {
                        Ok(_) => {
                            if controller.join().is_err() {
                                warn!("controller thread panicked after reporting");
                            }
                        }
                        Err(_) => warn!("controller did not stop within grace period; abandoning it"),
                    }
                    return Err(FerryError::Spawn { name, source });
                }
            }
        }

        Ok(RunningSimulation {
            run_id,
            started,
            grace,
            ferry,
            tolls: self.tolls,
            stop,
            vehicles,
            controller,
            controller_rx: report_rx,
        })
    }

    /// Start and wait for the run to finish.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::start`] failures.
    pub fn run(self) -> Result<SimulationReport, FerryError> {
        Ok(self.start()?.wait())
    }
}

/// Signals a thread's exit, including by panic, when dropped.
struct ExitSignal(Sender<()>);

impl Drop for ExitSignal {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

/// Join threads that each hold an [`ExitSignal`] on `done`, giving up at `deadline`.
///
/// Returns the join results in handle order, or the number of threads that had not
/// exited by the deadline. Those are detached.
fn join_signalled<T>(
    handles: Vec<JoinHandle<T>>,
    done: &Receiver<()>,
    deadline: Instant,
) -> Result<Vec<thread::Result<T>>, usize> {
    let mut pending = handles.len();
    while pending > 0 {
        if done.recv_deadline(deadline).is_err() {
            return Err(pending);
        }
        pending -= 1;
    }
    Ok(handles.into_iter().map(JoinHandle::join).collect())
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("fleet", &self.fleet.len())
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

/// A run in progress.
#[derive(Debug)]
pub struct RunningSimulation {
    run_id: String,
    started: Instant,
    grace: Duration,
    ferry: Arc<Ferry>,
    tolls: Arc<TollPool>,
    stop: StopHandle,
    vehicles: Vec<JoinHandle<VehicleOutcome>>,
    controller: JoinHandle<()>,
    controller_rx: Receiver<ControllerReport>,
}

impl RunningSimulation {
    /// Run id.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Handle for stopping the run from another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The shared ferry, for observation.
    #[must_use]
    pub const fn ferry(&self) -> &Arc<Ferry> {
        &self.ferry
    }

    /// Join every vehicle, then the controller within the grace period.
    #[must_use]
    pub fn wait(self) -> SimulationReport {
        let mut outcomes = Vec::with_capacity(self.vehicles.len());
        for handle in self.vehicles {
            let name = handle.thread().name().unwrap_or("vehicle").to_string();
            match handle.join() {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => warn!(thread = %name, "vehicle thread panicked"),
            }
        }

        let tracker = self.ferry.tracker();
        if !tracker.all_completed() {
            self.stop.stop();
        }
        self.ferry.signal();

        let (controller, controller_exit) = match self.controller_rx.recv_timeout(self.grace) {
            Ok(report) => {
                if self.controller.join().is_err() {
                    warn!("controller thread panicked after reporting");
                }
                debug!("controller joined");
                (Some(report), ControllerExit::Joined)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    grace_ms = u64::try_from(self.grace.as_millis()).unwrap_or(u64::MAX),
                    "controller did not stop within grace period; abandoning it"
                );
                (None, ControllerExit::Abandoned)
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("controller thread exited without a report");
                (None, ControllerExit::Abandoned)
            }
        };

        self.ferry.trace.flush();
        let counters = tracker.snapshot();
        let report = SimulationReport {
            run_id: self.run_id,
            elapsed_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            population: tracker.population(),
            counters,
            ferry: self.ferry.snapshot(),
            controller,
            controller_exit,
            booths: self.tolls.usage(),
            booths_released: self.tolls.all_free(),
            outcomes,
        };
        info!(
            run_id = %report.run_id,
            completed = counters.completed,
            abandoned = counters.abandoned,
            departures = counters.departures,
            elapsed_ms = report.elapsed_ms,
            "ferry simulation finished"
        );
        report
    }
}
