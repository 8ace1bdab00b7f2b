//! Ferry controller: the departure loop.
//!
//! The loop runs the state machine
//! `AwaitingLoad → DecidingDeparture → Departing → AwaitingLoad`, with `Stopped`
//! reachable whenever a stop is requested or every vehicle is home. Load waits and
//! partial-load holds are condition waits on the ferry lock, so a boarding that fills
//! the ferry or a stop request cuts them short.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::audit::TraceKind;
use crate::core::departure::{Decision, DeparturePolicy, DepartureTrigger};
use crate::core::ferry::{Ferry, FerryState};
use crate::core::work::{WorkTask, Workload};
use crate::sync::MutexGuard;

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Waiting for load, a load timeout, or termination.
    AwaitingLoad,
    /// Applying the departure policy.
    DecidingDeparture,
    /// Crossing to the other side.
    Departing(DepartureTrigger),
    /// Terminal.
    Stopped,
}

/// Departure counts by trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerReport {
    /// All departures.
    pub departures: u64,
    /// Departures because the ferry was full.
    pub full: u64,
    /// Empty departures after a load timeout.
    pub empty: u64,
    /// Partially loaded departures.
    pub partial: u64,
    /// Load timeouts observed.
    pub load_timeouts: u64,
}

impl ControllerReport {
    fn count(&mut self, trigger: DepartureTrigger) {
        self.departures += 1;
        match trigger {
            DepartureTrigger::Full => self.full += 1,
            DepartureTrigger::EmptyTimeout => self.empty += 1,
            DepartureTrigger::Partial => self.partial += 1,
        }
    }
}

/// Drives the ferry between sides until the run ends.
pub struct FerryController {
    ferry: Arc<Ferry>,
    policy: DeparturePolicy,
    load_timeout: std::time::Duration,
    workload: Arc<dyn Workload>,
}

impl FerryController {
    /// Create a controller for `ferry`.
    #[must_use]
    pub fn new(
        ferry: Arc<Ferry>,
        policy: DeparturePolicy,
        load_timeout: std::time::Duration,
        workload: Arc<dyn Workload>,
    ) -> Self {
        Self {
            ferry,
            policy,
            load_timeout,
            workload,
        }
    }

    /// Run the departure loop to termination.
    pub fn run(&self) -> ControllerReport {
        let ferry = &*self.ferry;
        let mut report = ControllerReport::default();
        let mut timed_out = false;
        let mut wait_cycles = 0_u32;
        let mut phase = ControllerState::AwaitingLoad;

        info!(side = %ferry.snapshot().side, capacity = self.policy.capacity(), "ferry controller started");
        let mut state = ferry.state.lock();

        while phase != ControllerState::Stopped {
            phase = match phase {
                ControllerState::AwaitingLoad => {
                    while state.load == 0 && !ferry.tracker.should_halt() {
                        if ferry.changed.wait_for(&mut state, self.load_timeout).timed_out() {
                            timed_out = true;
                            report.load_timeouts += 1;
                            debug!(side = %state.side, "ferry timed out waiting for vehicles");
                            break;
                        }
                    }
                    if ferry.tracker.should_halt() {
                        ControllerState::Stopped
                    } else {
                        ControllerState::DecidingDeparture
                    }
                }
                ControllerState::DecidingDeparture => {
                    debug!(
                        side = %state.side,
                        load = state.load,
                        capacity = state.capacity,
                        wait_cycles,
                        "ferry status"
                    );
                    match self.policy.evaluate(state.load, timed_out, wait_cycles) {
                        Decision::Depart(trigger) => ControllerState::Departing(trigger),
                        Decision::Hold(backoff) => {
                            let deadline = Instant::now() + backoff;
                            let watermark = self.policy.high_watermark().min(state.capacity);
                            let tracker = &ferry.tracker;
                            ferry.changed.wait_while_until(
                                &mut state,
                                |s| s.load < watermark && !tracker.should_halt(),
                                deadline,
                            );
                            wait_cycles += 1;
                            if tracker.should_halt() {
                                ControllerState::Stopped
                            } else {
                                ControllerState::DecidingDeparture
                            }
                        }
                        Decision::Idle => ControllerState::AwaitingLoad,
                    }
                }
                ControllerState::Departing(trigger) => {
                    self.cross(&mut state, trigger);
                    report.count(trigger);
                    timed_out = false;
                    wait_cycles = 0;
                    ControllerState::AwaitingLoad
                }
                ControllerState::Stopped => ControllerState::Stopped,
            };
        }

        drop(state);
        info!(
            departures = report.departures,
            empty = report.empty,
            "ferry controller stopped"
        );
        ferry.trace.record(TraceKind::ControllerStopped {
            departures: report.departures,
        });
        report
    }

    /// Leave the docked side, release the lock for the transit work, then reset
    /// the load and flip the side in one step.
    fn cross(&self, state: &mut MutexGuard<'_, FerryState>, trigger: DepartureTrigger) {
        let ferry = &*self.ferry;
        let from = state.side;
        let load = state.load;

        state.in_transit = true;
        let departure = ferry.tracker.record_departure();
        info!(
            departure,
            side = %from,
            load,
            capacity = state.capacity,
            trigger = %trigger,
            "ferry departing"
        );
        ferry.trace.record(TraceKind::Departed {
            departure,
            from,
            load,
            trigger,
        });

        MutexGuard::unlocked(state, || self.workload.perform(WorkTask::Transit));

        state.load = 0;
        state.side = from.opposite();
        state.crossings += 1;
        state.in_transit = false;
        info!(side = %state.side, crossing = state.crossings, "ferry arrived");
        ferry.trace.record(TraceKind::FerryArrived {
            side: state.side,
            crossing: state.crossings,
        });
        ferry.changed.notify_all();
    }
}

impl std::fmt::Debug for FerryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FerryController")
            .field("policy", &self.policy)
            .field("load_timeout", &self.load_timeout)
            .finish_non_exhaustive()
    }
}
