//! Vehicle agents: one round trip per vehicle.
//!
//! An agent owns its [`Vehicle`] and drives it through
//! `outbound boarding → ride → dwell → return boarding → ride → completed`.
//! Every wait point checks the global stop flag; on [`StopRequested`] the agent
//! abandons its trip with no toll held and no ferry state touched.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::audit::{Trace, TraceKind};
use crate::core::ferry::{BoardingOutcome, Ferry};
use crate::core::toll::{TollPool, TollSelector};
use crate::core::tracker::CompletionTracker;
use crate::core::vehicle::{TripPhase, Vehicle, VehicleId, VehicleSpec};
use crate::core::work::{WorkTask, Workload};
use crate::core::{Side, StopRequested};

/// How an agent ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum VehicleOutcome {
    /// Round trip finished at home.
    Completed {
        /// Vehicle.
        vehicle: VehicleId,
        /// Simulated work units performed.
        work_cycles: u64,
    },
    /// Gave up after a stop request.
    Abandoned {
        /// Vehicle.
        vehicle: VehicleId,
        /// Leg it was on.
        phase: TripPhase,
    },
}

impl VehicleOutcome {
    /// Whether the round trip finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Shared collaborators handed to every agent.
#[derive(Clone)]
pub struct AgentContext {
    /// The ferry.
    pub ferry: Arc<Ferry>,
    /// Toll booths.
    pub tolls: Arc<TollPool>,
    /// Booth selection policy.
    pub selector: Arc<dyn TollSelector>,
    /// Simulated work.
    pub workload: Arc<dyn Workload>,
    /// Upper bound on a single boarding or arrival wait before re-checking.
    pub retry_interval: Duration,
    /// Work units spent at the far side.
    pub dwell_units: u32,
}

impl AgentContext {
    fn tracker(&self) -> &CompletionTracker {
        self.ferry.tracker()
    }

    fn trace(&self) -> &Trace {
        &self.ferry.trace
    }
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("ferry", &self.ferry)
            .field("tolls", &self.tolls)
            .field("retry_interval", &self.retry_interval)
            .field("dwell_units", &self.dwell_units)
            .finish_non_exhaustive()
    }
}

/// Drives one vehicle through its round trip.
#[derive(Debug)]
pub struct VehicleAgent {
    vehicle: Vehicle,
    ctx: AgentContext,
}

impl VehicleAgent {
    /// Create an agent for a vehicle parked at its home side.
    #[must_use]
    pub const fn new(spec: VehicleSpec, ctx: AgentContext) -> Self {
        Self {
            vehicle: Vehicle::new(spec),
            ctx,
        }
    }

    /// The vehicle as it stands.
    #[must_use]
    pub const fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// Run the round trip to completion or abandonment.
    pub fn run(mut self) -> VehicleOutcome {
        self.ctx.tracker().register();
        debug!(
            vehicle = %self.vehicle.id(),
            size = self.vehicle.size(),
            home = %self.vehicle.home(),
            "vehicle started"
        );
        self.work(WorkTask::Startup);

        match self.round_trip() {
            Ok(()) => self.complete(),
            Err(StopRequested) => self.abandon(),
        }
    }

    fn round_trip(&mut self) -> Result<(), StopRequested> {
        self.cross()?;
        for _ in 0..self.ctx.dwell_units {
            self.work(WorkTask::Dwell);
        }
        self.vehicle.begin_return();
        self.cross()
    }

    /// Board on the current side and ride to the other one.
    fn cross(&mut self) -> Result<(), StopRequested> {
        let crossing = self.board()?;
        let side = self
            .ctx
            .ferry
            .await_arrival(crossing, self.ctx.retry_interval)?;
        debug_assert_eq!(side, self.vehicle.current_side());
        info!(
            vehicle = %self.vehicle.id(),
            phase = %self.vehicle.phase(),
            side = %side,
            "vehicle arrived"
        );
        self.ctx.trace().record(TraceKind::VehicleArrived {
            vehicle: self.vehicle.id(),
            side,
        });
        Ok(())
    }

    /// Optimistic boarding: wait for an opportunity, pay a toll with the ferry lock
    /// released, then commit through `try_board`. Returns the crossing number the
    /// vehicle boarded on.
    fn board(&mut self) -> Result<u64, StopRequested> {
        loop {
            self.work(WorkTask::Planning);
            self.ctx
                .ferry
                .await_opportunity(&self.vehicle, self.ctx.retry_interval)?;
            self.pay_toll(self.vehicle.current_side());

            match self.ctx.ferry.try_board(&mut self.vehicle) {
                BoardingOutcome::Accepted(boarding) => return Ok(boarding.crossing),
                BoardingOutcome::Rejected(reason) => {
                    debug!(vehicle = %self.vehicle.id(), ?reason, "boarding rejected; retrying");
                    self.work(WorkTask::Waiting);
                }
            }
        }
    }

    /// Hold one booth on `side` for the payment work. The booth is released when
    /// the pass drops, before the ferry lock is taken again.
    fn pay_toll(&mut self, side: Side) {
        let tolls = Arc::clone(&self.ctx.tolls);
        let pass = tolls.pass(side, self.ctx.selector.as_ref());
        for task in [
            WorkTask::TollPayment,
            WorkTask::TollVerification,
            WorkTask::TollRecords,
        ] {
            self.work(task);
        }
        let booth = pass.booth_id();
        drop(pass);

        debug!(vehicle = %self.vehicle.id(), booth, side = %side, "toll paid");
        self.ctx.trace().record(TraceKind::TollPassed {
            vehicle: self.vehicle.id(),
            booth,
            side,
        });
    }

    fn complete(mut self) -> VehicleOutcome {
        self.work(WorkTask::Completing);
        self.vehicle.mark_completed();
        let completed = self.ctx.tracker().complete();
        info!(
            vehicle = %self.vehicle.id(),
            home = %self.vehicle.home(),
            work_cycles = self.vehicle.work_cycles(),
            completed,
            population = self.ctx.tracker().population(),
            "vehicle completed round trip"
        );
        self.ctx.trace().record(TraceKind::Completed {
            vehicle: self.vehicle.id(),
            completed,
        });
        self.ctx.ferry.signal();
        VehicleOutcome::Completed {
            vehicle: self.vehicle.id(),
            work_cycles: self.vehicle.work_cycles(),
        }
    }

    fn abandon(self) -> VehicleOutcome {
        self.ctx.tracker().abandon();
        let phase = self.vehicle.phase();
        info!(vehicle = %self.vehicle.id(), phase = %phase, "vehicle abandoned trip");
        self.ctx.trace().record(TraceKind::Abandoned {
            vehicle: self.vehicle.id(),
            phase,
        });
        VehicleOutcome::Abandoned {
            vehicle: self.vehicle.id(),
            phase,
        }
    }

    fn work(&mut self, task: WorkTask) {
        self.ctx.workload.perform(task);
        self.vehicle.count_work();
    }
}
