//! Ferry coordination: shared state, admission, the controller and the agents.

pub mod agent;
pub mod audit;
pub mod controller;
pub mod departure;
pub mod error;
pub mod ferry;
pub mod fleet;
pub mod side;
pub mod toll;
pub mod tracker;
pub mod vehicle;
pub mod work;

pub use agent::{AgentContext, VehicleAgent, VehicleOutcome};
pub use audit::{
    audit_trace, AuditSummary, AuditViolation, InMemoryTraceSink, JsonLinesSink, NullTraceSink,
    Trace, TraceEvent, TraceKind, TraceSink,
};
pub use controller::{ControllerReport, ControllerState, FerryController};
pub use departure::{Decision, DeparturePolicy, DepartureTrigger};
pub use error::{AppResult, FerryError, StopRequested};
pub use ferry::{Boarding, BoardingOutcome, Ferry, FerrySnapshot, RejectReason};
pub use fleet::Fleet;
pub use side::Side;
pub use toll::{BoothUsage, RandomSelector, RoundRobinSelector, TollPass, TollPool, TollSelector};
pub use tracker::{CompletionTracker, CounterSnapshot};
pub use vehicle::{TripPhase, Vehicle, VehicleClass, VehicleId, VehicleSpec};
pub use work::{NoopWork, SleepWork, SpinWork, WorkTask, Workload};
