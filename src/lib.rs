//! # Ferry Crossing
//!
//! Coordination of a capacity-bounded ferry shuttling vehicles between two sides.
//!
//! A fixed population of vehicles, each on its own thread, must make exactly one round
//! trip: home side, far side, home again. Every boarding is preceded by a toll paid at
//! one of the booths on the vehicle's side. One controller thread decides when the
//! ferry leaves using a batching policy, and on arrival resets the load and flips the
//! docked side in a single critical section.
//!
//! ## Guarantees
//!
//! - **Capacity**: the load never exceeds capacity; boarding is a single
//!   check-and-increment under the ferry lock.
//! - **Side consistency**: a vehicle boards only from the side the ferry is docked at,
//!   and arrives at the opposite side.
//! - **Exactly one round trip**: a completed vehicle boarded exactly twice.
//! - **Termination**: the run ends once every vehicle is home, or on a stop request.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ferry_crossing::builders::SimulationBuilder;
//! use ferry_crossing::config::FerryConfig;
//!
//! let report = SimulationBuilder::new(FerryConfig::default())
//!     .build()?
//!     .run()?;
//! assert!(report.all_completed());
//! # Ok::<(), ferry_crossing::core::FerryError>(())
//! ```
//!
//! ## Layout
//!
//! - [`core`]: ferry state and admission, departure policy, controller, vehicle
//!   agents, toll booths, completion tracking, trace and audit.
//! - [`config`]: serde configuration with validation.
//! - [`builders`]: assembling a simulation from configuration.
//! - [`runtime`]: thread orchestration, stop handle, run report, async entry point.
//! - [`sync`]: lock and condition-variable primitives.
//! - [`util`]: clock and tracing setup.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Ferry coordination core.
pub mod core;
/// Configuration models and loading.
pub mod config;
/// Builders to assemble simulations from configuration.
pub mod builders;
/// Thread orchestration and run reports.
pub mod runtime;
/// Locking primitives.
pub mod sync;
/// Shared utilities.
pub mod util;
