//! Ferry state and boarding admission.
//!
//! [`Ferry`] owns the docked side and the load behind a single lock, with one
//! condition variable broadcast on every change: boarding, departure, arrival,
//! completion and stop. Agents condition-wait on it for boarding opportunities and
//! for arrival; the controller waits on it for load.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::audit::{Trace, TraceKind};
use crate::core::tracker::CompletionTracker;
use crate::core::vehicle::{Vehicle, BOARDINGS_PER_ROUND_TRIP};
use crate::core::{Side, StopRequested};
use crate::sync::{Condvar, Mutex};

/// Lock-protected ferry state.
#[derive(Debug)]
pub(crate) struct FerryState {
    pub(crate) side: Side,
    pub(crate) load: u32,
    pub(crate) capacity: u32,
    pub(crate) in_transit: bool,
    pub(crate) crossings: u64,
}

impl FerryState {
    fn snapshot(&self) -> FerrySnapshot {
        FerrySnapshot {
            side: self.side,
            load: self.load,
            capacity: self.capacity,
            in_transit: self.in_transit,
            crossings: self.crossings,
        }
    }

    fn admits(&self, vehicle: &Vehicle) -> bool {
        !self.in_transit
            && self.side == vehicle.current_side()
            && self.has_room_for(vehicle.size())
    }

    fn has_room_for(&self, size: u32) -> bool {
        size <= self.capacity.saturating_sub(self.load)
    }
}

/// Consistent view of the ferry: side and load are always read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FerrySnapshot {
    /// Docked side (the side being left while in transit).
    pub side: Side,
    /// Units aboard.
    pub load: u32,
    /// Capacity.
    pub capacity: u32,
    /// Whether the ferry is crossing.
    pub in_transit: bool,
    /// Completed crossings.
    pub crossings: u64,
}

/// A committed boarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boarding {
    /// Side boarded from.
    pub from: Side,
    /// Side the vehicle will arrive at.
    pub to: Side,
    /// Load after boarding.
    pub load: u32,
    /// Crossing count at boarding; the vehicle arrives once it increases.
    pub crossing: u64,
}

/// Why a boarding attempt was turned away. Rejection never mutates the ferry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The ferry is crossing.
    InTransit,
    /// The ferry is docked on the other side.
    WrongSide {
        /// Where the ferry is docked.
        docked: Side,
    },
    /// Not enough spare capacity.
    CapacityExceeded {
        /// Current load.
        load: u32,
        /// Vehicle size.
        size: u32,
        /// Capacity.
        capacity: u32,
    },
    /// The vehicle already made both of its boardings.
    TripsExhausted,
}

/// Result of [`Ferry::try_board`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardingOutcome {
    /// The vehicle is aboard.
    Accepted(Boarding),
    /// Try again later.
    Rejected(RejectReason),
}

impl BoardingOutcome {
    /// Whether the boarding was committed.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// The shuttle shared by the controller and every vehicle agent.
#[derive(Debug)]
pub struct Ferry {
    pub(crate) state: Mutex<FerryState>,
    pub(crate) changed: Condvar,
    pub(crate) tracker: Arc<CompletionTracker>,
    pub(crate) trace: Arc<Trace>,
}

impl Ferry {
    /// Create an empty ferry docked at `side`.
    #[must_use]
    pub fn new(
        capacity: u32,
        side: Side,
        tracker: Arc<CompletionTracker>,
        trace: Arc<Trace>,
    ) -> Self {
        Self {
            state: Mutex::new(FerryState {
                side,
                load: 0,
                capacity,
                in_transit: false,
                crossings: 0,
            }),
            changed: Condvar::new(),
            tracker,
            trace,
        }
    }

    /// Side and load, observed atomically.
    #[must_use]
    pub fn snapshot(&self) -> FerrySnapshot {
        self.state.lock().snapshot()
    }

    /// Completion tracker shared with the agents.
    #[must_use]
    pub fn tracker(&self) -> &Arc<CompletionTracker> {
        &self.tracker
    }

    /// Check-and-board in one critical section.
    ///
    /// On acceptance the load grows by the vehicle's size, the vehicle's current
    /// side becomes the opposite side, and every waiter is woken.
    pub fn try_board(&self, vehicle: &mut Vehicle) -> BoardingOutcome {
        let mut state = self.state.lock();

        if vehicle.boardings() >= BOARDINGS_PER_ROUND_TRIP {
            return BoardingOutcome::Rejected(RejectReason::TripsExhausted);
        }
        if state.in_transit {
            return BoardingOutcome::Rejected(RejectReason::InTransit);
        }
        if state.side != vehicle.current_side() {
            return BoardingOutcome::Rejected(RejectReason::WrongSide { docked: state.side });
        }
        if !state.has_room_for(vehicle.size()) {
            return BoardingOutcome::Rejected(RejectReason::CapacityExceeded {
                load: state.load,
                size: vehicle.size(),
                capacity: state.capacity,
            });
        }

        state.load += vehicle.size();
        let from = state.side;
        vehicle.current_side = from.opposite();
        vehicle.boardings += 1;

        info!(
            vehicle = %vehicle.id(),
            class = %vehicle.id().class,
            phase = %vehicle.phase(),
            side = %from,
            load = state.load,
            capacity = state.capacity,
            "vehicle boarded"
        );
        self.trace.record(TraceKind::Boarded {
            vehicle: vehicle.id(),
            size: vehicle.size(),
            side: from,
            load: state.load,
            capacity: state.capacity,
        });
        self.changed.notify_all();

        BoardingOutcome::Accepted(Boarding {
            from,
            to: from.opposite(),
            load: state.load,
            crossing: state.crossings,
        })
    }

    /// Block until boarding is plausible for `vehicle`: docked on its side, not in
    /// transit, with room for it. Each individual wait lasts at most `max_wait`.
    ///
    /// The answer can be stale by the time the caller acts on it; the caller must
    /// still go through [`Self::try_board`].
    ///
    /// # Errors
    ///
    /// Returns [`StopRequested`] once the stop flag is raised.
    pub fn await_opportunity(
        &self,
        vehicle: &Vehicle,
        max_wait: Duration,
    ) -> Result<FerrySnapshot, StopRequested> {
        let mut state = self.state.lock();
        loop {
            self.check_stop()?;
            if state.admits(vehicle) {
                return Ok(state.snapshot());
            }
            self.changed.wait_for(&mut state, max_wait);
        }
    }

    /// Block until the crossing that started at `crossing` has completed and return
    /// the side reached.
    ///
    /// # Errors
    ///
    /// Returns [`StopRequested`] once the stop flag is raised.
    pub fn await_arrival(&self, crossing: u64, max_wait: Duration) -> Result<Side, StopRequested> {
        let mut state = self.state.lock();
        loop {
            if state.crossings > crossing {
                return Ok(arrival_side(&state, crossing));
            }
            self.check_stop()?;
            self.changed.wait_for(&mut state, max_wait);
        }
    }

    /// Wake every waiter so it re-checks its condition.
    pub fn signal(&self) {
        let _state = self.state.lock();
        self.changed.notify_all();
    }

    fn check_stop(&self) -> Result<(), StopRequested> {
        if self.tracker.stop_requested() {
            debug!("stop observed at ferry wait point");
            return Err(StopRequested);
        }
        Ok(())
    }
}

/// Side reached by the transit that followed crossing number `crossing`.
fn arrival_side(state: &FerryState, crossing: u64) -> Side {
    // `state.side` is where the ferry is now, after `state.crossings` transits.
    let since = state.crossings - crossing - 1;
    state.side.after_crossings(since)
}
