//! Vehicle identity and per-vehicle trip state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::side::Side;

/// Boardings a vehicle makes over one round trip.
pub const BOARDINGS_PER_ROUND_TRIP: u8 = 2;

/// Vehicle class; each class has a fixed unit size for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    /// Cars.
    Light,
    /// Minibuses.
    Medium,
    /// Trucks.
    Heavy,
}

impl VehicleClass {
    /// All classes, lightest first.
    pub const ALL: [Self; 3] = [Self::Light, Self::Medium, Self::Heavy];
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
        })
    }
}

/// Vehicle identity: class plus a number unique within that class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId {
    /// Vehicle class.
    pub class: VehicleClass,
    /// One-based number within the class.
    pub number: u32,
}

impl VehicleId {
    /// Build an id.
    #[must_use]
    pub const fn new(class: VehicleClass, number: u32) -> Self {
        Self { class, number }
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.class, self.number)
    }
}

/// Which leg of the round trip a vehicle is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPhase {
    /// Home side to far side.
    Outbound,
    /// Far side back home.
    Returning,
}

impl fmt::Display for TripPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Outbound => "outbound",
            Self::Returning => "returning",
        })
    }
}

/// Static description of a vehicle before its agent starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSpec {
    /// Identity.
    pub id: VehicleId,
    /// Capacity units the vehicle occupies.
    pub size: u32,
    /// Side the vehicle starts from and must return to.
    pub home: Side,
}

/// A vehicle's mutable trip state, owned exclusively by its agent.
///
/// `current_side` is only changed by [`Ferry::try_board`](crate::core::Ferry::try_board)
/// while it holds the ferry lock.
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: VehicleId,
    size: u32,
    home: Side,
    pub(crate) current_side: Side,
    pub(crate) phase: TripPhase,
    pub(crate) boardings: u8,
    completed: bool,
    work_cycles: u64,
}

impl Vehicle {
    /// Create a vehicle parked at its home side.
    #[must_use]
    pub const fn new(spec: VehicleSpec) -> Self {
        Self {
            id: spec.id,
            size: spec.size,
            home: spec.home,
            current_side: spec.home,
            phase: TripPhase::Outbound,
            boardings: 0,
            completed: false,
            work_cycles: 0,
        }
    }

    /// Identity.
    #[must_use]
    pub const fn id(&self) -> VehicleId {
        self.id
    }

    /// Capacity units.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Home side.
    #[must_use]
    pub const fn home(&self) -> Side {
        self.home
    }

    /// Side the vehicle is on, or heading to once boarded.
    #[must_use]
    pub const fn current_side(&self) -> Side {
        self.current_side
    }

    /// Current leg of the round trip.
    #[must_use]
    pub const fn phase(&self) -> TripPhase {
        self.phase
    }

    /// Committed boardings so far.
    #[must_use]
    pub const fn boardings(&self) -> u8 {
        self.boardings
    }

    /// Whether the round trip is finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Units of simulated work performed.
    #[must_use]
    pub const fn work_cycles(&self) -> u64 {
        self.work_cycles
    }

    pub(crate) fn begin_return(&mut self) {
        self.phase = TripPhase::Returning;
    }

    pub(crate) fn mark_completed(&mut self) {
        debug_assert_eq!(self.current_side, self.home);
        debug_assert_eq!(self.boardings, BOARDINGS_PER_ROUND_TRIP);
        self.completed = true;
    }

    pub(crate) fn count_work(&mut self) {
        self.work_cycles += 1;
    }
}
