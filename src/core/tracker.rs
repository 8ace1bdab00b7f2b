//! Completion tracking and the global stop flag.

use serde::{Deserialize, Serialize};

use crate::sync::Mutex;

/// Counter values at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Vehicles whose agent is running.
    pub active: usize,
    /// Vehicles that finished their round trip.
    pub completed: usize,
    /// Vehicles that gave up because of a stop request.
    pub abandoned: usize,
    /// Ferry departures, empty ones included.
    pub departures: u64,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
}

/// Shared counters deciding global termination.
///
/// All mutation happens under one lock. The ferry may take this lock while holding
/// its own; this lock is never held while acquiring the ferry lock.
#[derive(Debug)]
pub struct CompletionTracker {
    population: usize,
    counters: Mutex<CounterSnapshot>,
}

impl CompletionTracker {
    /// Tracker for a run of `population` vehicles.
    #[must_use]
    pub fn new(population: usize) -> Self {
        Self {
            population,
            counters: Mutex::new(CounterSnapshot::default()),
        }
    }

    /// Total vehicles in the run.
    #[must_use]
    pub const fn population(&self) -> usize {
        self.population
    }

    /// A vehicle agent started.
    pub fn register(&self) {
        self.counters.lock().active += 1;
    }

    /// A vehicle returned home. Returns the new completed count.
    pub fn complete(&self) -> usize {
        let mut counters = self.counters.lock();
        counters.active = counters.active.saturating_sub(1);
        counters.completed += 1;
        debug_assert!(counters.completed <= self.population);
        counters.completed
    }

    /// A vehicle gave up mid-trip.
    pub fn abandon(&self) {
        let mut counters = self.counters.lock();
        counters.active = counters.active.saturating_sub(1);
        counters.abandoned += 1;
    }

    /// The ferry left a side. Returns the departure number, starting at 1.
    pub fn record_departure(&self) -> u64 {
        let mut counters = self.counters.lock();
        counters.departures += 1;
        counters.departures
    }

    /// Raise the stop flag. Returns `true` if this call raised it.
    pub fn request_stop(&self) -> bool {
        let mut counters = self.counters.lock();
        !std::mem::replace(&mut counters.stop_requested, true)
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.counters.lock().stop_requested
    }

    /// Whether every vehicle completed its round trip.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.counters.lock().completed >= self.population
    }

    /// Whether the controller should terminate: stop requested or everyone home.
    #[must_use]
    pub fn should_halt(&self) -> bool {
        let counters = self.counters.lock();
        counters.stop_requested || counters.completed >= self.population
    }

    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        *self.counters.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_reaches_population() {
        let tracker = CompletionTracker::new(2);
        tracker.register();
        tracker.register();
        assert!(!tracker.all_completed());

        assert_eq!(tracker.complete(), 1);
        assert_eq!(tracker.complete(), 2);
        assert!(tracker.all_completed());
        assert!(tracker.should_halt());

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.active, 0);
        assert_eq!(snapshot.completed, 2);
    }

    #[test]
    fn test_empty_population_is_complete() {
        assert!(CompletionTracker::new(0).should_halt());
    }

    #[test]
    fn test_request_stop_once() {
        let tracker = CompletionTracker::new(3);
        assert!(!tracker.should_halt());
        assert!(tracker.request_stop());
        assert!(!tracker.request_stop());
        assert!(tracker.stop_requested());
        assert!(tracker.should_halt());
    }

    #[test]
    fn test_abandon_and_departures() {
        let tracker = CompletionTracker::new(1);
        tracker.register();
        tracker.abandon();
        assert_eq!(tracker.record_departure(), 1);
        assert_eq!(tracker.record_departure(), 2);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.active, 0);
        assert_eq!(snapshot.abandoned, 1);
        assert_eq!(snapshot.completed, 0);
        assert_eq!(snapshot.departures, 2);
    }
}
