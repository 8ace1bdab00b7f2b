//! Simulated work collaborator.
//!
//! Vehicles, toll booths and the controller call [`Workload::perform`] at every point
//! where the crossing models processing latency. A workload consumes a bounded amount
//! of time or CPU, touches no shared state and never fails, so it can be swapped for
//! [`NoopWork`] in tests without changing any outcome.

use std::fmt;
use std::hint::black_box;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Label describing what a unit of simulated work stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkTask {
    /// Vehicle preparing before its first trip.
    Startup,
    /// Vehicle planning a boarding attempt.
    Planning,
    /// Toll booth processing the payment.
    TollPayment,
    /// Toll booth verifying the payment.
    TollVerification,
    /// Toll booth updating its records.
    TollRecords,
    /// Vehicle backing off after a rejected boarding.
    Waiting,
    /// Ferry crossing between sides.
    Transit,
    /// Vehicle working at the far side.
    Dwell,
    /// Vehicle wrapping up after returning home.
    Completing,
}

impl fmt::Display for WorkTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Startup => "vehicle startup",
            Self::Planning => "planning journey",
            Self::TollPayment => "processing toll payment",
            Self::TollVerification => "verifying payment",
            Self::TollRecords => "updating records",
            Self::Waiting => "waiting for ferry",
            Self::Transit => "ferry transit",
            Self::Dwell => "working at destination",
            Self::Completing => "completing journey",
        };
        f.write_str(label)
    }
}

/// Bounded simulated work.
pub trait Workload: Send + Sync {
    /// Perform one unit of work for `task`.
    fn perform(&self, task: WorkTask);
}

/// Zero-cost workload for deterministic tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWork;

impl Workload for NoopWork {
    #[inline]
    fn perform(&self, _task: WorkTask) {}
}

/// Sleeps for a fixed duration per unit; transit sleeps five units.
#[derive(Debug, Clone, Copy)]
pub struct SleepWork {
    unit: Duration,
}

impl SleepWork {
    /// Create a workload sleeping `unit` per call.
    #[must_use]
    pub const fn new(unit: Duration) -> Self {
        Self { unit }
    }
}

impl Workload for SleepWork {
    fn perform(&self, task: WorkTask) {
        let units = if task == WorkTask::Transit { 5 } else { 1 };
        std::thread::sleep(self.unit * units);
    }
}

/// CPU-bound workload: a fixed number of floating point series iterations.
#[derive(Debug, Clone, Copy)]
pub struct SpinWork {
    iterations: u32,
}

impl SpinWork {
    /// Create a workload spinning `iterations` per call.
    #[must_use]
    pub const fn new(iterations: u32) -> Self {
        Self { iterations }
    }
}

impl Workload for SpinWork {
    fn perform(&self, task: WorkTask) {
        let iterations = if task == WorkTask::Transit {
            self.iterations.saturating_mul(5)
        } else {
            self.iterations
        };
        black_box(series(iterations));
    }
}

/// Partial sums of `1/i² + 1/i³ + 1/i⁴` with a damping step every hundred terms.
fn series(iterations: u32) -> f64 {
    let mut result = 1.0_f64;
    for i in 1..iterations {
        let x = f64::from(black_box(i));
        result += 1.0 / (x * x) + 1.0 / (x * x * x) + 1.0 / (x * x * x * x);
        if i % 100 == 0 {
            result = result.mul_add(0.999_999, result * 0.003);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_noop_work_is_immediate() {
        let started = Instant::now();
        for _ in 0..10_000 {
            NoopWork.perform(WorkTask::Transit);
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sleep_work_scales_transit() {
        let work = SleepWork::new(Duration::from_millis(2));
        let started = Instant::now();
        work.perform(WorkTask::Transit);
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_series_is_finite() {
        assert!(series(10_000).is_finite());
        assert!((series(0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_task_labels() {
        assert_eq!(WorkTask::TollPayment.to_string(), "processing toll payment");
        assert_eq!(WorkTask::Transit.to_string(), "ferry transit");
    }
}
