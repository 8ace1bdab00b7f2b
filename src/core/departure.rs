//! Batching departure policy.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::FerryConfig;

/// Why the ferry left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureTrigger {
    /// Load reached capacity.
    Full,
    /// Nobody boarded within the load timeout.
    EmptyTimeout,
    /// Partially loaded and the high watermark or the wait-cycle limit was reached.
    Partial,
}

impl fmt::Display for DepartureTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Full => "full",
            Self::EmptyTimeout => "empty-timeout",
            Self::Partial => "partial",
        })
    }
}

/// What the controller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Leave now.
    Depart(DepartureTrigger),
    /// Keep loading for up to this long, then evaluate again.
    Hold(Duration),
    /// Nothing to decide yet; go back to waiting for load.
    Idle,
}

/// Thresholds of the batching policy. Pure: no locks, no clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeparturePolicy {
    capacity: u32,
    high_watermark: u32,
    max_wait_cycles: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl DeparturePolicy {
    /// Build a policy from explicit thresholds.
    #[must_use]
    pub const fn new(
        capacity: u32,
        high_watermark: u32,
        max_wait_cycles: u32,
        backoff_base: Duration,
        backoff_max: Duration,
    ) -> Self {
        Self {
            capacity,
            high_watermark,
            max_wait_cycles,
            backoff_base,
            backoff_max,
        }
    }

    /// Build a policy from configuration.
    #[must_use]
    pub fn from_config(cfg: &FerryConfig) -> Self {
        Self::new(
            cfg.capacity,
            cfg.high_watermark(),
            cfg.timing.max_wait_cycles,
            Duration::from_millis(cfg.timing.partial_backoff_base_ms),
            Duration::from_millis(cfg.timing.partial_backoff_max_ms),
        )
    }

    /// Ferry capacity.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Load at which a partially loaded ferry leaves without further holds.
    #[must_use]
    pub const fn high_watermark(&self) -> u32 {
        self.high_watermark
    }

    /// Evaluate the triggers in priority order: full, empty-timeout, partial.
    ///
    /// `timed_out` is whether the load wait timed out since the last departure;
    /// `wait_cycles` is how many partial-load holds have elapsed since then.
    #[must_use]
    pub fn evaluate(&self, load: u32, timed_out: bool, wait_cycles: u32) -> Decision {
        if load >= self.capacity {
            return Decision::Depart(DepartureTrigger::Full);
        }
        if load == 0 {
            return if timed_out {
                Decision::Depart(DepartureTrigger::EmptyTimeout)
            } else {
                Decision::Idle
            };
        }
        if load >= self.high_watermark || wait_cycles >= self.max_wait_cycles {
            return Decision::Depart(DepartureTrigger::Partial);
        }
        Decision::Hold(self.backoff(wait_cycles))
    }

    /// Hold duration for the given cycle: `base * 2^cycle`, capped at the maximum.
    #[must_use]
    pub fn backoff(&self, wait_cycles: u32) -> Duration {
        let factor = 1_u32.checked_shl(wait_cycles).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .map_or(self.backoff_max, |d| d.min(self.backoff_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> DeparturePolicy {
        DeparturePolicy::new(
            20,
            15,
            3,
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
    }

    #[test]
    fn test_full_trigger_wins() {
        assert_eq!(
            policy().evaluate(20, true, 0),
            Decision::Depart(DepartureTrigger::Full)
        );
    }

    #[test]
    fn test_empty_departs_only_after_timeout() {
        assert_eq!(policy().evaluate(0, false, 0), Decision::Idle);
        assert_eq!(
            policy().evaluate(0, true, 0),
            Decision::Depart(DepartureTrigger::EmptyTimeout)
        );
    }

    #[test]
    fn test_partial_holds_then_departs() {
        let policy = policy();
        assert_eq!(
            policy.evaluate(4, false, 0),
            Decision::Hold(Duration::from_millis(100))
        );
        assert_eq!(
            policy.evaluate(4, false, 2),
            Decision::Hold(Duration::from_millis(400))
        );
        assert_eq!(
            policy.evaluate(4, false, 3),
            Decision::Depart(DepartureTrigger::Partial)
        );
    }

    #[test]
    fn test_high_watermark_departs_early() {
        assert_eq!(
            policy().evaluate(15, false, 0),
            Decision::Depart(DepartureTrigger::Partial)
        );
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = policy();
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(500));
        assert_eq!(policy.backoff(40), Duration::from_millis(500));
    }

    #[test]
    fn test_from_config_uses_watermark_default() {
        let policy = DeparturePolicy::from_config(&FerryConfig::default());
        assert_eq!(policy.capacity(), 20);
        assert_eq!(policy.high_watermark(), 15);
        assert_eq!(
            policy.evaluate(15, false, 0),
            Decision::Depart(DepartureTrigger::Partial)
        );
    }
}
