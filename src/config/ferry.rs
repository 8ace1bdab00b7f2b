//! Crossing configuration structures.
//!
//! Every section defaults to the values of the reference run: a 20-unit ferry,
//! 12 light, 10 medium and 8 heavy vehicles, two toll booths per side.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{FerryError, Side, VehicleClass};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "FERRY_CONFIG";

/// Number of vehicles per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Light vehicles (cars).
    pub light: u32,
    /// Medium vehicles (minibuses).
    pub medium: u32,
    /// Heavy vehicles (trucks).
    pub heavy: u32,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            light: 12,
            medium: 10,
            heavy: 8,
        }
    }
}

impl FleetConfig {
    /// Vehicles of `class`.
    #[must_use]
    pub const fn count(&self, class: VehicleClass) -> u32 {
        match class {
            VehicleClass::Light => self.light,
            VehicleClass::Medium => self.medium,
            VehicleClass::Heavy => self.heavy,
        }
    }

    /// Total population.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.light + self.medium + self.heavy
    }
}

/// Capacity units occupied by each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSizes {
    /// Units per light vehicle.
    pub light: u32,
    /// Units per medium vehicle.
    pub medium: u32,
    /// Units per heavy vehicle.
    pub heavy: u32,
}

impl Default for UnitSizes {
    fn default() -> Self {
        Self {
            light: 1,
            medium: 2,
            heavy: 3,
        }
    }
}

impl UnitSizes {
    /// Units for `class`.
    #[must_use]
    pub const fn of(&self, class: VehicleClass) -> u32 {
        match class {
            VehicleClass::Light => self.light,
            VehicleClass::Medium => self.medium,
            VehicleClass::Heavy => self.heavy,
        }
    }

    /// Largest single unit size.
    #[must_use]
    pub fn largest(&self) -> u32 {
        self.light.max(self.medium).max(self.heavy)
    }
}

/// Controller and agent timing. All durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long the controller waits for load before counting an empty cycle.
    pub load_timeout_ms: u64,
    /// First partial-load backoff.
    pub partial_backoff_base_ms: u64,
    /// Upper bound on the partial-load backoff.
    pub partial_backoff_max_ms: u64,
    /// Partial-load cycles after which the ferry leaves regardless.
    pub max_wait_cycles: u32,
    /// Load at or above which a partially loaded ferry leaves. Defaults to
    /// three quarters of capacity when unset.
    pub high_watermark: Option<u32>,
    /// Longest single wait of a vehicle for a boarding opportunity or arrival.
    pub retry_interval_ms: u64,
    /// Grace period for the controller to stop before it is abandoned.
    pub shutdown_grace_ms: u64,
    /// Work units a vehicle spends at the far side.
    pub dwell_units: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 1_000,
            partial_backoff_base_ms: 100,
            partial_backoff_max_ms: 500,
            max_wait_cycles: 3,
            high_watermark: None,
            retry_interval_ms: 50,
            shutdown_grace_ms: 2_000,
            dwell_units: 10,
        }
    }
}

impl TimingConfig {
    /// Fast timings suited to tests: millisecond waits, short dwell.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            load_timeout_ms: 10,
            partial_backoff_base_ms: 1,
            partial_backoff_max_ms: 4,
            max_wait_cycles: 3,
            high_watermark: None,
            retry_interval_ms: 5,
            shutdown_grace_ms: 2_000,
            dwell_units: 2,
        }
    }

    /// Load wait timeout.
    #[must_use]
    pub const fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Vehicle retry interval.
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Controller shutdown grace period.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Simulated work implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WorkloadConfig {
    /// No work at all.
    Noop,
    /// Sleep per work unit.
    Sleep {
        /// Milliseconds per unit.
        millis: u64,
    },
    /// CPU-bound series per work unit.
    Spin {
        /// Iterations per unit.
        iterations: u32,
    },
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self::Sleep { millis: 5 }
    }
}

/// Root configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    /// Ferry capacity in units.
    pub capacity: u32,
    /// Vehicles per class.
    pub fleet: FleetConfig,
    /// Units per class.
    pub unit_sizes: UnitSizes,
    /// Toll booths on each side.
    pub tolls_per_side: usize,
    /// Side the ferry starts docked at; random when unset.
    pub initial_side: Option<Side>,
    /// Seed for home sides and initial side; entropy when unset.
    pub seed: Option<u64>,
    /// Controller and agent timing.
    pub timing: TimingConfig,
    /// Simulated work.
    pub workload: WorkloadConfig,
}

impl Default for FerryConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            fleet: FleetConfig::default(),
            unit_sizes: UnitSizes::default(),
            tolls_per_side: 2,
            initial_side: None,
            seed: None,
            timing: TimingConfig::default(),
            workload: WorkloadConfig::default(),
        }
    }
}

impl FerryConfig {
    /// Resolved high watermark.
    #[must_use]
    pub fn high_watermark(&self) -> u32 {
        self.timing
            .high_watermark
            .unwrap_or_else(|| {
                u32::try_from(u64::from(self.capacity) * 3 / 4).map_or(self.capacity, |w| w.max(1))
            })
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        for class in VehicleClass::ALL {
            if self.unit_sizes.of(class) == 0 {
                return Err(format!("unit size for {class} must be greater than 0"));
            }
        }
        if self.unit_sizes.largest() > self.capacity {
            return Err(format!(
                "capacity {} is smaller than the largest unit size {}",
                self.capacity,
                self.unit_sizes.largest()
            ));
        }
        if self.tolls_per_side == 0 {
            return Err("tolls_per_side must be greater than 0".into());
        }
        let watermark = self.high_watermark();
        if watermark == 0 || watermark > self.capacity {
            return Err(format!(
                "high_watermark {watermark} must be within 1..={}",
                self.capacity
            ));
        }
        if self.timing.load_timeout_ms == 0 {
            return Err("load_timeout_ms must be greater than 0".into());
        }
        if self.timing.retry_interval_ms == 0 {
            return Err("retry_interval_ms must be greater than 0".into());
        }
        if self.timing.max_wait_cycles == 0 {
            return Err("max_wait_cycles must be greater than 0".into());
        }
        if self.timing.partial_backoff_base_ms > self.timing.partial_backoff_max_ms {
            return Err("partial_backoff_base_ms must not exceed partial_backoff_max_ms".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Io`] if the file cannot be read and
    /// [`FerryError::InvalidConfig`] if it does not parse or validate.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FerryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| FerryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text).map_err(FerryError::InvalidConfig)
    }

    /// Load from the file named by `FERRY_CONFIG` (after reading `.env`), or the
    /// validated defaults when it is unset.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::from_file`] failures.
    pub fn from_env() -> Result<Self, FerryError> {
        let _ = dotenvy::dotenv();
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => {
                let cfg = Self::default();
                cfg.validate().map_err(FerryError::InvalidConfig)?;
                Ok(cfg)
            }
        }
    }
}
