//! Fleet generation from configuration.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::FerryConfig;
use crate::core::vehicle::{VehicleClass, VehicleId, VehicleSpec};
use crate::core::Side;

/// The vehicles of a run and the side the ferry starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fleet {
    /// Vehicles, lights first, numbered from 1 within each class.
    pub vehicles: Vec<VehicleSpec>,
    /// Side the ferry starts docked at.
    pub initial_side: Side,
}

impl Fleet {
    /// Generate the fleet described by `cfg`.
    ///
    /// Home sides are random, as is the initial ferry side unless configured.
    /// With `cfg.seed` set, the result is reproducible.
    #[must_use]
    pub fn from_config(cfg: &FerryConfig) -> Self {
        let mut rng = cfg
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let vehicles = VehicleClass::ALL
            .into_iter()
            .flat_map(|class| (1..=cfg.fleet.count(class)).map(move |n| (class, n)))
            .map(|(class, number)| VehicleSpec {
                id: VehicleId::new(class, number),
                size: cfg.unit_sizes.of(class),
                home: Side::from(rng.random_bool(0.5)),
            })
            .collect();

        let initial_side = cfg
            .initial_side
            .unwrap_or_else(|| Side::from(rng.random_bool(0.5)));

        Self {
            vehicles,
            initial_side,
        }
    }

    /// An explicit fleet.
    #[must_use]
    pub const fn new(vehicles: Vec<VehicleSpec>, initial_side: Side) -> Self {
        Self {
            vehicles,
            initial_side,
        }
    }

    /// Number of vehicles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether there are no vehicles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Total units across the fleet.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.vehicles.iter().map(|v| u64::from(v.size)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fleet_shape() {
        let cfg = FerryConfig {
            seed: Some(7),
            ..FerryConfig::default()
        };
        let fleet = Fleet::from_config(&cfg);

        assert_eq!(fleet.len(), 30);
        assert_eq!(fleet.total_units(), 12 + 20 + 24);
        assert_eq!(fleet.vehicles[0].id, VehicleId::new(VehicleClass::Light, 1));
        assert_eq!(fleet.vehicles[12].id, VehicleId::new(VehicleClass::Medium, 1));
        assert_eq!(fleet.vehicles[29].id, VehicleId::new(VehicleClass::Heavy, 8));
        assert!(fleet
            .vehicles
            .iter()
            .all(|v| v.size == cfg.unit_sizes.of(v.id.class)));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let cfg = FerryConfig {
            seed: Some(42),
            ..FerryConfig::default()
        };
        assert_eq!(Fleet::from_config(&cfg), Fleet::from_config(&cfg));
    }

    #[test]
    fn test_configured_initial_side_wins() {
        let cfg = FerryConfig {
            seed: Some(1),
            initial_side: Some(Side::East),
            ..FerryConfig::default()
        };
        assert_eq!(Fleet::from_config(&cfg).initial_side, Side::East);
    }
}
