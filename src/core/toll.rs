//! Toll booths, partitioned by side.
//!
//! Each booth sits behind its own mutex so booths never contend with each other, and
//! the two sides' subsets are disjoint. A [`TollPass`] is the scoped hold on one booth;
//! dropping it releases the booth on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use tracing::debug;

use crate::core::{FerryError, Side};
use crate::sync::{Mutex, MutexGuard};

/// Chooses which booth of a side a vehicle queues at.
pub trait TollSelector: Send + Sync {
    /// Return an index in `0..booths` for `side`. `booths` is never zero.
    fn select(&self, side: Side, booths: usize) -> usize;
}

/// Uniformly random booth choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl TollSelector for RandomSelector {
    fn select(&self, _side: Side, booths: usize) -> usize {
        rand::rng().random_range(0..booths)
    }
}

/// Rotates through each side's booths independently.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    next: [AtomicUsize; 2],
}

impl TollSelector for RoundRobinSelector {
    fn select(&self, side: Side, booths: usize) -> usize {
        self.next[side.index()].fetch_add(1, Ordering::Relaxed) % booths
    }
}

/// State of one booth.
#[derive(Debug)]
struct TollBooth {
    id: usize,
    side: Side,
    uses: u64,
}

/// Exclusive hold on one booth. Released on drop.
#[derive(Debug)]
pub struct TollPass<'a> {
    booth: MutexGuard<'a, TollBooth>,
}

impl TollPass<'_> {
    /// Booth being held.
    #[must_use]
    pub fn booth_id(&self) -> usize {
        self.booth.id
    }

    /// Side of the booth.
    #[must_use]
    pub fn side(&self) -> Side {
        self.booth.side
    }
}

/// Usage snapshot of one booth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoothUsage {
    /// Pool-wide booth number.
    pub id: usize,
    /// Side of the booth.
    pub side: Side,
    /// Vehicles processed.
    pub uses: u64,
}

/// All booths of the crossing.
#[derive(Debug)]
pub struct TollPool {
    sides: [Vec<Mutex<TollBooth>>; 2],
}

impl TollPool {
    /// Build a pool with `west` booths on side 0 and `east` booths on side 1.
    /// Booths are numbered west first.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::NoTollBooths`] if either side would be empty.
    pub fn new(west: usize, east: usize) -> Result<Self, FerryError> {
        if west == 0 {
            return Err(FerryError::NoTollBooths(Side::West));
        }
        if east == 0 {
            return Err(FerryError::NoTollBooths(Side::East));
        }
        let booths = |side: Side, offset: usize, count: usize| {
            (0..count)
                .map(|i| {
                    Mutex::new(TollBooth {
                        id: offset + i,
                        side,
                        uses: 0,
                    })
                })
                .collect::<Vec<_>>()
        };
        Ok(Self {
            sides: [booths(Side::West, 0, west), booths(Side::East, west, east)],
        })
    }

    /// Same number of booths on both sides.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::NoTollBooths`] if `per_side` is zero.
    pub fn symmetric(per_side: usize) -> Result<Self, FerryError> {
        Self::new(per_side, per_side)
    }

    /// Block until a booth on `side` chosen by `selector` is free and hold it.
    ///
    /// Out-of-range selections are wrapped onto the side's subset, so a booth on
    /// the wrong side can never be returned.
    pub fn pass(&self, side: Side, selector: &dyn TollSelector) -> TollPass<'_> {
        let booths = &self.sides[side.index()];
        let index = selector.select(side, booths.len()) % booths.len();
        let mut booth = booths[index].lock();
        booth.uses += 1;
        debug!(booth = booth.id, side = %side, uses = booth.uses, "toll booth acquired");
        TollPass { booth }
    }

    /// Whether every booth is currently free.
    #[must_use]
    pub fn all_free(&self) -> bool {
        self.sides
            .iter()
            .flatten()
            .all(|booth| !booth.is_locked())
    }

    /// Per-booth usage, west first.
    #[must_use]
    pub fn usage(&self) -> Vec<BoothUsage> {
        self.sides
            .iter()
            .flatten()
            .map(|booth| {
                let booth = booth.lock();
                BoothUsage {
                    id: booth.id,
                    side: booth.side,
                    uses: booth.uses,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct Fixed(usize);

    impl TollSelector for Fixed {
        fn select(&self, _side: Side, _booths: usize) -> usize {
            self.0
        }
    }

    #[test]
    fn test_empty_side_rejected() {
        assert!(matches!(
            TollPool::new(0, 2),
            Err(FerryError::NoTollBooths(Side::West))
        ));
        assert!(matches!(
            TollPool::new(2, 0),
            Err(FerryError::NoTollBooths(Side::East))
        ));
    }

    #[test]
    fn test_pass_stays_on_requested_side() {
        let pool = TollPool::new(2, 3).unwrap();
        for _ in 0..20 {
            let pass = pool.pass(Side::East, &RandomSelector);
            assert_eq!(pass.side(), Side::East);
            assert!((2..5).contains(&pass.booth_id()));
        }
        let pass = pool.pass(Side::West, &Fixed(7));
        assert_eq!(pass.side(), Side::West);
        assert_eq!(pass.booth_id(), 1);
    }

    #[test]
    fn test_pass_released_on_drop() {
        let pool = TollPool::symmetric(1).unwrap();
        {
            let _pass = pool.pass(Side::West, &RandomSelector);
            assert!(!pool.all_free());
        }
        assert!(pool.all_free());
    }

    #[test]
    fn test_sides_do_not_contend() {
        let pool = Arc::new(TollPool::symmetric(1).unwrap());
        let _west = pool.pass(Side::West, &RandomSelector);

        let pool2 = Arc::clone(&pool);
        let handle = thread::spawn(move || pool2.pass(Side::East, &RandomSelector).booth_id());
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[test]
    fn test_booth_is_exclusive() {
        let pool = Arc::new(TollPool::symmetric(1).unwrap());
        let held = pool.pass(Side::East, &RandomSelector);

        let pool2 = Arc::clone(&pool);
        let handle = thread::spawn(move || {
            let _pass = pool2.pass(Side::East, &RandomSelector);
        });
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());
        drop(held);
        handle.join().unwrap();
    }

    #[test]
    fn test_round_robin_rotates_per_side() {
        let selector = RoundRobinSelector::default();
        let picks: Vec<_> = (0..4).map(|_| selector.select(Side::West, 2)).collect();
        assert_eq!(picks, vec![0, 1, 0, 1]);
        assert_eq!(selector.select(Side::East, 3), 0);
    }

    #[test]
    fn test_usage_counts_passes() {
        let pool = TollPool::symmetric(2).unwrap();
        drop(pool.pass(Side::West, &Fixed(0)));
        drop(pool.pass(Side::West, &Fixed(0)));
        drop(pool.pass(Side::East, &Fixed(1)));
        let usage = pool.usage();
        assert_eq!(usage[0].uses, 2);
        assert_eq!(usage[3].uses, 1);
        assert_eq!(usage.iter().map(|u| u.uses).sum::<u64>(), 3);
    }
}
