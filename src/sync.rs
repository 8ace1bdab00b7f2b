//! Locking primitives shared by the ferry, the toll booths and the completion tracker.
//!
//! The mutex types are re-exported from `parking_lot` (no poisoning, compact, fast
//! uncontended path). [`Condvar`] wraps `parking_lot::Condvar` and adds the bounded
//! waits every suspension point in this crate relies on: nothing ever blocks without a
//! timeout, so a missed stop signal costs at most one wait interval.
//!
//! # Examples
//!
//! ```
//! use ferry_crossing::sync::{Condvar, Mutex};
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let dock = Arc::new((Mutex::new(false), Condvar::new()));
//! let dock2 = Arc::clone(&dock);
//!
//! thread::spawn(move || {
//!     let (docked, cvar) = &*dock2;
//!     *docked.lock() = true;
//!     cvar.notify_all();
//! });
//!
//! let (docked, cvar) = &*dock;
//! let mut guard = docked.lock();
//! while !*guard {
//!     cvar.wait_for(&mut guard, Duration::from_millis(50));
//! }
//! assert!(*guard);
//! ```

use std::time::{Duration, Instant};

pub use parking_lot::{Mutex, MutexGuard, WaitTimeoutResult};

/// A condition variable with bounded waits.
///
/// Unlike `std::sync::Condvar`, this type does not implement poisoning. Every wait
/// must be re-checked in a loop by the caller; spurious wakeups are allowed.
#[derive(Debug, Default)]
pub struct Condvar {
    inner: parking_lot::Condvar,
}

impl Condvar {
    /// Creates a new condition variable.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: parking_lot::Condvar::new(),
        }
    }

    /// Blocks until notified or until `timeout` has elapsed.
    ///
    /// ```
    /// use ferry_crossing::sync::{Condvar, Mutex};
    /// use std::time::Duration;
    ///
    /// let load = Mutex::new(0_u32);
    /// let cvar = Condvar::new();
    /// let mut guard = load.lock();
    /// let result = cvar.wait_for(&mut guard, Duration::from_millis(5));
    /// assert!(result.timed_out());
    /// ```
    #[inline]
    pub fn wait_for<T>(&self, guard: &mut MutexGuard<'_, T>, timeout: Duration) -> WaitTimeoutResult {
        self.inner.wait_for(guard, timeout)
    }

    /// Blocks while `condition` holds, giving up at `deadline`.
    ///
    /// Returns `true` when the condition cleared, `false` when the deadline passed
    /// first. The condition is always evaluated at least once before sleeping.
    pub fn wait_while_until<T, F>(
        &self,
        guard: &mut MutexGuard<'_, T>,
        mut condition: F,
        deadline: Instant,
    ) -> bool
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(guard) {
            if self.inner.wait_until(guard, deadline).timed_out() {
                return !condition(guard);
            }
        }
        true
    }

    /// Wakes up all blocked threads. Returns the number of threads woken.
    #[inline]
    pub fn notify_all(&self) -> usize {
        self.inner.notify_all()
    }
}
