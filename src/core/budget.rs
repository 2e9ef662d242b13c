//! Handle budget: outstanding-unit counter plus an adjustable ceiling.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::core::DispatchError;

/// Ceiling used until someone sets a real one.
pub const UNBOUNDED_LIMIT: f64 = f64::MAX;

/// Counts outstanding units against a maximum.
///
/// Uses a lock-free CAS loop for admission so the tracker can be shared by
/// drivers running on any tokio worker. The ceiling is stored as the bit
/// pattern of an `f64` so fractional limits round-trip exactly.
#[derive(Debug)]
pub struct BudgetTracker {
    outstanding: AtomicUsize,
    limit_bits: AtomicU64,
}

impl Default for BudgetTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BudgetTracker {
    /// Create an unbounded tracker with nothing outstanding.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outstanding: AtomicUsize::new(0),
            limit_bits: AtomicU64::new(UNBOUNDED_LIMIT.to_bits()),
        }
    }

    /// Create a tracker with an initial ceiling, validated like [`Self::set_limit`].
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidLimit`] for NaN, infinite, or sub-1 values.
    pub fn with_limit(limit: f64) -> Result<Self, DispatchError> {
        let tracker = Self::new();
        tracker.set_limit(limit)?;
        Ok(tracker)
    }

    /// Number of units currently admitted and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Current ceiling.
    pub fn limit(&self) -> f64 {
        f64::from_bits(self.limit_bits.load(Ordering::Acquire))
    }

    /// Whether the ceiling is still the unbounded default.
    pub fn is_unbounded(&self) -> bool {
        self.limit().to_bits() == UNBOUNDED_LIMIT.to_bits()
    }

    /// Replace the ceiling. Lowering it never interrupts running units.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidLimit`] and leaves the ceiling unchanged
    /// unless `limit` is finite and at least one.
    pub fn set_limit(&self, limit: f64) -> Result<(), DispatchError> {
        if !limit.is_finite() || limit < 1.0 {
            return Err(DispatchError::InvalidLimit(limit));
        }
        self.store_limit(limit);
        Ok(())
    }

    pub(crate) fn store_limit(&self, limit: f64) {
        self.limit_bits.store(limit.to_bits(), Ordering::Release);
    }

    /// Admit one unit if the ceiling allows it.
    ///
    /// Returns `false` without touching the counter when at capacity.
    #[allow(clippy::cast_precision_loss)]
    pub fn try_admit(&self) -> bool {
        let mut current = self.outstanding.load(Ordering::Acquire);
        loop {
            if current as f64 >= self.limit() {
                return false;
            }
            match self.outstanding.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Release one admitted unit and return how many remain outstanding.
    ///
    /// # Panics
    ///
    /// Panics if nothing is outstanding; every release must pair with an admission.
    pub fn release(&self) -> usize {
        match self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => panic!("budget released with no outstanding units"),
        }
    }

    /// Admit one unit and return a permit that releases it when dropped.
    pub fn try_acquire(&self) -> Option<BudgetPermit<'_>> {
        self.try_admit().then(|| BudgetPermit {
            budget: self,
            armed: true,
        })
    }
}

/// One admitted slot. Released exactly once, explicitly or on drop.
#[derive(Debug)]
#[must_use = "dropping the permit releases the slot immediately"]
pub struct BudgetPermit<'a> {
    budget: &'a BudgetTracker,
    armed: bool,
}

impl BudgetPermit<'_> {
    /// Release the slot and return how many units remain outstanding.
    pub fn release(mut self) -> usize {
        self.armed = false;
        self.budget.release()
    }
}

impl Drop for BudgetPermit<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.budget.release();
        }
    }
}
