//! Per-SKU exclusive sections.
//!
//! Everything that reads and then writes one SKU's quantity, or the status of
//! a transaction against it, runs while holding that SKU's guard. Different
//! SKUs never contend with each other.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use stockledger_core::Sku;

/// Set of SKUs currently held, with a condition variable to park waiters.
#[derive(Debug, Default)]
pub struct SkuLocks {
    held: Mutex<HashSet<Sku>>,
    released: Condvar,
}

impl SkuLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `sku` is free, then hold it until the guard drops.
    ///
    /// Not re-entrant: locking a SKU the current thread already holds deadlocks.
    pub fn lock(&self, sku: Sku) -> SkuGuard<'_> {
        let mut held = self.held_set();
        while held.contains(&sku) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(sku);
        SkuGuard { locks: self, sku }
    }

    pub fn is_held(&self, sku: Sku) -> bool {
        self.held_set().contains(&sku)
    }

    // The set is only touched in short insert/remove sections that cannot
    // leave it half-updated, so a poisoned mutex is still consistent.
    fn held_set(&self) -> MutexGuard<'_, HashSet<Sku>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of holding one SKU's exclusive section.
#[derive(Debug)]
pub struct SkuGuard<'a> {
    locks: &'a SkuLocks,
    sku: Sku,
}

impl SkuGuard<'_> {
    pub fn sku(&self) -> Sku {
        self.sku
    }

    /// Whether this guard was issued by `locks`.
    pub fn issued_by(&self, locks: &SkuLocks) -> bool {
        std::ptr::eq(self.locks, locks)
    }
}

impl Drop for SkuGuard<'_> {
    fn drop(&mut self) {
        self.locks.held_set().remove(&self.sku);
        self.locks.released.notify_all();
    }
}
