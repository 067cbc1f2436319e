//! core::lock
//!
//! Per-site mutual-exclusion lock registry.
//!
//! # Architecture
//!
//! Each site gets exactly one lock primitive, created lazily on first use
//! and never evicted for the lifetime of the registry. The lock gates sync
//! attempts: only one synchronization worker may run per site at a time.
//!
//! Acquisition is non-blocking. An overlapping scheduled run for a busy
//! site observes the lock busy and skips, so sync attempts never queue or
//! pile up under slow network conditions.
//!
//! The registry is an injected service with an ordinary lifetime, not a
//! process global, so tests and embedders can supply isolated instances.
//!
//! # Invariants
//!
//! - At most one active holder per site id at any instant
//! - `try_acquire` returns immediately, held or not
//! - The lock is released when the guard drops (RAII), including on panic
//! - Acquiring site A never interferes with site B

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::types::SiteId;

/// Registry of per-site sync locks.
///
/// # Example
///
/// ```
/// use sitesync::core::lock::SiteLockRegistry;
/// use sitesync::core::types::SiteId;
///
/// let registry = SiteLockRegistry::new();
/// let site = SiteId::new("corporate").unwrap();
///
/// let guard = registry.try_acquire(&site).expect("lock available");
/// assert!(registry.try_acquire(&site).is_none());
///
/// drop(guard);
/// assert!(registry.try_acquire(&site).is_some());
/// ```
#[derive(Debug, Default)]
pub struct SiteLockRegistry {
    /// One flag per site id, created lazily, never removed.
    locks: Mutex<HashMap<SiteId, Arc<AtomicBool>>>,
}

impl SiteLockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to acquire the sync lock for a site.
    ///
    /// Returns `None` immediately if another attempt currently holds the
    /// lock for this site. This component cannot fail, only report
    /// busy/available.
    pub fn try_acquire(&self, site: &SiteId) -> Option<SiteLockGuard> {
        let flag = {
            let mut locks = self.locks.lock().expect("lock registry poisoned");
            Arc::clone(locks.entry(site.clone()).or_default())
        };

        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SiteLockGuard {
                site: site.clone(),
                flag: Some(flag),
            })
        } else {
            None
        }
    }

    /// Check whether a site's lock is currently held.
    ///
    /// Diagnostic only; the result may be stale by the time it is read.
    pub fn is_held(&self, site: &SiteId) -> bool {
        let locks = self.locks.lock().expect("lock registry poisoned");
        locks
            .get(site)
            .map(|flag| flag.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}

/// Guard for a held site lock.
///
/// The lock is released when the guard is dropped. This ensures release on
/// every exit path, so a crashed sync attempt never permanently deadlocks
/// a site.
#[derive(Debug)]
pub struct SiteLockGuard {
    site: SiteId,
    /// When this is Some, we hold the lock.
    flag: Option<Arc<AtomicBool>>,
}

impl SiteLockGuard {
    /// The site this guard locks.
    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Release the lock explicitly.
    ///
    /// Called automatically on drop; calling it more than once is a no-op.
    pub fn release(&mut self) {
        if let Some(flag) = self.flag.take() {
            flag.store(false, Ordering::Release);
        }
    }
}

impl Drop for SiteLockGuard {
    fn drop(&mut self) {
        self.release();
    }
}
