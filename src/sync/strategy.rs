//! sync::strategy
//!
//! Repository sync strategy family and the lock-bracketing runner.
//!
//! Different repository types synchronize differently: the published
//! repository merges peer content, the sandbox repository clones and
//! tracks authoring state elsewhere. [`RepositorySyncStrategy`] captures
//! that capability set; [`NodeSyncRunner`] composes a strategy with the
//! site lock registry so every strategy gets the same mutual-exclusion and
//! skip-when-busy behavior.

use crate::core::lock::SiteLockRegistry;
use crate::core::types::SiteId;
use crate::sync::orchestrator::SyncOrchestrator;
use crate::sync::outcome::SyncReport;
use crate::sync::providers::RepoKind;

/// Capability set of one repository type's synchronization.
pub trait RepositorySyncStrategy {
    /// Which repository this strategy manages.
    fn repo_kind(&self) -> RepoKind;

    /// Whether a sync is needed for the site this tick.
    fn is_sync_required(&self, site: &SiteId) -> bool;

    /// Create site-level state if this strategy owns provisioning.
    /// Returns `true` when the strategy created anything.
    fn create_site(&self, site: &SiteId) -> bool;

    /// Ensure the local repository exists, cloning if this strategy owns
    /// cloning. Returns `true` when the repository is available.
    fn clone_site(&self, site: &SiteId) -> bool;

    /// Run the actual content synchronization. Only invoked while the
    /// site's lock is held.
    fn update_content(&self, site: &SiteId) -> SyncReport;
}

/// Sync strategy for the published repository.
pub struct PublishedSync<'a> {
    orchestrator: SyncOrchestrator<'a>,
}

impl<'a> PublishedSync<'a> {
    /// Wrap an orchestrator as the published-repository strategy.
    pub fn new(orchestrator: SyncOrchestrator<'a>) -> Self {
        Self { orchestrator }
    }
}

impl RepositorySyncStrategy for PublishedSync<'_> {
    fn repo_kind(&self) -> RepoKind {
        RepoKind::Published
    }

    // We always sync published since we're not tracking where each node is.
    // TODO: sync only from peers that are ahead of this node.
    fn is_sync_required(&self, _site: &SiteId) -> bool {
        true
    }

    fn create_site(&self, _site: &SiteId) -> bool {
        false
    }

    // Published never clones; the sandbox process handles that.
    fn clone_site(&self, _site: &SiteId) -> bool {
        true
    }

    fn update_content(&self, site: &SiteId) -> SyncReport {
        self.orchestrator.sync_published(site)
    }
}

/// How a scheduled sync attempt ended.
#[derive(Debug)]
pub enum RunStatus {
    /// Another attempt holds the site lock; this one skipped immediately.
    Skipped,

    /// The strategy reported no sync needed this tick.
    NotRequired,

    /// The local repository is not available and this strategy does not
    /// clone it.
    RepositoryUnavailable,

    /// The attempt ran; see the report for per-step outcomes.
    Completed(SyncReport),
}

/// Bracket strategy runs with the per-site lock.
///
/// The lock guard is held for the duration of one full attempt and
/// released on every exit path, including panics, so a crashed attempt
/// never permanently deadlocks a site. A busy lock results in an immediate
/// skip - attempts never queue.
pub struct NodeSyncRunner<'a, S> {
    locks: &'a SiteLockRegistry,
    strategy: S,
}

impl<'a, S: RepositorySyncStrategy> NodeSyncRunner<'a, S> {
    /// Create a runner over a lock registry and a strategy.
    pub fn new(locks: &'a SiteLockRegistry, strategy: S) -> Self {
        Self { locks, strategy }
    }

    /// Run one sync attempt for a site.
    pub fn run(&self, site: &SiteId) -> RunStatus {
        let Some(_guard) = self.locks.try_acquire(site) else {
            tracing::debug!(site = %site, "sync already in progress; skipping");
            return RunStatus::Skipped;
        };

        if !self.strategy.clone_site(site) {
            tracing::warn!(
                site = %site,
                repo = %self.strategy.repo_kind(),
                "local repository unavailable"
            );
            return RunStatus::RepositoryUnavailable;
        }

        if !self.strategy.is_sync_required(site) {
            return RunStatus::NotRequired;
        }

        RunStatus::Completed(self.strategy.update_content(site))
        // _guard drops here, releasing the site lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Strategy stub that records invocations.
    struct Recording {
        required: bool,
        available: bool,
        ran: std::cell::Cell<bool>,
    }

    impl Recording {
        fn new(required: bool, available: bool) -> Self {
            Self {
                required,
                available,
                ran: std::cell::Cell::new(false),
            }
        }
    }

    impl RepositorySyncStrategy for Recording {
        fn repo_kind(&self) -> RepoKind {
            RepoKind::Published
        }

        fn is_sync_required(&self, _site: &SiteId) -> bool {
            self.required
        }

        fn create_site(&self, _site: &SiteId) -> bool {
            false
        }

        fn clone_site(&self, _site: &SiteId) -> bool {
            self.available
        }

        fn update_content(&self, site: &SiteId) -> SyncReport {
            self.ran.set(true);
            SyncReport::new(site.clone(), Uuid::new_v4())
        }
    }

    fn site() -> SiteId {
        SiteId::new("s1").unwrap()
    }

    #[test]
    fn runs_when_lock_is_free() {
        let locks = SiteLockRegistry::new();
        let runner = NodeSyncRunner::new(&locks, Recording::new(true, true));

        let status = runner.run(&site());
        assert!(matches!(status, RunStatus::Completed(_)));
        assert!(runner.strategy.ran.get());
        // Lock released after the run.
        assert!(!locks.is_held(&site()));
    }

    #[test]
    fn skips_when_lock_is_busy() {
        let locks = SiteLockRegistry::new();
        let _held = locks.try_acquire(&site()).unwrap();
        let runner = NodeSyncRunner::new(&locks, Recording::new(true, true));

        let status = runner.run(&site());
        assert!(matches!(status, RunStatus::Skipped));
        assert!(!runner.strategy.ran.get());
    }

    #[test]
    fn not_required_releases_lock_without_running() {
        let locks = SiteLockRegistry::new();
        let runner = NodeSyncRunner::new(&locks, Recording::new(false, true));

        let status = runner.run(&site());
        assert!(matches!(status, RunStatus::NotRequired));
        assert!(!runner.strategy.ran.get());
        assert!(!locks.is_held(&site()));
    }

    #[test]
    fn unavailable_repository_releases_lock() {
        let locks = SiteLockRegistry::new();
        let runner = NodeSyncRunner::new(&locks, Recording::new(true, false));

        let status = runner.run(&site());
        assert!(matches!(status, RunStatus::RepositoryUnavailable));
        assert!(!locks.is_held(&site()));
    }

    #[test]
    fn lock_released_even_when_strategy_panics() {
        struct Panicking;
        impl RepositorySyncStrategy for Panicking {
            fn repo_kind(&self) -> RepoKind {
                RepoKind::Published
            }
            fn is_sync_required(&self, _site: &SiteId) -> bool {
                true
            }
            fn create_site(&self, _site: &SiteId) -> bool {
                false
            }
            fn clone_site(&self, _site: &SiteId) -> bool {
                true
            }
            fn update_content(&self, _site: &SiteId) -> SyncReport {
                panic!("boom");
            }
        }

        let locks = SiteLockRegistry::new();
        let runner = NodeSyncRunner::new(&locks, Panicking);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            runner.run(&site());
        }));
        assert!(result.is_err());
        assert!(!locks.is_held(&site()));
        assert!(locks.try_acquire(&site()).is_some());
    }
}
