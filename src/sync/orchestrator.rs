//! sync::orchestrator
//!
//! Top-level sync driver for one site.
//!
//! For a given site the orchestrator opens the already-cloned published
//! repository, resolves the environment set, and iterates all cluster
//! peers × all environments. Every pair is always visited - there is no
//! "abort on first failure" - maximizing eventual-consistency
//! opportunities per cycle even under partial network failure.
//!
//! The orchestrator must only run while the site's lock is held; the
//! lock-bracketing lives in [`crate::sync::strategy::NodeSyncRunner`].

use uuid::Uuid;

use crate::core::config::SyncSettings;
use crate::core::types::SiteId;
use crate::git::Git;
use crate::sync::branch::update_branch;
use crate::sync::environments::resolve_environments;
use crate::sync::fetch::fetch_from_peer;
use crate::sync::outcome::{SyncError, SyncOutcome, SyncReport};
use crate::sync::providers::{
    ClusterMembership, RepoKind, RepoPathResolver, SiteConfig, TransportAuth,
};

/// Drives one full sync attempt for a site.
///
/// All collaborators are injected; the orchestrator owns no discovery or
/// scheduling. Cloning is deliberately out of scope - the published
/// repository is assumed to already exist on disk, and every invocation
/// unconditionally attempts a full sync.
pub struct SyncOrchestrator<'a> {
    cluster: &'a dyn ClusterMembership,
    site_config: &'a dyn SiteConfig,
    paths: &'a dyn RepoPathResolver,
    auth: &'a dyn TransportAuth,
    settings: &'a SyncSettings,
}

impl<'a> SyncOrchestrator<'a> {
    /// Create an orchestrator over the injected collaborators.
    pub fn new(
        cluster: &'a dyn ClusterMembership,
        site_config: &'a dyn SiteConfig,
        paths: &'a dyn RepoPathResolver,
        auth: &'a dyn TransportAuth,
        settings: &'a SyncSettings,
    ) -> Self {
        Self {
            cluster,
            site_config,
            paths,
            auth,
            settings,
        }
    }

    /// Synchronize the site's published repository from all cluster peers.
    ///
    /// Fire-and-forget from the scheduler's point of view: failures are
    /// logged and aggregated in the returned report, never thrown. Must
    /// only be invoked while the site's lock is held.
    pub fn sync_published(&self, site: &SiteId) -> SyncReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("sync_published", site = %site, run = %run_id);
        let _entered = span.enter();

        let mut report = SyncReport::new(site.clone(), run_id);

        let repo_path = self.paths.repo_path(site, RepoKind::Published);
        let git = match Git::open(&repo_path) {
            Ok(git) => git,
            Err(e) => {
                tracing::error!(
                    site = %site,
                    path = %repo_path.display(),
                    error = %e,
                    "cannot open published repository"
                );
                report.aborted = Some(SyncError::OpenRepository(e));
                report.finished_at = chrono::Utc::now();
                return report;
            }
        };

        let environments = resolve_environments(self.site_config, site);
        tracing::debug!(
            site = %site,
            environments = ?environments,
            "updating published repository from all active cluster peers"
        );

        for peer in self.cluster.members() {
            // Broad pre-fetch of the peer's remote. Best effort: on failure
            // the branch updates below are still attempted, since
            // remote-tracking refs may already be cached from a prior cycle.
            if let Err(e) = fetch_from_peer(&git, &peer, self.auth) {
                tracing::error!(
                    site = %site,
                    peer = %peer.git_remote_name,
                    kind = e.kind(),
                    error = %e,
                    "pre-fetch from cluster peer failed"
                );
                report.record(SyncOutcome::prefetch_failure(site, &peer, e));
            }

            for branch in &environments {
                let result = update_branch(&git, site, &peer, branch, self.auth, self.settings);

                if let Err(e) = &result {
                    tracing::error!(
                        site = %site,
                        peer = %peer.git_remote_name,
                        branch = %branch,
                        kind = e.kind(),
                        error = %e,
                        "environment branch update failed"
                    );
                }

                report.record(SyncOutcome::for_branch(site, &peer, branch, result));
            }
        }

        report.finished_at = chrono::Utc::now();
        tracing::info!(
            site = %site,
            steps = report.outcomes.len(),
            failures = report.failures().count(),
            "sync attempt finished"
        );
        report
    }
}
