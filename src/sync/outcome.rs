//! sync::outcome
//!
//! Per-(peer, branch) results and the aggregated sync report.
//!
//! Every step below the orchestrator returns a uniform
//! `Result<BranchOutcome, SyncError>` instead of letting error types tunnel
//! through call layers. The orchestrator never interprets underlying git
//! errors - only the tagged kind - and aggregates everything into a
//! [`SyncReport`] so a failure for one pair never aborts sibling
//! iterations.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::core::config::ConfigError;
use crate::core::types::{BranchName, ClusterMember, Oid, SiteId};
use crate::git::{GitError, MergeOutcome};
use crate::sync::providers::AuthError;

/// A failure at one step of a sync attempt.
///
/// `LockBusy` is deliberately absent: a busy site lock is a normal skip
/// signal surfaced through `RunStatus::Skipped`, not an error.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport/protocol error while fetching from a peer.
    #[error("fetch failed: {0}")]
    Fetch(#[source] GitError),

    /// Credential provisioning for a fetch failed (fetch-class failure).
    #[error("credential setup failed: {0}")]
    Credentials(#[source] AuthError),

    /// Environment branch could not be checked out (or created).
    #[error("checkout failed: {0}")]
    Checkout(#[source] GitError),

    /// Merging the peer's advertised commit failed.
    #[error("merge failed: {0}")]
    Merge(#[source] GitError),

    /// Missing or invalid configuration; fatal for the current step only.
    #[error("configuration error: {0}")]
    Config(#[source] ConfigError),

    /// The site's published repository could not be opened.
    #[error("cannot open published repository: {0}")]
    OpenRepository(#[source] GitError),
}

impl SyncError {
    /// Stable kind tag for log fields and report summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Fetch(_) => "fetch",
            SyncError::Credentials(_) => "credentials",
            SyncError::Checkout(_) => "checkout",
            SyncError::Merge(_) => "merge",
            SyncError::Config(_) => "config",
            SyncError::OpenRepository(_) => "open-repository",
        }
    }
}

/// Successful result for one (peer, branch) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// The peer has no matching branch yet; nothing to merge. Explicitly
    /// not an error.
    NoAdvertisedRef,

    /// The advertised tip was already merged; no new commit.
    AlreadyUpToDate,

    /// Local branch fast-forwarded to the advertised tip.
    FastForwarded(Oid),

    /// Merge commit created with peer content winning conflicts.
    Merged(Oid),
}

impl From<MergeOutcome> for BranchOutcome {
    fn from(outcome: MergeOutcome) -> Self {
        match outcome {
            MergeOutcome::AlreadyUpToDate => BranchOutcome::AlreadyUpToDate,
            MergeOutcome::FastForwarded(oid) => BranchOutcome::FastForwarded(oid),
            MergeOutcome::Merged(oid) => BranchOutcome::Merged(oid),
        }
    }
}

/// Result of one step of a sync attempt, with enough context to log.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Site being synchronized.
    pub site: SiteId,
    /// Remote name of the peer involved.
    pub peer: String,
    /// Environment branch, or `None` for the broad per-peer pre-fetch.
    pub branch: Option<BranchName>,
    /// What happened.
    pub result: Result<BranchOutcome, SyncError>,
}

impl SyncOutcome {
    /// Outcome for one (peer, branch) pair.
    pub fn for_branch(
        site: &SiteId,
        peer: &ClusterMember,
        branch: &BranchName,
        result: Result<BranchOutcome, SyncError>,
    ) -> Self {
        Self {
            site: site.clone(),
            peer: peer.git_remote_name.clone(),
            branch: Some(branch.clone()),
            result,
        }
    }

    /// Failure outcome for a peer's broad pre-fetch.
    pub fn prefetch_failure(site: &SiteId, peer: &ClusterMember, error: SyncError) -> Self {
        Self {
            site: site.clone(),
            peer: peer.git_remote_name.clone(),
            branch: None,
            result: Err(error),
        }
    }

    /// Whether this outcome is a failure.
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Aggregated result of one full sync attempt for a site.
///
/// The report always covers every peer × environment pair the orchestrator
/// visited; partial network failure shows up as failure outcomes, never as
/// missing entries.
#[derive(Debug)]
pub struct SyncReport {
    /// Site this attempt synchronized.
    pub site: SiteId,
    /// Correlation id for this sync run (also on all log entries).
    pub run_id: Uuid,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// When the attempt finished.
    pub finished_at: DateTime<Utc>,
    /// All recorded step outcomes, in visit order.
    pub outcomes: Vec<SyncOutcome>,
    /// Set when the attempt could not run at all (e.g., the published
    /// repository failed to open). Step outcomes are empty in that case.
    pub aborted: Option<SyncError>,
}

impl SyncReport {
    /// Start an empty report for a run.
    pub fn new(site: SiteId, run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            site,
            run_id,
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
            aborted: None,
        }
    }

    /// Record a step outcome.
    pub fn record(&mut self, outcome: SyncOutcome) {
        self.outcomes.push(outcome);
    }

    /// All failure outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// Whether the attempt ran and every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none() && self.outcomes.iter().all(|o| !o.is_failure())
    }

    /// The branch outcome recorded for a (peer, branch) pair, if any.
    pub fn branch_outcome(&self, peer: &str, branch: &BranchName) -> Option<&SyncOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.peer == peer && o.branch.as_ref() == Some(branch))
    }
}
