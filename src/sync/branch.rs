//! sync::branch
//!
//! Branch updater: brings one local environment branch up to date with one
//! cluster peer.
//!
//! # State machine per (peer, branch)
//!
//! 1. Local branch lookup - absent means the branch must be created
//! 2. Checkout (creating from `<remote>/<branch>` when absent)
//! 3. Fetch from the peer (independent of the broad pre-fetch) to obtain
//!    the currently advertised tip
//! 4. Advertised ref lookup; no matching ref means nothing to merge
//! 5. Merge the advertised commit with "theirs" resolution, committing
//!    with the configured message
//!
//! Any step failure is returned as a tagged [`SyncError`]; the caller logs
//! it and continues with the remaining branches and peers.

use crate::core::config::SyncSettings;
use crate::core::types::{BranchName, ClusterMember, SiteId};
use crate::git::Git;
use crate::sync::fetch::fetch_from_peer;
use crate::sync::outcome::{BranchOutcome, SyncError};
use crate::sync::providers::TransportAuth;

/// Update one environment branch from one peer.
///
/// The repository's HEAD is left on the environment branch. Failures never
/// escape as panics or untyped errors; the credential file used by the
/// inner fetch is removed on every exit path.
pub fn update_branch(
    git: &Git,
    site: &SiteId,
    peer: &ClusterMember,
    branch: &BranchName,
    auth: &dyn TransportAuth,
    settings: &SyncSettings,
) -> Result<BranchOutcome, SyncError> {
    let create = !git.branch_exists(branch);

    tracing::debug!(
        site = %site,
        peer = %peer.git_remote_name,
        branch = %branch,
        create,
        "checking out environment branch"
    );

    if create {
        git.checkout_new_branch(branch, &peer.git_remote_name)
    } else {
        git.checkout_branch(branch)
    }
    .map_err(SyncError::Checkout)?;

    let summary = fetch_from_peer(git, peer, auth)?;

    let Some(tip) = summary.advertised_tip(branch) else {
        // The peer has no matching branch yet. Not an error.
        tracing::debug!(
            site = %site,
            peer = %peer.git_remote_name,
            branch = %branch,
            "peer advertises no matching branch; nothing to merge"
        );
        return Ok(BranchOutcome::NoAdvertisedRef);
    };

    let message = settings.merge_commit_message().map_err(SyncError::Config)?;

    let outcome = git
        .merge_theirs(tip, message)
        .map_err(SyncError::Merge)?
        .into();

    tracing::debug!(
        site = %site,
        peer = %peer.git_remote_name,
        branch = %branch,
        tip = %tip,
        outcome = ?outcome,
        "environment branch updated"
    );

    Ok(outcome)
}
