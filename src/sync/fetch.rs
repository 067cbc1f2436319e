//! sync::fetch
//!
//! Remote fetch executor.
//!
//! Performs one network fetch from a cluster peer using a scoped,
//! single-use credential file. The file is created immediately before the
//! fetch, handed to the transport configurator for provisioning, and
//! removed when it drops - on the success path and on every failure path
//! alike. Credential files are never shared across calls or threads.

use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::core::types::ClusterMember;
use crate::git::{FetchSummary, Git};
use crate::sync::outcome::SyncError;
use crate::sync::providers::{AuthError, TransportAuth};

/// Fetch from one peer's remote.
///
/// Side effect: local remote-tracking refs for the peer's remote are
/// updated. The returned summary carries the refs the peer advertised.
///
/// # Errors
///
/// - [`SyncError::Credentials`] if the scoped key file cannot be created
///   or provisioned
/// - [`SyncError::Fetch`] on transport/protocol failure
pub fn fetch_from_peer(
    git: &Git,
    peer: &ClusterMember,
    auth: &dyn TransportAuth,
) -> Result<FetchSummary, SyncError> {
    let key = scoped_key_file().map_err(SyncError::Credentials)?;
    auth.provision(peer, key.path())
        .map_err(SyncError::Credentials)?;

    tracing::debug!(
        peer = %peer.git_remote_name,
        address = %peer.address,
        "fetching from cluster peer"
    );

    git.fetch_remote(&peer.git_remote_name, key.path())
        .map_err(SyncError::Fetch)
    // `key` drops here, deleting the credential file on every path
}

/// Create the single-fetch-lifetime credential file.
fn scoped_key_file() -> Result<NamedTempFile, AuthError> {
    let prefix = format!("sitesync-{}-", Uuid::new_v4());
    let file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".key")
        .tempfile()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn scoped_key_files_are_unique_and_removed() {
        let first: PathBuf;
        {
            let key = scoped_key_file().unwrap();
            first = key.path().to_path_buf();
            assert!(first.exists());

            let second = scoped_key_file().unwrap();
            assert_ne!(key.path(), second.path());
        }
        assert!(!first.exists());
    }
}
