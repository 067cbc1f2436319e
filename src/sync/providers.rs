//! sync::providers
//!
//! Consumed-capability traits.
//!
//! The sync core does not discover cluster membership, site configuration,
//! repository locations, or credential material itself. Collaborators
//! supply those through the traits here; the core treats them as read-only
//! lookups. Tests and embedders inject their own implementations.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, ClusterMember, SiteId};

/// Which on-disk repository of a site an operation targets.
///
/// The sync core only ever mutates the published repository; `Sandbox`
/// exists for strategies that manage the authoring repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoKind {
    /// Repository holding content actually served to visitors.
    Published,
    /// Authoring repository (cloned and managed elsewhere).
    Sandbox,
}

impl std::fmt::Display for RepoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoKind::Published => write!(f, "published"),
            RepoKind::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// Provides the current set of cluster peers for this node.
///
/// The collection is re-read every sync cycle so membership changes take
/// effect on the next cycle. Enumeration order is the iteration order used
/// by the orchestrator.
pub trait ClusterMembership: Send + Sync {
    /// The peers of this node.
    fn members(&self) -> Vec<ClusterMember>;
}

/// Fixed peer list, for deployments with static topology and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCluster(pub Vec<ClusterMember>);

impl ClusterMembership for StaticCluster {
    fn members(&self) -> Vec<ClusterMember> {
        self.0.clone()
    }
}

/// Read-only per-site publishing configuration.
pub trait SiteConfig: Send + Sync {
    /// Branch name of the live publishing environment.
    fn live_environment(&self, site: &SiteId) -> BranchName;

    /// Whether the staging environment is enabled for this site.
    fn is_staging_enabled(&self, site: &SiteId) -> bool;

    /// Branch name of the staging publishing environment.
    fn staging_environment(&self, site: &SiteId) -> BranchName;
}

/// Resolves the filesystem location of a site's repositories.
pub trait RepoPathResolver: Send + Sync {
    /// Path to the working tree root of the given repository.
    fn repo_path(&self, site: &SiteId, kind: RepoKind) -> PathBuf;
}

/// Conventional `<root>/<site>/<kind>` directory layout.
#[derive(Debug, Clone)]
pub struct DirLayout {
    /// Root directory under which all site repositories live.
    pub root: PathBuf,
}

impl RepoPathResolver for DirLayout {
    fn repo_path(&self, site: &SiteId, kind: RepoKind) -> PathBuf {
        self.root.join(site.as_str()).join(kind.to_string())
    }
}

/// Errors from transport credential provisioning.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The scoped credential file could not be created or written.
    #[error("cannot prepare credential file: {0}")]
    Io(#[from] std::io::Error),

    /// No credential material is available for the peer.
    #[error("credential material unavailable for peer {peer}: {reason}")]
    Unavailable {
        /// Remote name of the peer
        peer: String,
        /// Why the material is unavailable
        reason: String,
    },
}

/// Decorates a fetch with authentication material.
///
/// Given a peer and the path of a scoped temp file, an implementation
/// writes whatever key material the transport needs into that file. The
/// file lives for exactly one fetch call and is removed afterwards on both
/// success and failure paths, so implementations never manage cleanup.
///
/// `provision` must be idempotent and safe to call repeatedly for the same
/// peer.
pub trait TransportAuth: Send + Sync {
    /// Write credential material for `peer` into `key_path`.
    fn provision(&self, peer: &ClusterMember, key_path: &Path) -> Result<(), AuthError>;
}

/// Transport auth for clusters whose remotes need no credentials
/// (local-path or otherwise pre-authenticated remotes).
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousTransport;

impl TransportAuth for AnonymousTransport {
    fn provision(&self, _peer: &ClusterMember, _key_path: &Path) -> Result<(), AuthError> {
        Ok(())
    }
}
