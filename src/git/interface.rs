//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! Sitesync. All repository interactions flow through this interface, which
//! provides structured results and normalizes errors into typed failure
//! categories.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::RemoteNotFound`]: Peer remote is not configured locally
//! - [`GitError::MergeUnresolved`]: Merge left conflicts the "theirs"
//!   resolution could not settle
//!
//! # Example
//!
//! ```ignore
//! use sitesync::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/var/sites/corporate/published"))?;
//! let summary = git.fetch_remote("node-2", key_path)?;
//! if let Some(tip) = summary.advertised_tip(&branch) {
//!     git.merge_theirs(tip, "Sync published content from cluster peer")?;
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
///
/// The categorization lets the sync layer convert failures into per-step
/// outcome kinds (fetch, checkout, merge) without inspecting git2 errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    ///
    /// Published repositories carry the served content in their working
    /// tree, so a bare repository is always a misconfiguration.
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// The peer's remote is not configured on the local repository.
    #[error("remote not found: {remote}")]
    RemoteNotFound {
        /// The remote name that was not found
        remote: String,
    },

    /// HEAD is detached; environment branches must be checked out to merge.
    #[error("repository HEAD is not on a branch")]
    DetachedHead,

    /// Merge left unresolved conflicts even under "theirs" resolution.
    ///
    /// This covers structural conflicts (e.g., file/directory collisions)
    /// that content-level resolution cannot settle. The merge is abandoned
    /// before this is returned: index and working tree are restored to
    /// HEAD, so later operations on the repository are unaffected.
    #[error("merge left unresolved conflicts: {details}")]
    MergeUnresolved {
        /// Description of the unresolved state
        details: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound if context.starts_with("refs/") || context == "HEAD" => {
                GitError::RefNotFound {
                    refname: context.to_string(),
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            other => GitError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// A ref advertised by a peer during a fetch, before any local merge.
#[derive(Debug, Clone)]
pub struct AdvertisedRef {
    /// The ref name as advertised (usually heads-namespaced).
    pub name: String,
    /// The commit the peer advertises for this ref.
    pub oid: Oid,
}

/// Result of a fetch from one peer's remote.
///
/// Carries the refs the peer advertised at connection time. Local
/// remote-tracking refs have already been updated as a side effect.
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    /// Refs advertised by the peer.
    pub advertised: Vec<AdvertisedRef>,
}

impl FetchSummary {
    /// Look up the tip the peer advertises for a branch.
    ///
    /// The lookup tries the bare branch name first, then the full
    /// heads-namespaced name. `None` means the peer has no matching branch
    /// yet, which is not an error - there is simply nothing to merge.
    pub fn advertised_tip(&self, branch: &BranchName) -> Option<&Oid> {
        let bare = branch.as_str();
        let namespaced = branch.local_ref();
        self.advertised
            .iter()
            .find(|r| r.name == bare)
            .or_else(|| self.advertised.iter().find(|r| r.name == namespaced))
            .map(|r| &r.oid)
    }
}

/// Outcome of merging an advertised peer commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The advertised tip is already contained in the local branch; no
    /// commit was created. Repeated syncs with no new peer commits land
    /// here, keeping sync idempotent.
    AlreadyUpToDate,

    /// The local branch was fast-forwarded to the advertised tip.
    FastForwarded(Oid),

    /// A merge commit was created with peer content winning conflicts.
    Merged(Oid),
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. All repository
/// reads and writes flow through this interface. No other module should
/// import `git2` directly.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open the repository at the given path.
    ///
    /// Uses `git2::Repository::discover` so `path` can be the working tree
    /// root or any directory within it. Sitesync never clones; the
    /// repository is assumed to already exist on disk.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Get the path to the .git directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a ref to its target commit OID, returning `None` if the ref
    /// does not exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.repo.find_reference(refname) {
            Ok(reference) => {
                let oid = reference
                    .peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, refname))?
                    .id();
                Ok(Some(Oid::new(oid.to_string())?))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// Get HEAD commit OID.
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let oid = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();
        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Get the current branch name, if HEAD is on a branch.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None)
    }

    /// Check if a local branch exists (`refs/heads/<name>`).
    pub fn branch_exists(&self, branch: &BranchName) -> bool {
        self.repo.find_reference(&branch.local_ref()).is_ok()
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Check out an existing local branch.
    pub fn checkout_branch(&self, branch: &BranchName) -> Result<(), GitError> {
        let refname = branch.local_ref();
        let target = self
            .repo
            .revparse_single(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;

        let mut opts = git2::build::CheckoutBuilder::new();
        self.repo
            .checkout_tree(&target, Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, &refname))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;

        Ok(())
    }

    /// Create a local branch starting at a peer's remote-tracking tip and
    /// check it out.
    ///
    /// Used the first time an environment branch is seen on this node: the
    /// branch starts at `refs/remotes/<remote>/<branch>`.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the remote-tracking ref does not
    ///   exist locally (the peer has never been fetched successfully)
    pub fn checkout_new_branch(&self, branch: &BranchName, remote: &str) -> Result<(), GitError> {
        let start_ref = branch.remote_tracking_ref(remote);
        let start = self
            .repo
            .find_reference(&start_ref)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, &start_ref))?;

        self.repo
            .branch(branch.as_str(), &start, false)
            .map_err(|e| GitError::from_git2(e, branch.as_str()))?;

        self.checkout_branch(branch)
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Fetch from a peer's remote, capturing the refs it advertises.
    ///
    /// `key_path` points at the scoped credential file for this single
    /// fetch; it is provisioned by the transport configurator before this
    /// call and removed by the caller afterwards on every path. Transports
    /// that do not negotiate credentials (e.g., local path remotes) never
    /// consult it.
    ///
    /// Side effect: local remote-tracking refs for this remote are updated
    /// using the remote's configured fetch refspecs.
    pub fn fetch_remote(
        &self,
        remote_name: &str,
        key_path: &Path,
    ) -> Result<FetchSummary, GitError> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::RemoteNotFound {
                    remote: remote_name.to_string(),
                }
            } else {
                GitError::from_git2(e, remote_name)
            }
        })?;

        // Capture the peer's advertised refs at connection time, mirroring
        // what the peer reports before any local merge decision is made.
        let advertised = {
            let connection = remote
                .connect_auth(
                    git2::Direction::Fetch,
                    Some(Self::auth_callbacks(key_path)),
                    None,
                )
                .map_err(|e| GitError::from_git2(e, "fetch connect"))?;

            let mut advertised = Vec::new();
            for head in connection
                .list()
                .map_err(|e| GitError::from_git2(e, "fetch list"))?
            {
                if let Ok(oid) = Oid::new(head.oid().to_string()) {
                    advertised.push(AdvertisedRef {
                        name: head.name().to_string(),
                        oid,
                    });
                }
            }
            advertised
            // connection drops here, disconnecting
        };

        let mut opts = git2::FetchOptions::new();
        opts.remote_callbacks(Self::auth_callbacks(key_path));
        remote
            .fetch(&[] as &[&str], Some(&mut opts), None)
            .map_err(|e| GitError::from_git2(e, "fetch"))?;

        Ok(FetchSummary { advertised })
    }

    /// Remote callbacks that authenticate with the scoped key file.
    ///
    /// Falls back to default credentials for transports that do not use
    /// ssh keys.
    fn auth_callbacks(key_path: &Path) -> git2::RemoteCallbacks<'_> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed| {
            if allowed.is_ssh_key() {
                return git2::Cred::ssh_key(
                    username_from_url.unwrap_or("git"),
                    None,
                    key_path,
                    None,
                );
            }
            git2::Cred::default()
        });
        callbacks
    }

    // =========================================================================
    // Merge
    // =========================================================================

    /// Merge an advertised peer commit into the checked-out branch.
    ///
    /// Conflicts are resolved in favor of the incoming peer content
    /// ("theirs"): published content is expected to be reconstructable from
    /// any upstream source of truth, so peer content is authoritative over
    /// whatever is locally stale. The merge commits automatically with the
    /// given message.
    ///
    /// An already-merged tip is a no-op, so repeated syncs with no new
    /// peer commits create no additional history.
    pub fn merge_theirs(&self, theirs: &Oid, message: &str) -> Result<MergeOutcome, GitError> {
        let their_oid = git2::Oid::from_str(theirs.as_str())
            .map_err(|e| GitError::from_git2(e, theirs.as_str()))?;
        let annotated = self
            .repo
            .find_annotated_commit(their_oid)
            .map_err(|e| GitError::from_git2(e, theirs.as_str()))?;

        let (analysis, _preference) = self
            .repo
            .merge_analysis(&[&annotated])
            .map_err(|e| GitError::from_git2(e, "merge analysis"))?;

        if analysis.is_up_to_date() {
            return Ok(MergeOutcome::AlreadyUpToDate);
        }

        if analysis.is_unborn() || analysis.is_fast_forward() {
            return self.fast_forward(their_oid, theirs, message);
        }

        self.merge_commit(&annotated, their_oid, theirs, message)
    }

    /// Advance the current branch ref to the peer tip and refresh the
    /// working tree.
    fn fast_forward(
        &self,
        their_oid: git2::Oid,
        theirs: &Oid,
        message: &str,
    ) -> Result<MergeOutcome, GitError> {
        let refname = self.head_refname()?;
        self.repo
            .reference(&refname, their_oid, true, message)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;

        let mut opts = git2::build::CheckoutBuilder::new();
        opts.force();
        self.repo
            .checkout_head(Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, &refname))?;

        Ok(MergeOutcome::FastForwarded(theirs.clone()))
    }

    /// Perform a true merge with "theirs" content resolution and commit it.
    fn merge_commit(
        &self,
        annotated: &git2::AnnotatedCommit<'_>,
        their_oid: git2::Oid,
        theirs: &Oid,
        message: &str,
    ) -> Result<MergeOutcome, GitError> {
        let mut merge_opts = git2::MergeOptions::new();
        merge_opts.file_favor(git2::FileFavor::Theirs);

        let mut checkout_opts = git2::build::CheckoutBuilder::new();
        checkout_opts.allow_conflicts(true).force();

        self.repo
            .merge(&[annotated], Some(&mut merge_opts), Some(&mut checkout_opts))
            .map_err(|e| GitError::from_git2(e, "merge"))?;

        let mut index = self
            .repo
            .index()
            .map_err(|e| GitError::from_git2(e, "index"))?;

        // Content conflicts are settled by the file favor; anything left is
        // structural and cannot be auto-resolved. Abandon the merge and
        // restore index and working tree to HEAD; a conflicted index would
        // otherwise fail every later checkout on this repository.
        if index.has_conflicts() {
            self.abort_merge()?;
            return Err(GitError::MergeUnresolved {
                details: format!("merging {}", theirs.short(12)),
            });
        }

        let tree_oid = index
            .write_tree()
            .map_err(|e| GitError::from_git2(e, "write merge tree"))?;
        let tree = self
            .repo
            .find_tree(tree_oid)
            .map_err(|e| GitError::from_git2(e, "find merge tree"))?;

        let signature = self.signature()?;
        let head_commit = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        let their_commit = self
            .repo
            .find_commit(their_oid)
            .map_err(|e| GitError::from_git2(e, theirs.as_str()))?;

        let merge_oid = self
            .repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &[&head_commit, &their_commit],
            )
            .map_err(|e| GitError::from_git2(e, "merge commit"))?;

        self.repo
            .cleanup_state()
            .map_err(|e| GitError::from_git2(e, "cleanup merge state"))?;

        let mut opts = git2::build::CheckoutBuilder::new();
        opts.force();
        self.repo
            .checkout_head(Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, "checkout merge result"))?;

        Ok(MergeOutcome::Merged(Oid::new(merge_oid.to_string())?))
    }

    /// Abandon an in-progress merge, restoring index and working tree to
    /// HEAD.
    fn abort_merge(&self) -> Result<(), GitError> {
        let head_commit = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        self.repo
            .reset(head_commit.as_object(), git2::ResetType::Hard, None)
            .map_err(|e| GitError::from_git2(e, "abort merge"))?;
        self.repo
            .cleanup_state()
            .map_err(|e| GitError::from_git2(e, "cleanup merge state"))?;
        Ok(())
    }

    /// Full ref name HEAD points at; merging requires being on a branch.
    fn head_refname(&self) -> Result<String, GitError> {
        let head = self
            .repo
            .find_reference("HEAD")
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        head.symbolic_target()
            .map(String::from)
            .ok_or(GitError::DetachedHead)
    }

    /// Committer identity for sync merge commits.
    ///
    /// Uses the repository configuration when present, otherwise a fixed
    /// node identity so background syncs work on unconfigured nodes.
    fn signature(&self) -> Result<git2::Signature<'static>, GitError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => git2::Signature::now("sitesync", "sitesync@cluster.local")
                .map_err(|e| GitError::from_git2(e, "signature")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn display_formatting() {
            let err = GitError::RemoteNotFound {
                remote: "node-2".to_string(),
            };
            assert!(err.to_string().contains("node-2"));

            let err = GitError::MergeUnresolved {
                details: "merging abc123".to_string(),
            };
            assert!(err.to_string().contains("unresolved"));
        }

        #[test]
        fn type_errors_convert() {
            let err: GitError = TypeError::InvalidOid("xyz".into()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
        }
    }

    mod fetch_summary {
        use super::*;

        fn oid(fill: char) -> Oid {
            Oid::new(fill.to_string().repeat(40)).unwrap()
        }

        #[test]
        fn prefers_bare_name() {
            let summary = FetchSummary {
                advertised: vec![
                    AdvertisedRef {
                        name: "refs/heads/live".to_string(),
                        oid: oid('a'),
                    },
                    AdvertisedRef {
                        name: "live".to_string(),
                        oid: oid('b'),
                    },
                ],
            };
            let branch = BranchName::new("live").unwrap();
            assert_eq!(summary.advertised_tip(&branch), Some(&oid('b')));
        }

        #[test]
        fn falls_back_to_heads_namespace() {
            let summary = FetchSummary {
                advertised: vec![AdvertisedRef {
                    name: "refs/heads/live".to_string(),
                    oid: oid('a'),
                }],
            };
            let branch = BranchName::new("live").unwrap();
            assert_eq!(summary.advertised_tip(&branch), Some(&oid('a')));
        }

        #[test]
        fn missing_branch_is_none() {
            let summary = FetchSummary {
                advertised: vec![AdvertisedRef {
                    name: "refs/heads/staging".to_string(),
                    oid: oid('a'),
                }],
            };
            let branch = BranchName::new("live").unwrap();
            assert_eq!(summary.advertised_tip(&branch), None);
        }

        #[test]
        fn empty_summary_is_none() {
            let summary = FetchSummary::default();
            let branch = BranchName::new("live").unwrap();
            assert_eq!(summary.advertised_tip(&branch), None);
        }
    }
}
