//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and
//! writes flow through this interface; no other module imports `git2`.
//! We use the `git2` crate exclusively (no shelling out to the git CLI).
//!
//! # Responsibilities
//!
//! - Opening the already-cloned published repository (never cloning)
//! - Local environment branch existence, creation, and checkout
//! - Fetching from a cluster peer's remote with scoped ssh-key auth,
//!   capturing the peer's advertised refs
//! - Merging an advertised peer commit with "theirs" conflict resolution
//!
//! # Invariants
//!
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, BranchName)
//! - Merge commits are created with the configured message and never left
//!   in an in-progress merge state

mod interface;

pub use interface::{AdvertisedRef, FetchSummary, Git, GitError, MergeOutcome};
