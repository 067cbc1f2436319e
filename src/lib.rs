//! Sitesync - cluster-node synchronization for published site repositories
//!
//! Every node in a deployment cluster serves the same website content from
//! its own local git working copy. Sitesync keeps the *published* repository
//! of each site consistent across nodes: it periodically pulls changes
//! advertised by cluster peers and merges them into every active publishing
//! environment branch, preferring peer content over local divergence.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`core`] - Domain types, configuration, and the site lock registry
//! - [`git`] - Single interface for all Git operations
//! - [`sync`] - Fetch executor, branch updater, and the sync orchestrator
//!
//! # Correctness Invariants
//!
//! Sitesync maintains the following invariants:
//!
//! 1. At most one sync attempt runs per site at any instant; an overlapping
//!    attempt skips instead of queueing
//! 2. A failure for one (peer, branch) pair never aborts the remaining
//!    peer/branch iterations
//! 3. Scoped credential files are removed on every exit path
//! 4. The site lock is released on every exit path, including panics

pub mod core;
pub mod git;
pub mod sync;
