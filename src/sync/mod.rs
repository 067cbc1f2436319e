//! sync
//!
//! The cluster synchronization core.
//!
//! # Modules
//!
//! - [`providers`] - Consumed-capability traits (membership, site config,
//!   repository paths, transport auth)
//! - [`environments`] - Publishing environment resolver
//! - [`outcome`] - Per-(peer, branch) results and the aggregated report
//! - [`fetch`] - Remote fetch executor with scoped credential files
//! - [`branch`] - Branch updater state machine
//! - [`orchestrator`] - Top-level sync driver
//! - [`strategy`] - Repository sync strategy family and the lock-bracketing
//!   runner
//!
//! # Control Flow
//!
//! `NodeSyncRunner` (lock bracketing) → `SyncOrchestrator` → per peer:
//! broad pre-fetch, then per environment branch: checkout → fetch → merge.
//! No step depends on the outcome of a sibling peer/branch iteration;
//! failures are aggregated into the [`outcome::SyncReport`], never thrown.

pub mod branch;
pub mod environments;
pub mod fetch;
pub mod orchestrator;
pub mod outcome;
pub mod providers;
pub mod strategy;

pub use environments::resolve_environments;
pub use orchestrator::SyncOrchestrator;
pub use outcome::{BranchOutcome, SyncError, SyncOutcome, SyncReport};
pub use strategy::{NodeSyncRunner, PublishedSync, RepositorySyncStrategy, RunStatus};
