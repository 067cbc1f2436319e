//! core
//!
//! Core domain types, configuration, and locking for Sitesync.
//!
//! # Modules
//!
//! - [`types`] - Strong types: SiteId, BranchName, Oid, ClusterMember
//! - [`config`] - Sync settings schema and loading
//! - [`lock`] - Per-site mutual-exclusion lock registry
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Configuration is strict and validated after parsing
//! - Locks are released structurally (RAII), never by manual bookkeeping

pub mod config;
pub mod lock;
pub mod types;
