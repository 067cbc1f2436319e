//! sync::environments
//!
//! Publishing environment resolver.
//!
//! Computes the set of environment branches that must be kept in sync for
//! a site: always the live environment, plus staging when enabled. The set
//! is recomputed fresh on every call - configuration changes take effect
//! on the next sync cycle without any cache invalidation.

use std::collections::BTreeSet;

use crate::core::types::{BranchName, SiteId};
use crate::sync::providers::SiteConfig;

/// Resolve the environment branches to synchronize for a site.
///
/// The result is a set: if staging resolves to the same branch name as
/// live, it is synchronized once.
pub fn resolve_environments(config: &dyn SiteConfig, site: &SiteId) -> BTreeSet<BranchName> {
    let mut environments = BTreeSet::new();
    environments.insert(config.live_environment(site));
    if config.is_staging_enabled(site) {
        environments.insert(config.staging_environment(site));
    }
    environments
}
