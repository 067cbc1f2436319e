//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`SiteId`] - Identifier of a logical website/tenant
//! - [`BranchName`] - Validated Git branch name (publishing environment)
//! - [`Oid`] - Git object identifier (SHA)
//! - [`ClusterMember`] - A peer node reachable as a git remote
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use sitesync::core::types::{BranchName, Oid, SiteId};
//!
//! let site = SiteId::new("marketing-site").unwrap();
//! let branch = BranchName::new("live").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//!
//! assert!(SiteId::new("").is_err());
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid site id: {0}")]
    InvalidSiteId(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid remote name: {0}")]
    InvalidRemoteName(String),
}

/// Identifier of a logical website/tenant.
///
/// Each site owns exactly one on-disk published repository. Site ids are
/// used as keys for per-site locks and as path components by the repository
/// path resolver, so they must not contain path separators or control
/// characters.
///
/// # Example
///
/// ```
/// use sitesync::core::types::SiteId;
///
/// let site = SiteId::new("corporate").unwrap();
/// assert_eq!(site.as_str(), "corporate");
///
/// assert!(SiteId::new("").is_err());
/// assert!(SiteId::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteId(String);

impl SiteId {
    /// Create a new validated site id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSiteId` if the id is empty or contains
    /// path separators or control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidSiteId("site id cannot be empty".into()));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(TypeError::InvalidSiteId(
                "site id cannot contain path separators".into(),
            ));
        }
        if id.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidSiteId(
                "site id cannot contain control characters".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the site id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SiteId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SiteId> for String {
    fn from(id: SiteId) -> Self {
        id.0
    }
}

impl AsRef<str> for SiteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git branch name, used for publishing environment branches.
///
/// Branch names must conform to Git's refname rules (see
/// `git check-ref-format`):
/// - Cannot be empty, `@`, or start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, spaces, or ASCII control characters
/// - Cannot contain `~`, `^`, `:`, `\`, `?`, `*`, `[`
///
/// # Example
///
/// ```
/// use sitesync::core::types::BranchName;
///
/// let live = BranchName::new("live").unwrap();
/// assert_eq!(live.as_str(), "live");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("bad..name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's
    /// refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }
        if name == "@" {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be '@' (reserved)".into(),
            ));
        }
        if name.starts_with('.') || name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '.' or '-'".into(),
            ));
        }
        if name.ends_with(".lock") || name.ends_with('/') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '.lock' or '/'".into(),
            ));
        }
        for bad in ["..", "@{", "//"] {
            if name.contains(bad) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{bad}'"
                )));
            }
        }
        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{c}'"
                )));
            }
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain control characters".into(),
            ));
        }
        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full local ref name for this branch (`refs/heads/<name>`).
    pub fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.0)
    }

    /// The remote-tracking ref name for this branch on the given remote
    /// (`refs/remotes/<remote>/<name>`).
    pub fn remote_tracking_ref(&self, remote: &str) -> String {
        format!("refs/remotes/{}/{}", remote, self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use sitesync::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// The OID is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40- or
    /// 64-character hex string.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "object id must be 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get the OID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A peer node in the deployment cluster.
///
/// Each peer is reachable as a git remote on the local published
/// repository. The remote name identifies the peer in refspecs and
/// remote-tracking refs; the address is informational (used for logging
/// and by transport configurators).
///
/// Cluster membership is supplied by an external provider and is
/// read-only to the sync core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    /// Git remote name used to address this peer (e.g., "node-2").
    pub git_remote_name: String,
    /// Network address of the peer (host or URL), for logging and auth.
    pub address: String,
}

impl ClusterMember {
    /// Create a cluster member record.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRemoteName` if the remote name is empty
    /// or contains whitespace.
    pub fn new(
        git_remote_name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let git_remote_name = git_remote_name.into();
        if git_remote_name.is_empty() || git_remote_name.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidRemoteName(git_remote_name));
        }
        Ok(Self {
            git_remote_name,
            address: address.into(),
        })
    }
}

impl std::fmt::Display for ClusterMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.git_remote_name, self.address)
    }
}
