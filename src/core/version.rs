//! Version and build information
//!
//! Static facts (software and API version) are constants; everything derived
//! from the environment is gathered once into a read-only [`BuildInfo`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::core::git::{Git, GitError};
use crate::core::store::{Store, StoreError};

/// Software version string
pub const SOFTWARE_VERSION: &str = "0.1.8 pre";

/// Bumped whenever the data model changes in a way clients must know about
pub const API_VERSION: u32 = 2;

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("version pattern is valid"));

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("malformed version string '{0}': expected MAJOR.MINOR.PATCH")]
    Malformed(String),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// `(major, minor, patch)` as parsed from a version string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTuple {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionTuple {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn as_array(&self) -> [u64; 3] {
        [self.major, self.minor, self.patch]
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Extract the first `N.N.N` run from a version string
pub fn version_tuple(version: &str) -> Result<VersionTuple, VersionError> {
    let caps = VERSION_PATTERN
        .captures(version)
        .ok_or_else(|| VersionError::Malformed(version.to_string()))?;

    let group = |i: usize| -> Result<u64, VersionError> {
        caps[i]
            .parse()
            .map_err(|_| VersionError::Malformed(version.to_string()))
    };

    Ok(VersionTuple::new(group(1)?, group(2)?, group(3)?))
}

/// Tuple of [`SOFTWARE_VERSION`]
pub fn software_version_tuple() -> Result<VersionTuple, VersionError> {
    version_tuple(SOFTWARE_VERSION)
}

/// Collapse a version into one integer for ordinal comparison.
///
/// Components of 1000 or more bleed into the next field.
pub fn version_tuple_to_int(version: VersionTuple) -> u64 {
    version.major * 1_000_000 + version.minor * 1_000 + version.patch
}

/// Version of the storage engine underneath the store
pub fn framework_version() -> &'static str {
    rusqlite::version()
}

/// Everything `itree version` reports
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub api_version: u32,
    pub version_tuple: [u64; 3],
    pub version_int: u64,
    pub framework_version: &'static str,
    pub commit_hash: Option<String>,
    pub commit_date: Option<String>,
    pub instance_name: String,
}

impl BuildInfo {
    /// Gather build facts.
    ///
    /// A missing git executable leaves the commit fields empty; any other
    /// git failure is returned. Without `git` the commit fields are skipped,
    /// without a store the instance name is empty.
    pub fn collect(git: Option<&Git>, store: Option<&Store>) -> Result<Self, VersionError> {
        let tuple = software_version_tuple()?;
        let instance_name = match store {
            Some(store) => store.instance_name()?,
            None => String::new(),
        };

        let (commit_hash, commit_date) = match git {
            Some(git) => (git.short_commit_hash()?, git.commit_date()?),
            None => (None, None),
        };

        Ok(Self {
            version: SOFTWARE_VERSION,
            api_version: API_VERSION,
            version_tuple: tuple.as_array(),
            version_int: version_tuple_to_int(tuple),
            framework_version: framework_version(),
            commit_hash,
            commit_date,
            instance_name,
        })
    }
}
