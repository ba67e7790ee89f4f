//! Core module - domain types, storage and environment probes

pub mod config;
pub mod git;
pub mod identity;
pub mod store;
pub mod version;
pub mod workspace;

pub use config::Config;
pub use git::{Git, GitError};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use store::{Store, StoreError};
pub use version::{BuildInfo, VersionError, VersionTuple};
pub use workspace::{Workspace, WorkspaceError};
