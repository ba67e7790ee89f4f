//! Workspace discovery and structure
//!
//! A workspace is any directory containing `.itree/`. The SQLite database and
//! the workspace config live inside that directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the marker directory
pub const WORKSPACE_DIR: &str = ".itree";

/// Default database file inside the marker directory
pub const DATABASE_FILE: &str = "inventory.db";

/// Keeps the database out of version control whatever it is named
const GITIGNORE: &str = "*\n!.gitignore\n!config.yaml\n";

/// Represents an itree workspace
#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .itree/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        Self::write_skeleton(&root)?;
        Ok(Self { root })
    }

    /// Initialize even if .itree/ exists; the config file is rewritten, the
    /// database is left alone
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_skeleton(&root)?;
        Ok(Self { root })
    }

    fn write_skeleton(root: &Path) -> Result<(), WorkspaceError> {
        let dir = root.join(WORKSPACE_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(dir.join(".gitignore"), GITIGNORE)
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Ok(())
    }

    fn default_config() -> &'static str {
        r#"# itree workspace configuration

# Database file (relative paths resolve against this directory)
# database: inventory.db

# Default output format (auto, tsv, json, yaml, csv, md, id)
# default_format: auto

# tracing filter used when RUST_LOG is unset
# log_filter: itree=warn
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .itree directory
    pub fn itree_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Path of the SQLite database, honouring a configured override
    pub fn database_path(&self, configured: Option<&str>) -> PathBuf {
        match configured {
            Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
            Some(path) => self.itree_dir().join(path),
            None => self.itree_dir().join(DATABASE_FILE),
        }
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an itree workspace (searched from {searched_from:?}). Run 'itree init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("itree workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
