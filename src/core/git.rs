//! Git command abstraction layer
//!
//! Only used to report which commit the running checkout was built from.
//! Arguments are always passed via std::process::Command args, never a shell.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Git operations abstraction
pub struct Git {
    repo_root: PathBuf,
    program: String,
}

/// Result of a git command execution
#[derive(Debug)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Git command failed: {message}")]
    CommandFailed { message: String },

    #[error("Git not installed or not in PATH")]
    GitNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Git {
    /// Create a new Git instance for the repository at the given path
    pub fn new(repo_root: &Path) -> Self {
        Self::with_program(repo_root, "git")
    }

    /// Use a specific git executable instead of the one on PATH
    pub fn with_program(repo_root: &Path, program: &str) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            program: program.to_string(),
        }
    }

    /// Execute a git command and return the output
    fn run(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        debug!(program = %self.program, ?args, "running git");
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GitError::GitNotFound
                } else {
                    GitError::IoError(e)
                }
            })?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            code: output.status.code(),
        })
    }

    /// Run a command whose stdout is the answer.
    ///
    /// A missing git executable yields `Ok(None)`; every other failure is an error.
    fn query(&self, args: &[&str]) -> Result<Option<String>, GitError> {
        let output = match self.run(args) {
            Ok(output) => output,
            Err(GitError::GitNotFound) => return Ok(None),
            Err(e) => return Err(e),
        };

        if output.success {
            Ok(Some(output.stdout))
        } else {
            Err(GitError::CommandFailed {
                message: if output.stderr.is_empty() {
                    format!("git {} exited with {:?}", args.join(" "), output.code)
                } else {
                    output.stderr
                },
            })
        }
    }

    /// Check if we're in a git repository
    pub fn is_repo(&self) -> bool {
        self.run(&["rev-parse", "--git-dir"])
            .map(|o| o.success)
            .unwrap_or(false)
    }

    /// True when HEAD points at a commit; a freshly initialised repository has none
    pub fn has_commits(&self) -> bool {
        self.run(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .map(|o| o.success)
            .unwrap_or(false)
    }

    /// Abbreviated hash of HEAD
    pub fn short_commit_hash(&self) -> Result<Option<String>, GitError> {
        self.query(&["rev-parse", "--short", "HEAD"])
    }

    /// Commit date of HEAD as `YYYY-MM-DD`
    pub fn commit_date(&self) -> Result<Option<String>, GitError> {
        let stamp = self.query(&["show", "-s", "--format=%ci"])?;
        Ok(stamp.map(|s| s.split(' ').next().unwrap_or_default().to_string()))
    }
}
