//! Git configuration reader module
//!
//! This module provides low-level Git command abstraction with error handling
//! for reading Git configuration values.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Git-specific errors that can occur during Git operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GitError {
    /// Git command execution failed
    #[error("Git command '{command}' failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
    /// IO error during Git command execution
    #[error("IO error executing git command '{command}': {error}")]
    IoError { command: String, error: String },
    /// Not in a Git repository
    #[error("Not in a git repository: {}", path.display())]
    NotInGitRepository { path: PathBuf },
}

/// Trait for reading Git configuration values
pub trait GitConfigReader {
    /// Get a Git configuration value by key
    fn get_config(&self, key: &str) -> Result<Option<String>, GitError>;
}

/// System Git configuration reader that executes actual Git commands
///
/// Reads the repository containing the current directory unless a start
/// directory is given with [`SystemGitConfigReader::in_dir`].
#[derive(Debug, Clone, Default)]
pub struct SystemGitConfigReader {
    dir: Option<PathBuf>,
}

impl GitConfigReader for SystemGitConfigReader {
    fn get_config(&self, key: &str) -> Result<Option<String>, GitError> {
        let start_dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => Self::get_current_directory()?,
        };

        Self::validate_git_repository(&start_dir)?;

        let output = Self::execute_git_config_command(key, &start_dir)?;

        Self::parse_git_config_output(output, key)
    }
}

impl SystemGitConfigReader {
    /// Reader for the repository containing the current directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader for the repository containing `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn get_current_directory() -> Result<PathBuf, GitError> {
        env::current_dir().map_err(|e| GitError::IoError {
            command: "git config".to_owned(),
            error: format!("Failed to get current directory: {e}"),
        })
    }

    fn validate_git_repository(path: &Path) -> Result<(), GitError> {
        gix::discover(path)
            .is_ok()
            .then_some(())
            .ok_or_else(|| GitError::NotInGitRepository {
                path: path.to_path_buf(),
            })
    }

    fn execute_git_config_command(
        key: &str,
        current_dir: &Path,
    ) -> Result<std::process::Output, GitError> {
        Command::new("git")
            .args(["config", "--get", key])
            .current_dir(current_dir)
            .output()
            .map_err(|e| GitError::IoError {
                command: format!("git config --get {key}"),
                error: e.to_string(),
            })
    }

    fn parse_git_config_output(
        output: std::process::Output,
        key: &str,
    ) -> Result<Option<String>, GitError> {
        match output.status.code() {
            Some(0) => {
                let value_string = String::from_utf8_lossy(&output.stdout);
                let value = value_string.trim();
                Ok((!value.is_empty()).then(|| value.to_owned()))
            }
            Some(1) => Ok(None), // key not set
            exit_code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(GitError::CommandFailed {
                    command: format!("git config --get {key}"),
                    exit_code: exit_code.unwrap_or(-1),
                    stderr: stderr.to_string(),
                })
            }
        }
    }
}

/// Mock Git configuration reader for testing
#[cfg(test)]
#[derive(Default)]
pub struct MockGitConfigReader {
    config: std::collections::HashMap<String, String>,
    failure: Option<GitError>,
}

#[cfg(test)]
impl MockGitConfigReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration value to the mock reader
    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Make every lookup fail with the given error
    pub fn failing(mut self, error: GitError) -> Self {
        self.failure = Some(error);
        self
    }
}

#[cfg(test)]
impl GitConfigReader for MockGitConfigReader {
    fn get_config(&self, key: &str) -> Result<Option<String>, GitError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.config.get(key).cloned()),
        }
    }
}
