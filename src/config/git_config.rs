//! Git configuration module
//!
//! Typed access to the `bench-history.*` keys with validation.

use super::git_reader::{GitConfigReader, GitError};
use crate::validate::LastUpdatePolicy;
use relative_path::RelativePathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Git config key for the data file path, relative to the repository root
pub const KEY_PATH: &str = "bench-history.path";
/// Git config key for the report name
pub const KEY_REPORT: &str = "bench-history.report";
/// Git config key for the lastUpdate policy
pub const KEY_LAST_UPDATE: &str = "bench-history.last-update";
/// Git config key for strict validation
pub const KEY_STRICT: &str = "bench-history.strict";

/// Configuration errors that can occur during Git config operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Git command execution failed
    #[error("Git command '{command}' failed with exit code {exit_code}: {stderr}")]
    GitCommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
    /// Invalid Git configuration value
    #[error("Invalid git config value: {key}='{value}' (expected: {expected})")]
    InvalidGitConfig {
        key: String,
        value: String,
        expected: String,
    },
    /// Not in a Git repository
    #[error("Not in a git repository: {}", path.display())]
    NotInGitRepository { path: PathBuf },
    /// IO error during configuration
    #[error("IO error during configuration: {message}")]
    IoError { message: String },
    /// Invalid CLI argument value
    #[error("Invalid CLI argument: {argument}='{value}' (expected: {expected})")]
    InvalidCliArgument {
        argument: String,
        value: String,
        expected: String,
    },
}

impl ConfigError {
    /// Whether the error only means git settings are unavailable here
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ConfigError::NotInGitRepository { .. } | ConfigError::IoError { .. }
        )
    }
}

impl From<GitError> for ConfigError {
    fn from(error: GitError) -> Self {
        match error {
            GitError::CommandFailed {
                command,
                exit_code,
                stderr,
            } => ConfigError::GitCommandFailed {
                command,
                exit_code,
                stderr,
            },
            GitError::IoError { command, error } => ConfigError::IoError {
                message: format!("Git command '{command}' failed: {error}"),
            },
            GitError::NotInGitRepository { path } => ConfigError::NotInGitRepository { path },
        }
    }
}

/// Git configuration operations
pub struct GitConfig;

impl GitConfig {
    /// Get the data file path with custom reader
    pub fn get_data_path_with_reader<R: GitConfigReader>(
        reader: &R,
    ) -> Result<Option<RelativePathBuf>, ConfigError> {
        reader
            .get_config(KEY_PATH)?
            .map(|value| parse_relative_path(&value, KEY_PATH))
            .transpose()
    }

    /// Get the report name with custom reader
    pub fn get_report_with_reader<R: GitConfigReader>(
        reader: &R,
    ) -> Result<Option<String>, ConfigError> {
        reader
            .get_config(KEY_REPORT)
            .map(|opt| {
                opt.and_then(|value| {
                    let trimmed = value.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_owned())
                })
            })
            .map_err(ConfigError::from)
    }

    /// Get the lastUpdate policy with custom reader
    pub fn get_last_update_policy_with_reader<R: GitConfigReader>(
        reader: &R,
    ) -> Result<Option<LastUpdatePolicy>, ConfigError> {
        reader
            .get_config(KEY_LAST_UPDATE)?
            .map(|value| {
                value
                    .parse::<LastUpdatePolicy>()
                    .map_err(|_| ConfigError::InvalidGitConfig {
                        key: KEY_LAST_UPDATE.to_owned(),
                        value: value.clone(),
                        expected: "exact or at-least".to_owned(),
                    })
            })
            .transpose()
    }

    /// Get strict validation setting with custom reader
    pub fn get_strict_with_reader<R: GitConfigReader>(
        reader: &R,
    ) -> Result<Option<bool>, ConfigError> {
        reader
            .get_config(KEY_STRICT)?
            .map(|value| parse_boolean_value(&value, KEY_STRICT))
            .transpose()
    }
}

/// Parse a git-style boolean
fn parse_boolean_value(value: &str, key: &str) -> Result<bool, ConfigError> {
    let normalized = value.to_lowercase();

    ["true", "1", "yes", "on"]
        .iter()
        .any(|&v| v == normalized)
        .then_some(true)
        .or_else(|| {
            ["false", "0", "no", "off"]
                .iter()
                .any(|&v| v == normalized)
                .then_some(false)
        })
        .ok_or_else(|| ConfigError::InvalidGitConfig {
            key: key.to_owned(),
            value: value.to_owned(),
            expected: "true, false, 1, 0, yes, no, on, or off".to_owned(),
        })
}

/// Parse a repository-relative path, rejecting absolute ones
pub(crate) fn parse_relative_path(value: &str, key: &str) -> Result<RelativePathBuf, ConfigError> {
    let invalid = || ConfigError::InvalidGitConfig {
        key: key.to_owned(),
        value: value.to_owned(),
        expected: "non-empty path relative to the repository root".to_owned(),
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }
    let path = RelativePathBuf::from_path(trimmed).map_err(|_| invalid())?;
    let normalized = path.normalize();
    if normalized.as_str().is_empty() || normalized.as_str().starts_with("..") {
        return Err(invalid());
    }
    Ok(normalized)
}
