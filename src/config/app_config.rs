//! Application configuration module
//!
//! This module provides the main application configuration structure that combines
//! CLI arguments with Git configuration values using a clear priority system.

use super::git_config::{parse_relative_path, ConfigError, GitConfig};
use super::git_reader::{GitConfigReader, SystemGitConfigReader};
use crate::model::DEFAULT_REPORT;
use crate::validate::{LastUpdatePolicy, ValidationOptions};
use relative_path::{RelativePath, RelativePathBuf};
use std::path::PathBuf;
use tracing::debug;

/// Data file location used by the benchmark action
pub const DEFAULT_DATA_PATH: &str = "benchmarks/data.js";

/// CLI arguments structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Data file path relative to the repository root
    pub data_path: Option<String>,
    /// Report name inside `entries`
    pub report: Option<String>,
    /// lastUpdate policy override
    pub last_update: Option<LastUpdatePolicy>,
    /// Treat warnings as failures
    pub strict: bool,
    /// Directory whose repository supplies git config (default: current directory)
    pub repo_dir: Option<PathBuf>,
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    data_path: RelativePathBuf,
    report: String,
    validation: ValidationOptions,
    strict: bool,
}

/// Configuration builder for functional composition
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    data_path: Option<RelativePathBuf>,
    report: Option<String>,
    last_update: Option<LastUpdatePolicy>,
    strict: Option<bool>,
}

impl ConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data_path: None,
            report: None,
            last_update: None,
            strict: None,
        }
    }

    #[must_use]
    pub fn with_data_path(mut self, path: Option<RelativePathBuf>) -> Self {
        self.data_path = path;
        self
    }

    #[must_use]
    pub fn with_report(mut self, report: Option<String>) -> Self {
        self.report = report;
        self
    }

    #[must_use]
    pub const fn with_last_update(mut self, policy: Option<LastUpdatePolicy>) -> Self {
        self.last_update = policy;
        self
    }

    #[must_use]
    pub const fn with_strict(mut self, strict: Option<bool>) -> Self {
        self.strict = strict;
        self
    }

    /// Build the final AppConfig, filling unset values with defaults
    pub fn build(self) -> AppConfig {
        AppConfig {
            data_path: self
                .data_path
                .unwrap_or_else(|| RelativePathBuf::from(DEFAULT_DATA_PATH)),
            report: self.report.unwrap_or_else(|| DEFAULT_REPORT.to_owned()),
            validation: ValidationOptions {
                last_update: self.last_update.unwrap_or_default(),
            },
            strict: self.strict.unwrap_or(false),
        }
    }
}

impl AppConfig {
    /// Create AppConfig from CLI arguments
    ///
    /// Priority order:
    /// 1. CLI parameters (highest priority)
    /// 2. Git configuration values
    /// 3. Hardcoded defaults (also used outside a git repository)
    pub fn from_cli(cli_args: CliArgs) -> Result<Self, ConfigError> {
        let reader = match &cli_args.repo_dir {
            Some(dir) => SystemGitConfigReader::in_dir(dir),
            None => SystemGitConfigReader::new(),
        };
        Self::from_cli_with_reader(cli_args, &reader)
    }

    /// Create AppConfig from CLI arguments with custom git config reader
    pub fn from_cli_with_reader<R: GitConfigReader>(
        cli_args: CliArgs,
        reader: &R,
    ) -> Result<Self, ConfigError> {
        let data_path = match cli_args.data_path.as_deref() {
            Some(path) => Some(Self::parse_cli_data_path(path)?),
            None => fallback(GitConfig::get_data_path_with_reader(reader))?,
        };

        let report = match cli_args.report {
            Some(report) => Some(Self::parse_cli_report(report)?),
            None => fallback(GitConfig::get_report_with_reader(reader))?,
        };

        let last_update = match cli_args.last_update {
            Some(policy) => Some(policy),
            None => fallback(GitConfig::get_last_update_policy_with_reader(reader))?,
        };

        let strict = if cli_args.strict {
            Some(true)
        } else {
            fallback(GitConfig::get_strict_with_reader(reader))?
        };

        let config = ConfigBuilder::new()
            .with_data_path(data_path)
            .with_report(report)
            .with_last_update(last_update)
            .with_strict(strict)
            .build();

        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    fn parse_cli_data_path(path: &str) -> Result<RelativePathBuf, ConfigError> {
        parse_relative_path(path, "--path").map_err(|_| ConfigError::InvalidCliArgument {
            argument: "--path".to_owned(),
            value: path.to_owned(),
            expected: "non-empty path relative to the repository root".to_owned(),
        })
    }

    fn parse_cli_report(report: String) -> Result<String, ConfigError> {
        let trimmed = report.trim();
        (!trimmed.is_empty())
            .then(|| trimmed.to_owned())
            .ok_or_else(|| ConfigError::InvalidCliArgument {
                argument: "--report".to_owned(),
                value: report.clone(),
                expected: "non-empty report name".to_owned(),
            })
    }

    /// Data file path relative to the repository root
    pub fn data_path(&self) -> &RelativePath {
        &self.data_path
    }

    /// Report name inside `entries`
    pub fn report(&self) -> &str {
        &self.report
    }

    /// Options passed to the validator
    pub fn validation(&self) -> ValidationOptions {
        self.validation
    }

    /// Whether warnings fail validation
    pub fn strict(&self) -> bool {
        self.strict
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// Git settings that cannot be read fall back to defaults; bad values are errors
fn fallback<T>(result: Result<Option<T>, ConfigError>) -> Result<Option<T>, ConfigError> {
    match result {
        Err(error) if error.is_unavailable() => {
            debug!(%error, "Git configuration unavailable, using defaults");
            Ok(None)
        }
        other => other,
    }
}
