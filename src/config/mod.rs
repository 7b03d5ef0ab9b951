//! Configuration module for bench-history
//!
//! This module provides a unified configuration system that combines CLI arguments
//! with Git configuration values using strict error handling and clear priority logic.
//!
//! # Architecture
//!
//! - [`git_reader`] - Low-level Git command abstraction with error handling
//! - [`git_config`] - Typed `bench-history.*` keys with validation
//! - [`app_config`] - High-level application configuration with CLI integration
//!
//! # Priority Logic
//!
//! 1. CLI parameters (highest priority)
//! 2. Git configuration values
//! 3. Hardcoded defaults (when Git config is not set or no repository is present)
//!
//! Invalid Git configuration values are reported as [`ConfigError`] rather than
//! replaced by defaults.
//!
//! # Usage
//!
//! ```rust
//! use bench_history::config::{AppConfig, CliArgs};
//!
//! let cli_args = CliArgs {
//!     data_path: Some("benchmarks/data.js".to_owned()),
//!     report: None,
//!     last_update: None,
//!     strict: false,
//!     repo_dir: None,
//! };
//!
//! match AppConfig::from_cli(cli_args) {
//!     Ok(config) => println!("Reading {} / {}", config.data_path(), config.report()),
//!     Err(error) => eprintln!("{error}"),
//! }
//! ```

pub mod app_config;
pub mod git_config;
pub mod git_reader;

pub use app_config::{AppConfig, CliArgs, ConfigBuilder, DEFAULT_DATA_PATH};
pub use git_config::{ConfigError, GitConfig};
pub use git_reader::{GitConfigReader, GitError, SystemGitConfigReader};

#[cfg(test)]
pub use git_reader::MockGitConfigReader;

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// **What is tested:** Required trait implementations for ConfigError
    /// **Why it is tested:** ConfigError is wrapped by the crate Error and compared in tests
    /// **Test conditions:** Creates ConfigError instances and exercises Debug, Display, Error, Clone, PartialEq
    /// **Expectations:** All traits available
    #[test]
    fn test_error_types_implement_required_traits() {
        let error = ConfigError::IoError {
            message: "test".to_owned(),
        };

        let _debug = format!("{error:?}");
        let _display = format!("{error}");
        let _error_trait: &dyn std::error::Error = &error;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }

    /// **What is tested:** Builder and mock reader working together
    /// **Why it is tested:** The builder is the only way AppConfig gets constructed
    /// **Test conditions:** Mock reader with a report name, builder fed from GitConfig
    /// **Expectations:** Report from git config, defaults elsewhere
    #[test]
    fn test_integration_with_all_components() {
        let mock_reader = MockGitConfigReader::new().with_config("bench-history.report", "Memory");

        let report = GitConfig::get_report_with_reader(&mock_reader).ok().flatten();
        let config = ConfigBuilder::new().with_report(report).build();

        assert_eq!(config.report(), "Memory");
        assert_eq!(config.data_path().as_str(), DEFAULT_DATA_PATH);
    }
}
