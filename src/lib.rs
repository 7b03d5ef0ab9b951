//! bench-history library
//!
//! Reader, validator and history auditor for the `benchmarks/data.js` files
//! written by continuous-benchmarking actions.
//!
//! # Examples
//!
//! Validate a data file:
//!
//! ```rust
//! use bench_history::{parse_data_js, Validator};
//!
//! let text = r#"window.BENCHMARK_DATA = {
//!   "lastUpdate": 10,
//!   "repoUrl": "https://example.com/repo",
//!   "entries": {}
//! }"#;
//!
//! let dataset = parse_data_js(text)?;
//! let report = Validator::default().validate(&dataset);
//! assert!(report.passed(true));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod compare;
pub mod config;
pub mod error;
pub mod extra;
pub mod history;
pub mod logging;
pub mod model;
pub mod scan;
pub mod series;
pub mod validate;

pub use codec::{parse_data_js, read_dataset, to_data_js, write_dataset_atomic};
pub use compare::{check_append_only, AppendReport, AppendViolation};
pub use config::{AppConfig, CliArgs, ConfigError, GitConfig, GitConfigReader, SystemGitConfigReader};
pub use error::{Error, Result};
pub use extra::BenchExtra;
pub use history::{audit_history, GitSnapshotSource, HistoryReport, SnapshotSource};
pub use model::{Bench, BenchmarkDataset, Commit, Entry, Person, Suites};
pub use scan::find_data_files;
pub use series::{Series, SeriesIndex};
pub use validate::{Issue, IssueKind, LastUpdatePolicy, ValidationOptions, ValidationReport, Validator};

/// Entries of a report, or an error listing the reports that exist
pub fn select_report<'a>(dataset: &'a BenchmarkDataset, name: &str) -> Result<&'a [Entry]> {
    dataset.entries.get(name).ok_or_else(|| Error::UnknownReport {
        name: name.to_owned(),
        available: dataset.entries.names().collect::<Vec<_>>().join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{dataset, entry};

    /// **What is tested:** Report selection by name
    /// **Why it is tested:** Every per-report command starts here
    /// **Test conditions:** Existing and missing report names
    /// **Expectations:** Entries for the existing one, UnknownReport listing names otherwise
    #[test]
    fn test_select_report() {
        let data = dataset(vec![entry("a", 1, vec![])]);
        assert_eq!(select_report(&data, "Benchmark Results").map(<[Entry]>::len).ok(), Some(1));

        match select_report(&data, "Memory") {
            Err(Error::UnknownReport { name, available }) => {
                assert_eq!(name, "Memory");
                assert_eq!(available, "Benchmark Results");
            }
            other => panic!("Expected UnknownReport, got {other:?}"),
        }
    }
}
