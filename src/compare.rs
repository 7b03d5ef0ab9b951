//! Append-only snapshot comparison
//!
//! A newer data file must contain every entry of the older one, unchanged and
//! in the same position, with new entries only appended at the end of each
//! report.

use crate::model::BenchmarkDataset;
use std::fmt;
use tracing::debug;

/// A way in which `current` fails to extend `previous`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendViolation {
    /// A report present before is gone
    SuiteRemoved { suite: String },
    /// A report has fewer entries than before
    EntriesRemoved {
        suite: String,
        previous: usize,
        current: usize,
    },
    /// An entry that existed before differs now
    EntryModified {
        suite: String,
        index: usize,
        commit: String,
    },
    /// `lastUpdate` went backwards
    LastUpdateRegressed { previous: i64, current: i64 },
    /// The file now describes a different repository
    RepoUrlChanged { previous: String, current: String },
}

impl fmt::Display for AppendViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppendViolation::SuiteRemoved { suite } => write!(f, "report '{suite}' was removed"),
            AppendViolation::EntriesRemoved {
                suite,
                previous,
                current,
            } => write!(
                f,
                "report '{suite}' shrank from {previous} to {current} entries"
            ),
            AppendViolation::EntryModified {
                suite,
                index,
                commit,
            } => write!(f, "report '{suite}' entry #{index} ({commit}) was modified"),
            AppendViolation::LastUpdateRegressed { previous, current } => {
                write!(f, "lastUpdate went back from {previous} to {current}")
            }
            AppendViolation::RepoUrlChanged { previous, current } => {
                write!(f, "repoUrl changed from '{previous}' to '{current}'")
            }
        }
    }
}

/// Entries appended to one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteDelta {
    pub suite: String,
    /// Entries that existed in the older snapshot
    pub retained: usize,
    /// Entries new in the newer snapshot
    pub appended: usize,
    /// Whether the report did not exist before
    pub new_suite: bool,
}

/// Result of comparing two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendReport {
    pub suites: Vec<SuiteDelta>,
    pub violations: Vec<AppendViolation>,
}

impl AppendReport {
    /// Whether `current` is a superset-preserving append of `previous`
    pub fn is_append_only(&self) -> bool {
        self.violations.is_empty()
    }

    /// Total number of appended entries
    pub fn appended(&self) -> usize {
        self.suites.iter().map(|delta| delta.appended).sum()
    }
}

/// Check that `current` only appends to `previous`
pub fn check_append_only(previous: &BenchmarkDataset, current: &BenchmarkDataset) -> AppendReport {
    let mut report = AppendReport::default();

    if previous.repo_url != current.repo_url {
        report.violations.push(AppendViolation::RepoUrlChanged {
            previous: previous.repo_url.clone(),
            current: current.repo_url.clone(),
        });
    }

    if current.last_update < previous.last_update {
        report.violations.push(AppendViolation::LastUpdateRegressed {
            previous: previous.last_update,
            current: current.last_update,
        });
    }

    for (suite, old_entries) in previous.entries.iter() {
        let Some(new_entries) = current.entries.get(suite) else {
            report.violations.push(AppendViolation::SuiteRemoved {
                suite: suite.to_owned(),
            });
            continue;
        };

        if new_entries.len() < old_entries.len() {
            report.violations.push(AppendViolation::EntriesRemoved {
                suite: suite.to_owned(),
                previous: old_entries.len(),
                current: new_entries.len(),
            });
        }

        report.violations.extend(
            old_entries
                .iter()
                .zip(new_entries)
                .enumerate()
                .filter(|(_, (old, new))| old != new)
                .map(|(index, (old, _))| AppendViolation::EntryModified {
                    suite: suite.to_owned(),
                    index,
                    commit: old.short_id().to_owned(),
                }),
        );

        report.suites.push(SuiteDelta {
            suite: suite.to_owned(),
            retained: old_entries.len().min(new_entries.len()),
            appended: new_entries.len().saturating_sub(old_entries.len()),
            new_suite: false,
        });
    }

    for (suite, new_entries) in current.entries.iter() {
        if previous.entries.get(suite).is_none() {
            report.suites.push(SuiteDelta {
                suite: suite.to_owned(),
                retained: 0,
                appended: new_entries.len(),
                new_suite: true,
            });
        }
    }

    debug!(
        appended = report.appended(),
        violations = report.violations.len(),
        "Compared snapshots"
    );
    report
}
