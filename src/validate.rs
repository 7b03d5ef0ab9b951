//! Data-integrity validation
//!
//! Checks the properties every generated data file is expected to hold:
//! capture dates never go backwards within a report, bench values are
//! non-negative, and `lastUpdate` agrees with the newest entry. Softer
//! consistency problems (renamed units, duplicated benches, unreadable
//! annotations) are reported as warnings.

use crate::extra::BenchExtra;
use crate::model::{BenchmarkDataset, Entry};
use clap::ValueEnum;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// How `lastUpdate` must relate to the newest entry date
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LastUpdatePolicy {
    /// `lastUpdate` equals the maximum entry date
    Exact,
    /// `lastUpdate` is not older than the maximum entry date
    #[default]
    AtLeast,
}

impl FromStr for LastUpdatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "at-least" | "atleast" | "at_least" => Ok(Self::AtLeast),
            other => Err(format!("unknown last-update policy '{other}'")),
        }
    }
}

impl fmt::Display for LastUpdatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::AtLeast => f.write_str("at-least"),
        }
    }
}

/// Options controlling validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub last_update: LastUpdatePolicy,
}

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// What a finding is about
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// `latest` is the largest date of any preceding entry in the report
    DateOutOfOrder { latest: i64, date: i64 },
    NegativeValue { bench: String, value: f64 },
    LastUpdateMismatch { last_update: i64, max_date: i64, policy: LastUpdatePolicy },
    DuplicateBench { bench: String },
    UnitChanged { bench: String, before: String, after: String },
    InvalidCommitTimestamp { timestamp: String },
    EmptyEntry,
    MalformedParams { bench: String },
    DuplicateCommit { first_index: usize },
}

impl IssueKind {
    /// Severity assigned to this kind of finding
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::DateOutOfOrder { .. }
            | IssueKind::NegativeValue { .. }
            | IssueKind::LastUpdateMismatch { .. } => Severity::Error,
            IssueKind::DuplicateBench { .. }
            | IssueKind::UnitChanged { .. }
            | IssueKind::InvalidCommitTimestamp { .. }
            | IssueKind::EmptyEntry
            | IssueKind::MalformedParams { .. }
            | IssueKind::DuplicateCommit { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::DateOutOfOrder { latest, date } => {
                write!(f, "date {date} is earlier than {latest}, the latest date of a preceding entry")
            }
            IssueKind::NegativeValue { bench, value } => {
                write!(f, "bench '{bench}' has negative value {value}")
            }
            IssueKind::LastUpdateMismatch {
                last_update,
                max_date,
                policy,
            } => write!(
                f,
                "lastUpdate {last_update} does not satisfy '{policy}' against newest entry date {max_date}"
            ),
            IssueKind::DuplicateBench { bench } => {
                write!(f, "bench '{bench}' appears more than once")
            }
            IssueKind::UnitChanged {
                bench,
                before,
                after,
            } => write!(f, "bench '{bench}' changed unit from '{before}' to '{after}'"),
            IssueKind::InvalidCommitTimestamp { timestamp } => {
                write!(f, "commit timestamp '{timestamp}' is not RFC 3339")
            }
            IssueKind::EmptyEntry => f.write_str("entry has no benches"),
            IssueKind::MalformedParams { bench } => {
                write!(f, "bench '{bench}' has a params record that is not a JSON object")
            }
            IssueKind::DuplicateCommit { first_index } => {
                write!(f, "commit already recorded at entry #{first_index}")
            }
        }
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    /// Report the entry belongs to; `None` for dataset-level findings
    pub suite: Option<String>,
    /// Position of the entry within its report
    pub entry_index: Option<usize>,
    pub commit: Option<String>,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    fn dataset(kind: IssueKind) -> Self {
        Self {
            kind,
            suite: None,
            entry_index: None,
            commit: None,
        }
    }

    fn entry(kind: IssueKind, suite: &str, index: usize, entry: &Entry) -> Self {
        Self {
            kind,
            suite: Some(suite.to_owned()),
            entry_index: Some(index),
            commit: Some(entry.short_id().to_owned()),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity())?;
        if let Some(suite) = &self.suite {
            write!(f, "[{suite}]")?;
        }
        if let Some(index) = self.entry_index {
            write!(f, " entry #{index}")?;
        }
        if let Some(commit) = &self.commit {
            write!(f, " ({commit})")?;
        }
        if self.suite.is_some() || self.entry_index.is_some() {
            f.write_str(": ")?;
        }
        write!(f, "{}", self.kind)
    }
}

/// Outcome of validating a dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
    pub suites: usize,
    pub entries: usize,
    pub benches: usize,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
    }

    /// Whether the dataset passes; strict mode also fails on warnings
    pub fn passed(&self, strict: bool) -> bool {
        if strict {
            self.issues.is_empty()
        } else {
            self.errors().next().is_none()
        }
    }
}

/// Runs the integrity checks over a dataset
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn validate(&self, dataset: &BenchmarkDataset) -> ValidationReport {
        let mut report = ValidationReport {
            suites: dataset.entries.len(),
            entries: dataset.entry_count(),
            ..ValidationReport::default()
        };

        for (suite, entries) in dataset.entries.iter() {
            debug!(suite, entries = entries.len(), "Validating report");
            self.check_suite(suite, entries, &mut report);
        }

        if let Some(max_date) = dataset.max_entry_date() {
            self.check_last_update(dataset.last_update, max_date, &mut report);
        }

        if !report.issues.is_empty() {
            warn!(
                errors = report.errors().count(),
                warnings = report.warnings().count(),
                "Validation found issues"
            );
        }
        report
    }

    fn check_suite(&self, suite: &str, entries: &[Entry], report: &mut ValidationReport) {
        let mut units: HashMap<&str, &str> = HashMap::new();
        let mut commits: HashMap<&str, usize> = HashMap::new();
        let mut latest_date: Option<i64> = None;

        for (index, entry) in entries.iter().enumerate() {
            let mut push = |kind| report.issues.push(Issue::entry(kind, suite, index, entry));

            if let Some(latest) = latest_date.filter(|latest| entry.date < *latest) {
                push(IssueKind::DateOutOfOrder {
                    latest,
                    date: entry.date,
                });
            }
            latest_date = Some(latest_date.map_or(entry.date, |l| l.max(entry.date)));

            if entry.commit.parsed_timestamp().is_err() {
                push(IssueKind::InvalidCommitTimestamp {
                    timestamp: entry.commit.timestamp.clone(),
                });
            }

            match commits.get(entry.commit.id.as_str()) {
                Some(&first_index) => push(IssueKind::DuplicateCommit { first_index }),
                None => {
                    commits.insert(&entry.commit.id, index);
                }
            }

            if entry.benches.is_empty() {
                push(IssueKind::EmptyEntry);
            }

            let mut seen = HashSet::new();
            for bench in &entry.benches {
                let value = bench.value_f64();
                if value < 0.0 {
                    push(IssueKind::NegativeValue {
                        bench: bench.name.clone(),
                        value,
                    });
                }

                if !seen.insert(bench.name.as_str()) {
                    push(IssueKind::DuplicateBench {
                        bench: bench.name.clone(),
                    });
                }

                match units.get(bench.name.as_str()) {
                    Some(before) if *before != bench.unit => push(IssueKind::UnitChanged {
                        bench: bench.name.clone(),
                        before: (*before).to_owned(),
                        after: bench.unit.clone(),
                    }),
                    Some(_) => {}
                    None => {
                        units.insert(&bench.name, &bench.unit);
                    }
                }

                if bench
                    .extra
                    .as_deref()
                    .is_some_and(|extra| BenchExtra::parse(extra).has_malformed_params())
                {
                    push(IssueKind::MalformedParams {
                        bench: bench.name.clone(),
                    });
                }
            }

            report.benches += entry.benches.len();
        }
    }

    fn check_last_update(&self, last_update: i64, max_date: i64, report: &mut ValidationReport) {
        let policy = self.options.last_update;
        let satisfied = match policy {
            LastUpdatePolicy::Exact => last_update == max_date,
            LastUpdatePolicy::AtLeast => last_update >= max_date,
        };
        if !satisfied {
            report.issues.push(Issue::dataset(IssueKind::LastUpdateMismatch {
                last_update,
                max_date,
                policy,
            }));
        }
    }
}
