//! Git history audit of a data file
//!
//! Every commit that touched the data file is a snapshot. Walking them oldest
//! first, each parsed snapshot is validated and compared with the previous
//! parsed one, which must be a prefix of it.

use crate::codec::parse_data_js;
use crate::compare::{check_append_only, AppendReport};
use crate::error::{Error, Result};
use crate::model::BenchmarkDataset;
use crate::validate::{ValidationOptions, ValidationReport, Validator};
use relative_path::{RelativePath, RelativePathBuf};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// One commit that touched the data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: String,
    /// Committer time, seconds since the epoch
    pub time: i64,
    pub summary: String,
}

impl Revision {
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// Source of historical versions of a file
pub trait SnapshotSource {
    /// Revisions that touched `path`, oldest first
    fn revisions(&self, path: &RelativePath) -> Result<Vec<Revision>>;

    /// Contents of `path` at `revision`, `None` when the file does not exist there
    fn read_at(&self, revision: &Revision, path: &RelativePath) -> Result<Option<String>>;
}

/// Snapshot source backed by the `git` command in a discovered work tree
#[derive(Debug, Clone)]
pub struct GitSnapshotSource {
    root: PathBuf,
}

impl GitSnapshotSource {
    /// Discover the repository containing `start`
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        let repository = gix::discover(start).map_err(|e| {
            Error::Git(format!(
                "No git repository found at {}: {e}",
                start.display()
            ))
        })?;
        let root = repository
            .workdir()
            .ok_or_else(|| Error::Git("Repository has no work tree".to_owned()))?
            .to_path_buf();

        debug!(root = %root.display(), "Discovered repository");
        Ok(Self { root })
    }

    /// Work tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Express a filesystem path relative to the work tree root
    pub fn repo_relative(&self, path: impl AsRef<Path>) -> Result<RelativePathBuf> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()?.join(path)
        };
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());

        let outside = || Error::OutsideRepository {
            path: path.to_path_buf(),
            root: root.clone(),
        };
        let relative = absolute.strip_prefix(&root).map_err(|_| outside())?;
        RelativePathBuf::from_path(relative).map_err(|_| outside())
    }

    fn git(&self, args: &[&str]) -> Result<std::process::Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .env("LC_ALL", "C")
            .output()
            .map_err(|e| Error::Git(format!("Failed to run git {}: {e}", args.join(" "))))
    }
}

impl SnapshotSource for GitSnapshotSource {
    fn revisions(&self, path: &RelativePath) -> Result<Vec<Revision>> {
        let output = self.git(&[
            "log",
            "--reverse",
            "--format=%H%x09%ct%x09%s",
            "--",
            path.as_str(),
        ])?;

        if !output.status.success() {
            // A repository without commits has no history to audit
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("does not have any commits") {
                return Ok(Vec::new());
            }
            return Err(Error::Git(format!("git log failed: {}", stderr.trim())));
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(parse_log_line)
            .collect()
    }

    fn read_at(&self, revision: &Revision, path: &RelativePath) -> Result<Option<String>> {
        let spec = format!("{}:{}", revision.id, path.as_str());
        let output = self.git(&["show", &spec])?;

        if output.status.success() {
            return String::from_utf8(output.stdout)
                .map(Some)
                .map_err(|e| Error::processing_error(format!("{spec} is not UTF-8: {e}")));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("does not exist") || stderr.contains("exists on disk, but not in") {
            Ok(None)
        } else {
            Err(Error::Git(format!("git show {spec} failed: {}", stderr.trim())))
        }
    }
}

fn parse_log_line(line: &str) -> Result<Revision> {
    let mut fields = line.splitn(3, '\t');
    let (Some(id), Some(time), summary) = (fields.next(), fields.next(), fields.next()) else {
        return Err(Error::Git(format!("Unexpected git log line: {line}")));
    };
    let time = time
        .parse()
        .map_err(|_| Error::Git(format!("Invalid commit time in git log line: {line}")))?;

    Ok(Revision {
        id: id.to_owned(),
        time,
        summary: summary.unwrap_or_default().to_owned(),
    })
}

/// What was found at one revision
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotStatus {
    /// The file does not exist at this revision
    Missing,
    /// The file exists but could not be parsed
    Unparsable(String),
    /// The file was parsed and checked
    Checked {
        entries: usize,
        validation: ValidationReport,
        /// Comparison with the previous parsed snapshot, absent for the first one
        append: Option<AppendReport>,
    },
}

/// Outcome for one revision
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotOutcome {
    pub revision: Revision,
    pub status: SnapshotStatus,
}

/// Result of auditing a file's history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryReport {
    pub path: RelativePathBuf,
    pub snapshots: Vec<SnapshotOutcome>,
}

impl HistoryReport {
    /// Snapshots that were parsed and checked
    pub fn checked(&self) -> usize {
        self.snapshots
            .iter()
            .filter(|s| matches!(s.status, SnapshotStatus::Checked { .. }))
            .count()
    }

    /// Snapshots that broke the append-only property
    pub fn append_failures(&self) -> impl Iterator<Item = (&Revision, &AppendReport)> {
        self.snapshots.iter().filter_map(|s| match &s.status {
            SnapshotStatus::Checked {
                append: Some(append),
                ..
            } if !append.is_append_only() => Some((&s.revision, append)),
            _ => None,
        })
    }

    /// Snapshots that failed validation
    pub fn validation_failures(
        &self,
        strict: bool,
    ) -> impl Iterator<Item = (&Revision, &ValidationReport)> {
        self.snapshots.iter().filter_map(move |s| match &s.status {
            SnapshotStatus::Checked { validation, .. } if !validation.passed(strict) => {
                Some((&s.revision, validation))
            }
            _ => None,
        })
    }

    /// Snapshots that could not be parsed
    pub fn unparsable(&self) -> impl Iterator<Item = (&Revision, &str)> {
        self.snapshots.iter().filter_map(|s| match &s.status {
            SnapshotStatus::Unparsable(reason) => Some((&s.revision, reason.as_str())),
            _ => None,
        })
    }

    /// Whether the whole history is well-formed and append-only
    pub fn passed(&self, strict: bool) -> bool {
        self.append_failures().next().is_none()
            && self.validation_failures(strict).next().is_none()
            && self.unparsable().next().is_none()
    }
}

/// Audit every snapshot of `path` provided by `source`
pub fn audit_history<S: SnapshotSource>(
    source: &S,
    path: &RelativePath,
    options: ValidationOptions,
) -> Result<HistoryReport> {
    let validator = Validator::new(options);
    let revisions = source.revisions(path)?;
    info!(path = %path, revisions = revisions.len(), "Auditing history");

    let mut report = HistoryReport {
        path: path.to_relative_path_buf(),
        snapshots: Vec::with_capacity(revisions.len()),
    };
    let mut previous: Option<BenchmarkDataset> = None;

    for revision in revisions {
        let status = match source.read_at(&revision, path)? {
            None => {
                debug!(revision = revision.short_id(), "File absent");
                SnapshotStatus::Missing
            }
            Some(text) => match parse_data_js(&text) {
                Err(error) => {
                    warn!(revision = revision.short_id(), %error, "Unparsable snapshot");
                    SnapshotStatus::Unparsable(error.to_string())
                }
                Ok(dataset) => {
                    let validation = validator.validate(&dataset);
                    let append = previous
                        .as_ref()
                        .map(|before| check_append_only(before, &dataset));
                    if append.as_ref().is_some_and(|a| !a.is_append_only()) {
                        warn!(revision = revision.short_id(), "Snapshot is not append-only");
                    }
                    let entries = dataset.entry_count();
                    previous = Some(dataset);
                    SnapshotStatus::Checked {
                        entries,
                        validation,
                        append,
                    }
                }
            },
        };
        report.snapshots.push(SnapshotOutcome { revision, status });
    }

    Ok(report)
}
