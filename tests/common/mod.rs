//! Shared test helpers for bench-history
//!
//! `TestRepo` builds throwaway git repositories whose history contains
//! successive versions of a data file; `TestData` generates datasets.

#![allow(dead_code)]

use bench_history::model::{Bench, BenchmarkDataset, Commit, Entry, Person, Suites, DEFAULT_REPORT};
use bench_history::to_data_js;
use serde_json::Map;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Result type for helpers
pub type Result<T = ()> = std::result::Result<T, Box<dyn Error>>;

/// Path to the sample data file shipped with the tests
pub const SAMPLE_DATA_PATH: &str = "tests/fixtures/data.js";

/// Name of the compiled binary
pub const BIN: &str = "bench-history";

/// Temporary git repository
#[derive(Debug)]
pub struct TestRepo {
    temp_dir: TempDir,
}

impl TestRepo {
    /// Initialize an empty repository with a committer identity
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let repo = Self { temp_dir };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.name", "Test User"])?;
        repo.git(&["config", "user.email", "test@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    /// Work tree root
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Run git in the work tree, failing on a non-zero exit
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()?;
        if !output.status.success() {
            return Err(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            )
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Set a repository-local config value
    pub fn set_git_config(&self, key: &str, value: &str) -> Result {
        self.git(&["config", key, value])?;
        Ok(())
    }

    /// Write a file relative to the work tree root
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write and commit a file
    pub fn commit_file(&self, relative: &str, contents: &str, message: &str) -> Result {
        self.write(relative, contents)?;
        self.git(&["add", "--", relative])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    /// Render and commit a dataset
    pub fn commit_dataset(&self, relative: &str, dataset: &BenchmarkDataset, message: &str) -> Result {
        self.commit_file(relative, &to_data_js(dataset)?, message)
    }

    /// Delete and commit the removal of a file
    pub fn commit_removal(&self, relative: &str, message: &str) -> Result {
        self.git(&["rm", "--quiet", "--", relative])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }
}

/// Dataset generators
pub struct TestData;

impl TestData {
    fn person() -> Person {
        Person {
            email: Some("bot@example.com".to_owned()),
            name: "Bench Bot".to_owned(),
            username: Some("bench-bot".to_owned()),
            other: Map::new(),
        }
    }

    /// Entry number `n` with one bench per name
    pub fn entry(n: usize, names: &[&str]) -> Entry {
        let id = format!("{n:040x}");
        Entry {
            commit: Commit {
                author: Self::person(),
                committer: Self::person(),
                distinct: Some(true),
                url: format!("https://example.com/repo/commit/{id}"),
                id,
                message: format!("Change {n}"),
                timestamp: "2024-04-06T23:00:01+08:00".to_owned(),
                tree_id: None,
                other: Map::new(),
            },
            date: 1_700_000_000_000 + n as i64 * 60_000,
            tool: "julia".to_owned(),
            benches: names
                .iter()
                .enumerate()
                .map(|(i, name)| Bench {
                    name: (*name).to_owned(),
                    value: serde_json::Number::from(1000 + n as u64 * 10 + i as u64),
                    unit: "ns".to_owned(),
                    range: None,
                    extra: Some(format!(
                        "gctime=0\nmemory={}\nallocs={}\nparams={{\"samples\":10000,\"evals\":{}}}",
                        16 * i,
                        i,
                        n + 1
                    )),
                    other: Map::new(),
                })
                .collect(),
            other: Map::new(),
        }
    }

    /// Dataset with `count` entries in the default report
    pub fn dataset(count: usize) -> BenchmarkDataset {
        let names = ["Caputo/CaputoL1", "Caputo/CaputoTrap", "RL/RLDirect"];
        let entries: Vec<Entry> = (0..count).map(|n| Self::entry(n, &names)).collect();
        Self::with_entries(entries)
    }

    /// Dataset whose lastUpdate matches its newest entry
    pub fn with_entries(entries: Vec<Entry>) -> BenchmarkDataset {
        let last_update = entries.iter().map(|e| e.date).max().unwrap_or(0);
        let mut suites = Suites::new();
        suites.insert(DEFAULT_REPORT, entries);
        BenchmarkDataset {
            last_update,
            repo_url: "https://example.com/repo".to_owned(),
            entries: suites,
            other: Map::new(),
        }
    }
}
