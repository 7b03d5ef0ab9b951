//! Data file discovery
//!
//! Walks a directory tree with `.gitignore` rules applied and collects files
//! with the data file name, e.g. every `data.js` of a multi-project pages
//! branch.

use crate::error::{Error, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name written by the benchmark action
pub const DEFAULT_FILE_NAME: &str = "data.js";

/// Find files named `file_name` below `root`, sorted by path
///
/// Hidden directories are skipped and ignore files are honored even when
/// `root` is not inside a git repository.
pub fn find_data_files(root: impl AsRef<Path>, file_name: &str) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::processing_error(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut found = Vec::new();
    for result in WalkBuilder::new(root).require_git(false).build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(error) => {
                warn!(%error, "Skipping unreadable path");
                continue;
            }
        };

        let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
        if is_file && entry.file_name() == file_name {
            debug!(path = %entry.path().display(), "Found data file");
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}
