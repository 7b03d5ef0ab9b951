//! CLI integration tests for the bench-history binary
//!
//! Runs the compiled binary against the shipped sample data file and
//! generated datasets written to temporary directories.

use assert_cmd::Command;
use bench_history::to_data_js;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

mod common;
use common::{Result, TestData, TestRepo, BIN, SAMPLE_DATA_PATH};

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(SAMPLE_DATA_PATH)
}

fn bin() -> Command {
    Command::cargo_bin(BIN).expect("binary should be built")
}

/// Write a generated dataset with `count` entries into `dir`
fn write_dataset(dir: &TempDir, name: &str, count: usize) -> Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, to_data_js(&TestData::dataset(count))?)?;
    Ok(path)
}

/// **What is tested:** Validation of the real sample data file
/// **Why it is tested:** The shipped file is the reference for the format
/// **Test conditions:** Default options
/// **Expectations:** Success with one report, one entry and three benches
#[test]
fn test_validate_sample() {
    bin()
        .arg("validate")
        .arg(sample_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (1 reports, 1 entries, 3 benches, 0 errors"));
}

/// **What is tested:** The exact lastUpdate policy on the sample file
/// **Why it is tested:** The generator stamps lastUpdate slightly after the entry date
/// **Test conditions:** `--last-update exact`
/// **Expectations:** Failure naming the mismatch
#[test]
fn test_validate_sample_exact_policy() {
    bin()
        .args(["validate", "--last-update", "exact"])
        .arg(sample_path())
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "lastUpdate 1712415758809 does not satisfy 'exact'",
        ))
        .stdout(predicate::str::contains("FAILED"));
}

/// **What is tested:** Reading data from stdin
/// **Why it is tested:** Pipelines feed files through `-`
/// **Test conditions:** Sample file on stdin
/// **Expectations:** Success, label is `<stdin>`
#[test]
fn test_validate_stdin() -> Result {
    let contents = fs::read_to_string(sample_path())?;
    bin()
        .args(["validate", "-"])
        .write_stdin(contents)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<stdin>: ok"));
    Ok(())
}

/// **What is tested:** Error reporting for files that are not data files
/// **Why it is tested:** Users must see where parsing failed
/// **Test conditions:** Prefix present but JSON truncated
/// **Expectations:** Non-zero exit, stderr names the file and the JSON error
#[test]
fn test_validate_unparsable() -> Result {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("data.js");
    fs::write(&path, "window.BENCHMARK_DATA = {\n  \"lastUpdate\": 1,\n")?;

    bin()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"))
        .stderr(predicate::str::contains("JSON error at line"));
    Ok(())
}

/// **What is tested:** Strict mode turning warnings into failures
/// **Why it is tested:** CI gates may want a spotless file
/// **Test conditions:** Dataset whose only entry has no benches
/// **Expectations:** Lenient run passes, strict run fails
#[test]
fn test_validate_strict_warnings() -> Result {
    let temp_dir = TempDir::new()?;
    let dataset = TestData::with_entries(vec![TestData::entry(0, &[])]);
    let path = temp_dir.path().join("data.js");
    fs::write(&path, to_data_js(&dataset)?)?;

    bin()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("entry has no benches"));
    bin()
        .args(["validate", "--strict"])
        .arg(&path)
        .assert()
        .failure();
    Ok(())
}

/// **What is tested:** Append-only comparison in both directions
/// **Why it is tested:** A newer file must extend, never rewrite, the older one
/// **Test conditions:** Files with 2 and 4 entries
/// **Expectations:** old->new passes with two appended entries, new->old fails
#[test]
fn test_compare() -> Result {
    let temp_dir = TempDir::new()?;
    let old = write_dataset(&temp_dir, "old.js", 2)?;
    let new = write_dataset(&temp_dir, "new.js", 4)?;

    bin()
        .arg("compare")
        .arg(&old)
        .arg(&new)
        .assert()
        .success()
        .stdout(predicate::str::contains("[Benchmark Results] 2 retained, 2 appended"))
        .stdout(predicate::str::contains(": append-only"));

    bin()
        .arg("compare")
        .arg(&new)
        .arg(&old)
        .assert()
        .failure()
        .stdout(predicate::str::contains("shrank from 4 to 2 entries"))
        .stdout(predicate::str::contains("NOT append-only"));
    Ok(())
}

/// **What is tested:** Canonical layout check on the sample file
/// **Why it is tested:** Rendering must match what the generator writes
/// **Test conditions:** `normalize --check` on the sample
/// **Expectations:** Success, no output
#[test]
fn test_normalize_check_sample() {
    bin()
        .args(["normalize", "--check"])
        .arg(sample_path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

/// **What is tested:** In-place normalization
/// **Why it is tested:** Hand-edited files should be restorable to the canonical layout
/// **Test conditions:** Compact single-line JSON after the prefix
/// **Expectations:** `--check` fails before, `--write` fixes it, `--check` passes after
#[test]
fn test_normalize_write() -> Result {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("data.js");
    let compact = serde_json::to_string(&TestData::dataset(2))?;
    fs::write(&path, format!("window.BENCHMARK_DATA = {compact};\n"))?;

    bin()
        .args(["normalize", "--check"])
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("not in canonical layout"));
    bin()
        .args(["normalize", "--write"])
        .arg(&path)
        .assert()
        .success();
    bin()
        .args(["normalize", "--check"])
        .arg(&path)
        .assert()
        .success();

    let rewritten = fs::read_to_string(&path)?;
    assert_eq!(rewritten, to_data_js(&TestData::dataset(2))?);
    Ok(())
}

/// **What is tested:** `--write` with stdin input
/// **Why it is tested:** There is no file to replace
/// **Test conditions:** `normalize --write -`
/// **Expectations:** Failure with a clear message
#[test]
fn test_normalize_write_stdin_rejected() -> Result {
    bin()
        .args(["normalize", "--write", "-"])
        .write_stdin(fs::read_to_string(sample_path())?)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--write needs a file"));
    Ok(())
}

/// **What is tested:** Discovery and bulk validation of data files
/// **Why it is tested:** Pages branches host many projects
/// **Test conditions:** Two valid files, one broken file, one ignored file
/// **Expectations:** Listing shows three files; `--check` fails because of the broken one
#[test]
fn test_scan() -> Result {
    let temp_dir = TempDir::new()?;
    fs::create_dir_all(temp_dir.path().join("alpha"))?;
    fs::create_dir_all(temp_dir.path().join("beta"))?;
    fs::create_dir_all(temp_dir.path().join("gamma"))?;
    fs::create_dir_all(temp_dir.path().join("vendor"))?;
    write_dataset(&temp_dir, "alpha/data.js", 2)?;
    write_dataset(&temp_dir, "beta/data.js", 3)?;
    write_dataset(&temp_dir, "vendor/data.js", 1)?;
    fs::write(temp_dir.path().join("gamma/data.js"), "not a data file")?;
    fs::write(temp_dir.path().join(".ignore"), "vendor/\n")?;

    let listing = bin().arg("scan").arg(temp_dir.path()).assert().success();
    let stdout = String::from_utf8_lossy(&listing.get_output().stdout).into_owned();
    assert_eq!(stdout.lines().count(), 3);
    assert!(!stdout.contains("vendor"));

    bin()
        .args(["scan", "--check"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("UNPARSABLE"))
        .stdout(predicate::str::contains("3 entries"));
    Ok(())
}

/// **What is tested:** Series listing filtered by group
/// **Why it is tested:** Bench names are hierarchical
/// **Test conditions:** Generated dataset, `--bench Caputo`
/// **Expectations:** Both Caputo benches listed, RL bench absent
#[test]
fn test_series_group() -> Result {
    let temp_dir = TempDir::new()?;
    let path = write_dataset(&temp_dir, "data.js", 3)?;

    bin()
        .args(["series", "--bench", "Caputo"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Caputo/CaputoL1"))
        .stdout(predicate::str::contains("Caputo/CaputoTrap"))
        .stdout(predicate::str::contains("RL/RLDirect").not());
    Ok(())
}

/// **What is tested:** Unknown report names
/// **Why it is tested:** A typo should list the available reports
/// **Test conditions:** `--report Memory` against the sample
/// **Expectations:** Failure naming the available report
#[test]
fn test_series_unknown_report() {
    bin()
        .args(["series", "--report", "Memory"])
        .arg(sample_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Unknown report 'Memory' (available: Benchmark Results)",
        ));
}

/// **What is tested:** Decoding of the `extra` annotation
/// **Why it is tested:** Secondary statistics live only in that field
/// **Test conditions:** Sample file, `--bench Caputo/CaputoL1`
/// **Expectations:** Capture time in RFC 3339, then metrics and params one per line
#[test]
fn test_extra_sample() {
    bin()
        .args(["extra", "--bench", "Caputo/CaputoL1"])
        .arg(sample_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("82a0b46 2024-04-06T15:02:38.154+00:00"))
        .stdout(predicate::str::contains("  gctime = 0"))
        .stdout(predicate::str::contains("  params.samples = 10000"));
}

/// **What is tested:** `extra` for a bench that does not exist
/// **Why it is tested:** Silent empty output would hide typos
/// **Test conditions:** Unknown bench name
/// **Expectations:** Failure naming the bench
#[test]
fn test_extra_unknown_bench() {
    bin()
        .args(["extra", "--bench", "Nope/Nothing"])
        .arg(sample_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bench 'Nope/Nothing' not found"));
}

/// **What is tested:** Data path and report taken from git config
/// **Why it is tested:** Repositories configure non-default locations once
/// **Test conditions:** `bench-history.path` and `bench-history.report` set, no file argument
/// **Expectations:** Configured file is read; CLI `--report` overrides config
#[test]
fn test_git_config_defaults() -> Result {
    let repo = TestRepo::new()?;
    let dataset = TestData::dataset(2);
    repo.write("site/bench/data.js", &to_data_js(&dataset)?)?;
    repo.set_git_config("bench-history.path", "site/bench/data.js")?;
    repo.set_git_config("bench-history.report", "Memory")?;

    bin()
        .arg("validate")
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("site/bench/data.js: ok"));

    bin()
        .arg("series")
        .current_dir(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown report 'Memory'"));

    bin()
        .args(["series", "--report", "Benchmark Results"])
        .current_dir(repo.path())
        .assert()
        .success();
    Ok(())
}

/// **What is tested:** Invalid git config values
/// **Why it is tested:** Misconfiguration must be reported, not ignored
/// **Test conditions:** `bench-history.last-update` set to an unknown policy
/// **Expectations:** Failure mentioning the configuration
#[test]
fn test_invalid_git_config() -> Result {
    let repo = TestRepo::new()?;
    repo.set_git_config("bench-history.last-update", "sometimes")?;

    bin()
        .arg("validate")
        .arg(sample_path())
        .current_dir(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
    Ok(())
}

/// **What is tested:** Logging stays on stderr
/// **Why it is tested:** stdout is parsed by scripts
/// **Test conditions:** `-vv` with a successful run
/// **Expectations:** stdout holds only the report line
#[test]
fn test_verbose_keeps_stdout_clean() {
    let assert = bin()
        .args(["-vv", "validate"])
        .arg(sample_path())
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert_eq!(stdout.lines().count(), 1);
}
