//! CLI entry point for bench-history
//!
//! Validates, compares and audits continuous-benchmarking data files.

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use bench_history::config::CliArgs;
use bench_history::history::SnapshotStatus;
use bench_history::scan::DEFAULT_FILE_NAME;
use bench_history::{
    audit_history, check_append_only, find_data_files, logging, parse_data_js, read_dataset,
    select_report, to_data_js, write_dataset_atomic, AppConfig, BenchExtra, BenchmarkDataset, GitSnapshotSource,
    LastUpdatePolicy, SeriesIndex, Validator,
};

/// Reader, validator and history auditor for benchmark data.js files
#[derive(Parser, Debug)]
#[command(name = "bench-history")]
#[command(version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Report name inside `entries` (overrides git config)
    #[arg(long, value_name = "NAME", global = true)]
    report: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a data file for integrity problems
    Validate {
        /// Data file, `-` for stdin (default: configured path)
        file: Option<PathBuf>,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,

        /// How lastUpdate must relate to the newest entry
        #[arg(long, value_enum, value_name = "POLICY")]
        last_update: Option<LastUpdatePolicy>,
    },

    /// Check that NEW only appends entries to OLD
    Compare {
        /// Older snapshot
        old: PathBuf,
        /// Newer snapshot
        new: PathBuf,
    },

    /// Audit every committed version of a data file
    History {
        /// Data file in the work tree (default: configured path)
        file: Option<PathBuf>,

        /// Data file path relative to the repository root (overrides git config)
        #[arg(long, value_name = "REL_PATH", conflicts_with = "file")]
        path: Option<String>,

        /// Directory inside the repository to audit
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,

        /// Fail on validation warnings as well as errors
        #[arg(long)]
        strict: bool,

        /// How lastUpdate must relate to the newest entry
        #[arg(long, value_enum, value_name = "POLICY")]
        last_update: Option<LastUpdatePolicy>,
    },

    /// Find data files below a directory, honoring .gitignore
    Scan {
        /// Directory to search
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// File name to look for
        #[arg(long, default_value = DEFAULT_FILE_NAME)]
        name: String,

        /// Validate every file found
        #[arg(long)]
        check: bool,
    },

    /// Show per-benchmark time series of a report
    Series {
        /// Data file, `-` for stdin (default: configured path)
        file: Option<PathBuf>,

        /// Bench name or group prefix
        #[arg(long, value_name = "NAME")]
        bench: Option<String>,
    },

    /// Decode the `extra` annotation of a bench across entries
    Extra {
        /// Data file, `-` for stdin (default: configured path)
        file: Option<PathBuf>,

        /// Exact bench name
        #[arg(long, value_name = "NAME")]
        bench: String,
    },

    /// Rewrite a data file in the generator's canonical layout
    Normalize {
        /// Data file, `-` for stdin (default: configured path)
        file: Option<PathBuf>,

        /// Replace the file in place
        #[arg(long, conflicts_with = "check")]
        write: bool,

        /// Fail if the file is not already canonical
        #[arg(long)]
        check: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run a command; `Ok(false)` means the checks ran and failed
fn run(args: Args) -> anyhow::Result<bool> {
    let report = args.report;
    let config_for = |data_path: Option<String>,
                      last_update: Option<LastUpdatePolicy>,
                      strict: bool,
                      repo_dir: Option<PathBuf>| {
        AppConfig::from_cli(CliArgs {
            data_path,
            report: report.clone(),
            last_update,
            strict,
            repo_dir,
        })
        .context("Invalid configuration")
    };

    match args.command {
        Commands::Validate {
            file,
            strict,
            last_update,
        } => {
            let config = config_for(None, last_update, strict, None)?;
            run_validate(&config, file.as_deref())
        }
        Commands::Compare { old, new } => run_compare(&old, &new),
        Commands::History {
            file,
            path,
            repo,
            strict,
            last_update,
        } => {
            let config = config_for(path, last_update, strict, repo.clone())?;
            run_history(&config, file.as_deref(), repo.as_deref())
        }
        Commands::Scan { dir, name, check } => {
            let config = config_for(None, None, false, None)?;
            run_scan(&config, &dir, &name, check)
        }
        Commands::Series { file, bench } => {
            let config = config_for(None, None, false, None)?;
            run_series(&config, file.as_deref(), bench.as_deref())
        }
        Commands::Extra { file, bench } => {
            let config = config_for(None, None, false, None)?;
            run_extra(&config, file.as_deref(), &bench)
        }
        Commands::Normalize { file, write, check } => {
            let config = config_for(None, None, false, None)?;
            run_normalize(&config, file.as_deref(), write, check)
        }
    }
}

/// Where a command reads its data from
enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// Explicit file, `-`, or the configured path under the repository root
    fn resolve(file: Option<&Path>, config: &AppConfig) -> Self {
        match file {
            Some(path) if path == Path::new("-") => Input::Stdin,
            Some(path) => Input::File(path.to_path_buf()),
            None => {
                let base = env::current_dir()
                    .ok()
                    .and_then(|cwd| GitSnapshotSource::discover(cwd).ok())
                    .map(|source| source.root().to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."));
                Input::File(config.data_path().to_path(base))
            }
        }
    }

    fn label(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_owned(),
            Input::File(path) => path.display().to_string(),
        }
    }

    fn read_text(&self) -> anyhow::Result<String> {
        match self {
            Input::Stdin => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read stdin")?;
                Ok(text)
            }
            Input::File(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn load(&self) -> anyhow::Result<(String, BenchmarkDataset)> {
        let text = self.read_text()?;
        let dataset =
            parse_data_js(&text).with_context(|| format!("Failed to parse {}", self.label()))?;
        Ok((text, dataset))
    }
}

fn run_validate(config: &AppConfig, file: Option<&Path>) -> anyhow::Result<bool> {
    let input = Input::resolve(file, config);
    let (_, dataset) = input.load()?;
    Ok(print_validation(&input.label(), &dataset, config))
}

fn print_validation(label: &str, dataset: &BenchmarkDataset, config: &AppConfig) -> bool {
    let report = Validator::new(config.validation()).validate(dataset);
    for issue in &report.issues {
        println!("{label}: {issue}");
    }

    let passed = report.passed(config.strict());
    println!(
        "{label}: {} ({} reports, {} entries, {} benches, {} errors, {} warnings)",
        if passed { "ok" } else { "FAILED" },
        report.suites,
        report.entries,
        report.benches,
        report.errors().count(),
        report.warnings().count(),
    );
    passed
}

fn run_compare(old: &Path, new: &Path) -> anyhow::Result<bool> {
    let previous =
        read_dataset(old).with_context(|| format!("Failed to load {}", old.display()))?;
    let current =
        read_dataset(new).with_context(|| format!("Failed to load {}", new.display()))?;

    let report = check_append_only(&previous, &current);
    for delta in &report.suites {
        println!(
            "[{}] {} retained, {} appended{}",
            delta.suite,
            delta.retained,
            delta.appended,
            if delta.new_suite { " (new report)" } else { "" }
        );
    }
    for violation in &report.violations {
        println!("violation: {violation}");
    }

    let passed = report.is_append_only();
    println!(
        "{} -> {}: {}",
        old.display(),
        new.display(),
        if passed { "append-only" } else { "NOT append-only" }
    );
    Ok(passed)
}

fn run_history(
    config: &AppConfig,
    file: Option<&Path>,
    repo: Option<&Path>,
) -> anyhow::Result<bool> {
    let start = match repo {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let source = GitSnapshotSource::discover(&start)?;
    let path = match file {
        Some(file) => source.repo_relative(file)?,
        None => config.data_path().to_relative_path_buf(),
    };

    let report = audit_history(&source, &path, config.validation())?;
    info!(checked = report.checked(), "History audit finished");

    for outcome in &report.snapshots {
        let rev = &outcome.revision;
        let line = match &outcome.status {
            SnapshotStatus::Missing => "file absent".to_owned(),
            SnapshotStatus::Unparsable(reason) => format!("UNPARSABLE: {reason}"),
            SnapshotStatus::Checked {
                entries,
                validation,
                append,
            } => {
                let appended = append
                    .as_ref()
                    .map_or_else(|| "initial".to_owned(), |a| format!("+{}", a.appended()));
                let mut status = format!("{entries} entries ({appended})");
                if append.as_ref().is_some_and(|a| !a.is_append_only()) {
                    status.push_str(" NOT append-only");
                }
                if !validation.passed(config.strict()) {
                    status.push_str(" INVALID");
                }
                status
            }
        };
        println!("{} {}  {}  {}", rev.short_id(), rev.time, rev.summary, line);
    }

    for (rev, append) in report.append_failures() {
        for violation in &append.violations {
            println!("{}: violation: {violation}", rev.short_id());
        }
    }
    for (rev, validation) in report.validation_failures(config.strict()) {
        for issue in &validation.issues {
            println!("{}: {issue}", rev.short_id());
        }
    }

    let passed = report.passed(config.strict());
    println!(
        "{}: {} ({} revisions, {} checked)",
        report.path,
        if passed { "ok" } else { "FAILED" },
        report.snapshots.len(),
        report.checked()
    );
    Ok(passed)
}

fn run_scan(config: &AppConfig, dir: &Path, name: &str, check: bool) -> anyhow::Result<bool> {
    let files = find_data_files(dir, name)?;
    let mut passed = true;

    for file in &files {
        if !check {
            println!("{}", file.display());
            continue;
        }
        match read_dataset(file) {
            Ok(dataset) => {
                passed &= print_validation(&file.display().to_string(), &dataset, config);
            }
            Err(error) => {
                println!("{}: UNPARSABLE: {error:#}", file.display());
                passed = false;
            }
        }
    }

    if files.is_empty() {
        eprintln!("No {name} files found below {}", dir.display());
    }
    Ok(passed)
}

fn run_series(
    config: &AppConfig,
    file: Option<&Path>,
    bench: Option<&str>,
) -> anyhow::Result<bool> {
    let (_, dataset) = Input::resolve(file, config).load()?;
    let entries = select_report(&dataset, config.report())?;
    let index = SeriesIndex::from_entries(entries);

    let selected: Vec<_> = match bench {
        Some(name) => match index.get(name) {
            Some(series) => vec![series],
            None => index.group(name).collect(),
        },
        None => index.iter().collect(),
    };
    if selected.is_empty() {
        bail!("No benchmark matches '{}'", bench.unwrap_or_default());
    }

    println!("{:<40} {:>6} {:>8} {:>14} {:>9}", "bench", "unit", "points", "latest", "change");
    for series in selected {
        let latest = series
            .latest()
            .map_or_else(String::new, |point| format!("{}", point.value));
        let change = series
            .latest_change()
            .map_or_else(|| "-".to_owned(), |c| format!("{:+.2}%", c * 100.0));
        println!(
            "{:<40} {:>6} {:>8} {:>14} {:>9}",
            series.name,
            series.unit,
            series.points.len(),
            latest,
            change
        );
    }
    Ok(true)
}

fn run_extra(config: &AppConfig, file: Option<&Path>, bench: &str) -> anyhow::Result<bool> {
    let (_, dataset) = Input::resolve(file, config).load()?;
    let entries = select_report(&dataset, config.report())?;

    let mut shown = 0usize;
    for entry in entries {
        let Some(found) = entry.bench(bench) else {
            continue;
        };
        shown += 1;

        let captured = entry
            .captured_at()
            .map_or_else(|| entry.date.to_string(), |ts| ts.to_rfc3339());
        println!("{} {} value={} {}", entry.short_id(), captured, found.value, found.unit);

        let Some(extra) = found.extra.as_deref() else {
            continue;
        };
        let extra = BenchExtra::parse(extra);
        for (key, value) in extra.metrics() {
            println!("  {key} = {value}");
        }
        match (extra.params(), extra.raw_params()) {
            (Some(params), _) => {
                for (key, value) in params {
                    println!("  params.{key} = {value}");
                }
            }
            (None, Some(raw)) => println!("  params (malformed) = {raw}"),
            (None, None) => {}
        }
        for note in extra.notes() {
            println!("  note: {note}");
        }
    }

    if shown == 0 {
        bail!("Bench '{bench}' not found in report '{}'", config.report());
    }
    Ok(true)
}

fn run_normalize(
    config: &AppConfig,
    file: Option<&Path>,
    write: bool,
    check: bool,
) -> anyhow::Result<bool> {
    let input = Input::resolve(file, config);
    let (text, dataset) = input.load()?;
    let rendered = to_data_js(&dataset)?;

    if check {
        let canonical = rendered == text;
        if !canonical {
            println!("{}: not in canonical layout", input.label());
        }
        return Ok(canonical);
    }

    if write {
        let Input::File(path) = &input else {
            bail!("--write needs a file, not stdin");
        };
        write_dataset_atomic(path, &dataset)?;
        info!(path = %path.display(), "Normalized");
        return Ok(true);
    }

    print!("{rendered}");
    Ok(true)
}
