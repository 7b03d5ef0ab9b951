//! Logging setup for the CLI
//!
//! Diagnostics go to stderr through `tracing`; stdout carries only command
//! output so it can be piped.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the log filter
pub const LOG_ENV: &str = "BENCH_HISTORY_LOG";

/// Log level for a `-v` count, `-q` wins over any count
pub fn level_for(verbosity: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber
///
/// `BENCH_HISTORY_LOG` takes precedence over the verbosity flags. Calling
/// this twice is harmless; the second subscriber is discarded.
pub fn init(verbosity: u8, quiet: bool) {
    let default_level = level_for(verbosity, quiet);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let directive = format!(
            "bench_history={}",
            default_level.as_str().to_ascii_lowercase()
        );
        EnvFilter::new(directive)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
