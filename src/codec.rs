//! Data file codec
//!
//! Reads and writes the `window.BENCHMARK_DATA = {...}` script emitted by the
//! benchmark action. Bare JSON objects are accepted on input so exported or
//! hand-trimmed files can be checked with the same tools.

use crate::error::{Error, Result, ResultExt};
use crate::model::BenchmarkDataset;
use memchr::memmem;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Global the generated script assigns to
pub const DATA_GLOBAL: &str = "window.BENCHMARK_DATA";

/// Prefix written in front of the JSON literal
pub const SCRIPT_PREFIX: &str = "window.BENCHMARK_DATA = ";

/// Location of the JSON literal inside the input text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Payload<'a> {
    json: &'a str,
    /// Byte offset of `json` within the input
    offset: usize,
}

/// Locate the JSON literal, either after the assignment or as the whole input
///
/// The assignment is only looked for ahead of the first `{`; string values
/// inside the object may quote it.
fn locate_payload(text: &str) -> Result<Payload<'_>> {
    let bytes = text.as_bytes();
    let head = &bytes[..memchr::memchr(b'{', bytes).unwrap_or(bytes.len())];

    let start = match memmem::find(head, DATA_GLOBAL.as_bytes()) {
        Some(global) => {
            let after_global = global + DATA_GLOBAL.len();
            let eq = memchr::memchr(b'=', &bytes[after_global..]).ok_or_else(|| {
                Error::MissingPayload(format!("'{DATA_GLOBAL}' is never assigned"))
            })?;
            after_global + eq + 1
        }
        None => 0,
    };

    let rest = &text[start..];
    let leading = rest.len() - rest.trim_start().len();
    let json = rest.trim().trim_end_matches(';').trim_end();

    if !json.starts_with('{') {
        return Err(Error::MissingPayload(
            "expected a JSON object or a window.BENCHMARK_DATA assignment".to_owned(),
        ));
    }

    Ok(Payload {
        json,
        offset: start + leading,
    })
}

/// Parse the contents of a data file
pub fn parse_data_js(text: &str) -> Result<BenchmarkDataset> {
    let payload = locate_payload(text)?;

    serde_json::from_str(payload.json).map_err(|source| {
        // Report positions relative to the whole file, not the payload
        let prefix = &text[..payload.offset];
        let line_offset = memchr::memchr_iter(b'\n', prefix.as_bytes()).count();
        let column_offset = prefix.rfind('\n').map_or(prefix.len(), |nl| prefix.len() - nl - 1);
        let line = source.line() + line_offset;
        let column = if source.line() == 1 {
            source.column() + column_offset
        } else {
            source.column()
        };
        Error::Json {
            line,
            column,
            source,
        }
    })
}

/// Render a dataset the way the benchmark action writes it
///
/// Two-space indentation, no trailing newline.
pub fn to_data_js(dataset: &BenchmarkDataset) -> Result<String> {
    let json = serde_json::to_string_pretty(dataset)?;
    Ok(format!("{SCRIPT_PREFIX}{json}"))
}

/// Read and parse a data file from disk
pub fn read_dataset(path: impl AsRef<Path>) -> Result<BenchmarkDataset> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading benchmark data");
    let text = fs::read_to_string(path)
        .map_err(|e| Error::processing_error(format!("Failed to read {}: {e}", path.display())))?;
    parse_data_js(&text).with_context(|| path.display().to_string())
}

/// Replace `path` with the rendered dataset through a sibling temporary file
pub fn write_dataset_atomic(path: impl AsRef<Path>, dataset: &BenchmarkDataset) -> Result<()> {
    let path = path.as_ref();
    let rendered = to_data_js(dataset)?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(rendered.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    debug!(path = %path.display(), bytes = rendered.len(), "Wrote benchmark data");
    Ok(())
}
