//! Bench `extra` annotation decoding
//!
//! The benchmark action stores secondary statistics in a free-text field:
//! `key=value` lines followed by a `params=` line holding a serialized
//! parameter record. Julia's BenchmarkTools writes for example:
//!
//! ```text
//! gctime=0
//! memory=0
//! allocs=0
//! params={"gctrial":true,"samples":10000,"evals":7}
//! ```
//!
//! Decoding never fails: unrecognized lines are kept as notes and an
//! unparsable params record is kept verbatim, so [`BenchExtra`] always
//! renders back to its input.

use serde_json::{Map, Value};
use std::fmt;

/// Key of the trailing serialized parameter record
pub const PARAMS_KEY: &str = "params";

/// One line of an `extra` annotation
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraLine {
    /// `key=value`
    Metric { key: String, value: String },
    /// `params=<json object>` that decoded successfully
    Params { raw: String, record: Map<String, Value> },
    /// `params=...` whose payload is not a JSON object
    MalformedParams { raw: String },
    /// Anything else
    Note(String),
}

/// Decoded `extra` annotation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchExtra {
    lines: Vec<ExtraLine>,
}

impl BenchExtra {
    /// Decode an annotation
    pub fn parse(text: &str) -> Self {
        let lines = text.split('\n').map(Self::parse_line).collect();
        Self { lines }
    }

    fn parse_line(line: &str) -> ExtraLine {
        match line.split_once('=') {
            Some((key, raw)) if key == PARAMS_KEY => {
                match serde_json::from_str::<Value>(raw) {
                    Ok(Value::Object(record)) => ExtraLine::Params {
                        raw: raw.to_owned(),
                        record,
                    },
                    _ => ExtraLine::MalformedParams {
                        raw: raw.to_owned(),
                    },
                }
            }
            Some((key, value)) if Self::is_key(key) => ExtraLine::Metric {
                key: key.to_owned(),
                value: value.to_owned(),
            },
            _ => ExtraLine::Note(line.to_owned()),
        }
    }

    /// Keys are short identifiers; anything with spaces is prose that happens to contain `=`
    fn is_key(key: &str) -> bool {
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    /// All decoded lines in input order
    pub fn lines(&self) -> &[ExtraLine] {
        &self.lines
    }

    /// `key=value` pairs in input order
    pub fn metrics(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            ExtraLine::Metric { key, value } => Some((key.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// Raw string value of a metric
    pub fn metric_str(&self, key: &str) -> Option<&str> {
        self.metrics().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Numeric value of a metric, if it parses as a number
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metric_str(key)?.trim().parse().ok()
    }

    /// Garbage-collection time
    pub fn gctime(&self) -> Option<f64> {
        self.metric("gctime")
    }

    /// Bytes allocated
    pub fn memory(&self) -> Option<f64> {
        self.metric("memory")
    }

    /// Allocation count
    pub fn allocs(&self) -> Option<f64> {
        self.metric("allocs")
    }

    /// Decoded parameter record
    pub fn params(&self) -> Option<&Map<String, Value>> {
        self.lines.iter().find_map(|line| match line {
            ExtraLine::Params { record, .. } => Some(record),
            _ => None,
        })
    }

    /// Raw parameter text, whether or not it decoded
    pub fn raw_params(&self) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            ExtraLine::Params { raw, .. } | ExtraLine::MalformedParams { raw } => {
                Some(raw.as_str())
            }
            _ => None,
        })
    }

    /// Whether a `params=` line is present but not a JSON object
    pub fn has_malformed_params(&self) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line, ExtraLine::MalformedParams { .. }))
    }

    /// Free-text lines that are neither metrics nor params
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            ExtraLine::Note(note) if !note.is_empty() => Some(note.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for ExtraLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraLine::Metric { key, value } => write!(f, "{key}={value}"),
            ExtraLine::Params { raw, .. } | ExtraLine::MalformedParams { raw } => {
                write!(f, "{PARAMS_KEY}={raw}")
            }
            ExtraLine::Note(note) => f.write_str(note),
        }
    }
}

impl fmt::Display for BenchExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}
