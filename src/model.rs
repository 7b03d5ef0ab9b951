//! Benchmark history data model
//!
//! Typed representation of the `window.BENCHMARK_DATA` literal. Field names
//! follow the file format (`lastUpdate`, `repoUrl`, `tree_id`) through serde
//! renames; optional fields that are absent in the input stay absent on output.
//! Keys the model does not know are kept in each record's `other` map and
//! written back after the known fields, so rewriting a file never drops data.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Report name used by the generator when none is configured
pub const DEFAULT_REPORT: &str = "Benchmark Results";

/// Top-level record of a data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkDataset {
    /// Epoch milliseconds of the last write
    pub last_update: i64,
    /// Source repository URL
    pub repo_url: String,
    /// Report name to ordered entries
    pub entries: Suites,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl BenchmarkDataset {
    /// Largest capture date across every entry of every suite
    pub fn max_entry_date(&self) -> Option<i64> {
        self.entries
            .iter()
            .flat_map(|(_, entries)| entries.iter().map(|entry| entry.date))
            .max()
    }

    /// Total number of entries across all suites
    pub fn entry_count(&self) -> usize {
        self.entries.iter().map(|(_, entries)| entries.len()).sum()
    }
}

/// Ordered mapping from report name to its entries
///
/// Report names keep the order in which they appear in the file so a
/// parse/render cycle does not reorder suites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suites(Vec<(String, Vec<Entry>)>);

impl Suites {
    /// Create an empty mapping
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Entries of a report, if present
    pub fn get(&self, name: &str) -> Option<&[Entry]> {
        self.0
            .iter()
            .find(|(suite, _)| suite == name)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Mutable entries of a report, if present
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<Entry>> {
        self.0
            .iter_mut()
            .find(|(suite, _)| suite == name)
            .map(|(_, entries)| entries)
    }

    /// Insert or replace a report, keeping its original position on replace
    pub fn insert(&mut self, name: impl Into<String>, entries: Vec<Entry>) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(existing) => *existing = entries,
            None => self.0.push((name, entries)),
        }
    }

    /// Iterate over `(report name, entries)` in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.0
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Report names in file order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// Number of reports
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no reports
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<Entry>)> for Suites {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Entry>)>>(iter: I) -> Self {
        let mut suites = Suites::new();
        for (name, entries) in iter {
            suites.insert(name, entries);
        }
        suites
    }
}

impl Serialize for Suites {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, entries) in &self.0 {
            map.serialize_entry(name, entries)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Suites {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SuitesVisitor;

        impl<'de> Visitor<'de> for SuitesVisitor {
            type Value = Suites;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from report name to a list of entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Suites, A::Error> {
                let mut suites = Vec::with_capacity(access.size_hint().unwrap_or(1));
                while let Some((name, entries)) = access.next_entry::<String, Vec<Entry>>()? {
                    suites.push((name, entries));
                }
                Ok(Suites(suites))
            }
        }

        deserializer.deserialize_map(SuitesVisitor)
    }
}

/// One benchmark run tied to a single commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub commit: Commit,
    /// Capture time in epoch milliseconds
    pub date: i64,
    /// Name of the benchmark tool that produced the numbers
    pub tool: String,
    pub benches: Vec<Bench>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Entry {
    /// Capture time as a UTC timestamp
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        epoch_millis(self.date)
    }

    /// Find a bench by name
    pub fn bench(&self, name: &str) -> Option<&Bench> {
        self.benches.iter().find(|bench| bench.name == name)
    }

    /// Abbreviated commit id for display
    pub fn short_id(&self) -> &str {
        let id = self.commit.id.as_str();
        id.get(..7).unwrap_or(id)
    }
}

/// Commit metadata recorded with an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub author: Person,
    pub committer: Person,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    pub id: String,
    pub message: String,
    /// RFC 3339 commit time as written by the forge
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,
    pub url: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Commit {
    /// First line of the commit message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// Parsed commit timestamp
    pub fn parsed_timestamp(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.timestamp).map(|ts| ts.with_timezone(&Utc))
    }
}

/// Author or committer identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// One named measurement within an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bench {
    /// Hierarchical name such as `group/subgroup`
    pub name: String,
    /// Measured value, kept in its JSON number form
    pub value: serde_json::Number,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Free-text annotation, see [`crate::extra::BenchExtra`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    /// Keys outside the model, e.g. `biggerIsBetter`
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Bench {
    /// Value as a float
    pub fn value_f64(&self) -> f64 {
        self.value.as_f64().unwrap_or(f64::NAN)
    }
}

/// Convert epoch milliseconds into a UTC timestamp
pub fn epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
