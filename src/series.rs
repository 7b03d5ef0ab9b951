//! Per-benchmark time series
//!
//! Bench names are stable across entries, so grouping by name turns a report
//! into one series per benchmark, ordered like the entries.

use crate::model::Entry;
use std::collections::BTreeMap;

/// One measurement of a benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Capture time in epoch milliseconds
    pub date: i64,
    pub commit: String,
    pub value: f64,
}

/// All measurements of one benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    /// Unit of the most recent point
    pub unit: String,
    pub points: Vec<Point>,
}

impl Series {
    /// Most recent point
    pub fn latest(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Relative change of the last point against the one before it
    ///
    /// `None` with fewer than two points or when the previous value is zero.
    pub fn latest_change(&self) -> Option<f64> {
        match self.points.as_slice() {
            [.., before, last] if before.value != 0.0 => {
                Some((last.value - before.value) / before.value)
            }
            _ => None,
        }
    }

    /// Smallest and largest value seen
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().map(|p| p.value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Series of a report keyed by bench name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesIndex {
    series: BTreeMap<String, Series>,
}

impl SeriesIndex {
    /// Group the benches of a report by name
    pub fn from_entries(entries: &[Entry]) -> Self {
        let mut series: BTreeMap<String, Series> = BTreeMap::new();

        for entry in entries {
            for bench in &entry.benches {
                let point = Point {
                    date: entry.date,
                    commit: entry.commit.id.clone(),
                    value: bench.value_f64(),
                };
                let s = series
                    .entry(bench.name.clone())
                    .or_insert_with(|| Series {
                        name: bench.name.clone(),
                        unit: String::new(),
                        points: Vec::new(),
                    });
                s.unit.clone_from(&bench.unit);
                s.points.push(point);
            }
        }

        Self { series }
    }

    /// Series of one bench
    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    /// All series sorted by bench name
    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    /// Series whose name starts with the `group/` prefix
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Series> + 'a {
        self.series.values().filter(move |s| {
            s.name
                .strip_prefix(group)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
