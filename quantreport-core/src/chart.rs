//! Named, timestamped sample collections.
//!
//! A `Chart` owns a set of uniquely named `Series`. Each series is append-only
//! and strictly chronological: a sample older than the last one is rejected.
//! Values must be finite, so every stored series serializes to plain JSON
//! numbers. Deserialization re-checks both rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Chart holding the strategy's own curves.
pub const STRATEGY_EQUITY_CHART: &str = "Strategy Equity";
/// Portfolio value series inside [`STRATEGY_EQUITY_CHART`].
pub const EQUITY_SERIES: &str = "Equity";
/// Daily return series inside [`STRATEGY_EQUITY_CHART`].
pub const DAILY_PERFORMANCE_SERIES: &str = "Daily Performance";
/// Chart holding the benchmark curve.
pub const BENCHMARK_CHART: &str = "Benchmark";
/// Benchmark value series inside [`BENCHMARK_CHART`].
pub const BENCHMARK_SERIES: &str = "Benchmark";

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("sample at {time} is older than last sample at {last} in series '{series}'")]
    OutOfOrder {
        series: String,
        time: DateTime<Utc>,
        last: DateTime<Utc>,
    },
    #[error("non-finite value {value} at {time} in series '{series}'")]
    NonFinite {
        series: String,
        time: DateTime<Utc>,
        value: f64,
    },
}

/// One `(timestamp, value)` point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// How a series should be drawn by a front end.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    #[default]
    Line,
    Bar,
    Scatter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "SeriesRecord")]
pub struct Series {
    pub name: String,
    pub unit: String,
    pub kind: SeriesKind,
    samples: Vec<Sample>,
}

/// Unchecked wire form of a [`Series`].
#[derive(Deserialize)]
struct SeriesRecord {
    name: String,
    unit: String,
    kind: SeriesKind,
    samples: Vec<Sample>,
}

impl TryFrom<SeriesRecord> for Series {
    type Error = ChartError;

    fn try_from(record: SeriesRecord) -> Result<Self, Self::Error> {
        let mut series = Series::new(record.name)
            .with_unit(record.unit)
            .with_kind(record.kind);
        series.samples.reserve(record.samples.len());
        for sample in record.samples {
            series.push(sample)?;
        }
        Ok(series)
    }
}

/// Check that `sample` may follow a series whose newest sample is at `last`.
pub(crate) fn check_append(
    series: &str,
    last: Option<DateTime<Utc>>,
    sample: &Sample,
) -> Result<(), ChartError> {
    if !sample.value.is_finite() {
        return Err(ChartError::NonFinite {
            series: series.to_string(),
            time: sample.time,
            value: sample.value,
        });
    }
    match last {
        Some(last) if sample.time < last => Err(ChartError::OutOfOrder {
            series: series.to_string(),
            time: sample.time,
            last,
        }),
        _ => Ok(()),
    }
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: "$".into(),
            kind: SeriesKind::Line,
            samples: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_kind(mut self, kind: SeriesKind) -> Self {
        self.kind = kind;
        self
    }

    /// Append a sample. Equal timestamps are allowed; earlier ones are not,
    /// and neither are NaN or infinite values.
    pub fn push(&mut self, sample: Sample) -> Result<(), ChartError> {
        check_append(&self.name, self.last().map(|s| s.time), &sample)?;
        self.samples.push(sample);
        Ok(())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sample values in insertion order.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chart {
    pub name: String,
    pub series: BTreeMap<String, Series>,
}

impl Chart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: BTreeMap::new(),
        }
    }

    /// Get a series by name, creating an empty line series on first use.
    pub fn series_mut(&mut self, name: &str) -> &mut Series {
        self.series
            .entry(name.to_string())
            .or_insert_with(|| Series::new(name))
    }

    /// Register a series with custom unit/kind. An existing series of the
    /// same name is kept as-is.
    pub fn add_series(&mut self, series: Series) {
        self.series.entry(series.name.clone()).or_insert(series);
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }
}
