//! ChartStore — the shared chart collection written by the producer loop and
//! read by reporting cycles.
//!
//! Locking is coarse: one `RwLock` guards the whole map. Every read or write of
//! any chart goes through it, so two series read inside one `with_charts` call
//! always reflect the same cutoff.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::chart::{check_append, Chart, ChartError, Sample};

pub type ChartMap = BTreeMap<String, Chart>;

/// One append request for [`ChartStore::sample_many`].
#[derive(Debug, Clone, Copy)]
pub struct SampleWrite<'a> {
    pub chart: &'a str,
    pub series: &'a str,
    pub sample: Sample,
}

#[derive(Debug, Default)]
pub struct ChartStore {
    charts: RwLock<ChartMap>,
}

impl ChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with shared access to the full chart map. Writers are excluded
    /// for the whole call.
    pub fn with_charts<R>(&self, f: impl FnOnce(&ChartMap) -> R) -> R {
        let charts = self.charts.read();
        f(&charts)
    }

    /// Run `f` with exclusive access to the full chart map.
    pub fn with_charts_mut<R>(&self, f: impl FnOnce(&mut ChartMap) -> R) -> R {
        let mut charts = self.charts.write();
        f(&mut charts)
    }

    /// Append one sample, creating the chart and series on first use.
    pub fn sample(&self, chart: &str, series: &str, sample: Sample) -> Result<(), ChartError> {
        self.with_charts_mut(|charts| push(charts, chart, series, sample))
    }

    /// Append several samples under a single lock acquisition.
    ///
    /// Every write is checked before anything is appended, against the stored
    /// series and against earlier writes to the same series in the batch, so a
    /// rejected sample leaves every series untouched.
    pub fn sample_many(&self, writes: &[SampleWrite<'_>]) -> Result<(), ChartError> {
        self.with_charts_mut(|charts| {
            let mut pending: Vec<(&str, &str, DateTime<Utc>)> = Vec::with_capacity(writes.len());
            for w in writes {
                let queued = pending
                    .iter()
                    .position(|(chart, series, _)| *chart == w.chart && *series == w.series);
                let last = match queued {
                    Some(i) => Some(pending[i].2),
                    None => charts
                        .get(w.chart)
                        .and_then(|c| c.get(w.series))
                        .and_then(|s| s.last())
                        .map(|s| s.time),
                };
                check_append(w.series, last, &w.sample)?;
                match queued {
                    Some(i) => pending[i].2 = w.sample.time,
                    None => pending.push((w.chart, w.series, w.sample.time)),
                }
            }
            for w in writes {
                push(charts, w.chart, w.series, w.sample)?;
            }
            Ok(())
        })
    }

    /// Deep copy of every chart, taken under one read-lock acquisition.
    pub fn snapshot(&self) -> ChartMap {
        self.with_charts(|charts| charts.clone())
    }

    /// Number of samples in a series, `None` if the chart or series is absent.
    pub fn series_len(&self, chart: &str, series: &str) -> Option<usize> {
        self.with_charts(|charts| charts.get(chart)?.get(series).map(|s| s.len()))
    }

    pub fn chart_names(&self) -> Vec<String> {
        self.with_charts(|charts| charts.keys().cloned().collect())
    }
}

fn push(charts: &mut ChartMap, chart: &str, series: &str, sample: Sample) -> Result<(), ChartError> {
    charts
        .entry(chart.to_string())
        .or_insert_with(|| Chart::new(chart))
        .series_mut(series)
        .push(sample)
}
