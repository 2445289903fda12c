//! The persisted result object for a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use quantreport_core::{ChartMap, OrderRecord, StatisticsResult, TradeRecord};

use crate::lifecycle::AlphaRuntimeStatistics;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub job_id: String,
    pub compile_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub starting_portfolio_value: f64,
    pub statistics: StatisticsResult,
    /// Host runtime statistics with the banner merged over them.
    pub runtime_statistics: BTreeMap<String, String>,
    pub charts: ChartMap,
    pub closed_trades: Vec<TradeRecord>,
    pub orders: Vec<OrderRecord>,
    pub profit_loss: BTreeMap<DateTime<Utc>, f64>,
    pub alpha_statistics: AlphaRuntimeStatistics,
    pub subscribed_symbols: Vec<String>,
}

impl RunReport {
    /// Wall-clock run time in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
