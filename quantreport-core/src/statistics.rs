//! The statistics calculator seam and the result it produces.
//!
//! How metrics are computed is up to the `StatisticsCalculator`
//! implementation. Reporting code only moves its output around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::ledger::TradeRecord;

/// Numeric metrics for the full run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub compounding_annual_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub alpha: f64,
    pub beta: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub total_fees: f64,
    pub total_transactions: usize,
}

impl PerformanceSummary {
    /// Name of the first NaN or infinite metric, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("total_return", self.total_return),
            ("compounding_annual_return", self.compounding_annual_return),
            ("sharpe_ratio", self.sharpe_ratio),
            ("sortino_ratio", self.sortino_ratio),
            ("max_drawdown", self.max_drawdown),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("win_rate", self.win_rate),
            ("profit_factor", self.profit_factor),
            ("total_fees", self.total_fees),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

/// Calculator output. Either fully computed or left at `Default`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatisticsResult {
    #[serde(default)]
    pub total_performance: Option<PerformanceSummary>,
    /// Human-readable metric name → display string.
    #[serde(default)]
    pub summary: BTreeMap<String, String>,
}

impl StatisticsResult {
    pub fn is_empty(&self) -> bool {
        self.total_performance.is_none() && self.summary.is_empty()
    }
}

/// Everything the calculator receives for one reporting cycle.
#[derive(Debug, Clone, Copy)]
pub struct CalculatorInput<'a> {
    pub closed_trades: &'a [TradeRecord],
    pub profit_loss: &'a BTreeMap<DateTime<Utc>, f64>,
    pub equity: &'a [f64],
    pub daily_performance: &'a [f64],
    pub benchmark: &'a [f64],
    pub starting_portfolio_value: f64,
    pub total_fees: f64,
    pub total_transactions: usize,
}

#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("invalid calculator input: {0}")]
    InvalidInput(String),
    #[error("calculation failed: {0}")]
    Failed(String),
}

pub trait StatisticsCalculator: Send + Sync {
    fn generate(&self, input: &CalculatorInput<'_>) -> Result<StatisticsResult, CalculatorError>;
}
