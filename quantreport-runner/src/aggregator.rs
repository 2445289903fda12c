//! Statistics aggregation — one reporting cycle's worth of derived metrics.
//!
//! `compute_statistics` never fails from the caller's point of view. It
//! returns a `StatisticsOutcome` describing what happened:
//! - `NotReady`: a required series is absent or empty; nothing to report yet
//! - `Failed`: the cycle errored or panicked, or the calculator returned a
//!   NaN or infinite metric; details go to the log
//! - `Computed`: the calculator's result, with the banner refreshed
//!
//! The banner is only written on `Computed`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info};

use quantreport_core::{
    Banner, BannerBuilder, CalculatorError, CalculatorInput, ChartMap, ChartStore,
    PortfolioSnapshot, StatisticsCalculator, StatisticsResult, TradeLedger, BENCHMARK_CHART,
    BENCHMARK_SERIES, DAILY_PERFORMANCE_SERIES, EQUITY_SERIES, STRATEGY_EQUITY_CHART,
};

/// What one call to [`StatisticsAggregator::compute_statistics`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StatisticsOutcome {
    Computed(StatisticsResult),
    NotReady { missing: Vec<&'static str> },
    Failed { reason: String },
}

impl StatisticsOutcome {
    pub fn is_computed(&self) -> bool {
        matches!(self, StatisticsOutcome::Computed(_))
    }

    pub fn result(&self) -> Option<&StatisticsResult> {
        match self {
            StatisticsOutcome::Computed(r) => Some(r),
            _ => None,
        }
    }

    /// The computed result, or an empty default for any other outcome.
    pub fn into_result(self) -> StatisticsResult {
        match self {
            StatisticsOutcome::Computed(r) => r,
            _ => StatisticsResult::default(),
        }
    }
}

/// Values of the three required series, copied out under one lock hold.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredSeries {
    pub equity: Vec<f64>,
    pub daily_performance: Vec<f64>,
    pub benchmark: Vec<f64>,
}

impl RequiredSeries {
    /// Extract all three series or report every one that is missing/empty.
    pub fn extract(charts: &ChartMap) -> Result<Self, Vec<&'static str>> {
        let lookup = |chart: &str, series: &str| {
            charts
                .get(chart)
                .and_then(|c| c.get(series))
                .filter(|s| !s.is_empty())
                .map(|s| s.values())
        };

        let equity = lookup(STRATEGY_EQUITY_CHART, EQUITY_SERIES);
        let daily_performance = lookup(STRATEGY_EQUITY_CHART, DAILY_PERFORMANCE_SERIES);
        let benchmark = lookup(BENCHMARK_CHART, BENCHMARK_SERIES);

        match (equity, daily_performance, benchmark) {
            (Some(equity), Some(daily_performance), Some(benchmark)) => Ok(Self {
                equity,
                daily_performance,
                benchmark,
            }),
            (e, p, b) => {
                let mut missing = Vec::new();
                if e.is_none() {
                    missing.push(EQUITY_SERIES);
                }
                if p.is_none() {
                    missing.push(DAILY_PERFORMANCE_SERIES);
                }
                if b.is_none() {
                    missing.push(BENCHMARK_SERIES);
                }
                Err(missing)
            }
        }
    }
}

pub struct StatisticsAggregator {
    calculator: Arc<dyn StatisticsCalculator>,
    banner: BannerBuilder,
}

impl StatisticsAggregator {
    pub fn new(calculator: Arc<dyn StatisticsCalculator>, banner: BannerBuilder) -> Self {
        Self { calculator, banner }
    }

    pub fn compute_statistics(
        &self,
        charts: &ChartStore,
        ledger: &TradeLedger,
        starting_portfolio_value: f64,
        portfolio: &PortfolioSnapshot,
        banner: &mut Banner,
    ) -> StatisticsOutcome {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_cycle(charts, ledger, starting_portfolio_value, portfolio, banner)
        }));

        attempt.unwrap_or_else(|payload| {
            let reason = format!("panic: {}", panic_message(payload.as_ref()));
            error!(
                %reason,
                starting_portfolio_value,
                trades = ledger.closed_trades().len(),
                "statistics computation panicked; reporting an empty result"
            );
            StatisticsOutcome::Failed { reason }
        })
    }

    fn run_cycle(
        &self,
        charts: &ChartStore,
        ledger: &TradeLedger,
        starting_portfolio_value: f64,
        portfolio: &PortfolioSnapshot,
        banner: &mut Banner,
    ) -> StatisticsOutcome {
        let series = match charts.with_charts(RequiredSeries::extract) {
            Ok(series) => series,
            Err(missing) => {
                debug!(?missing, "statistics not ready: required series unavailable");
                return StatisticsOutcome::NotReady { missing };
            }
        };

        match self.compute_with(&series, ledger, starting_portfolio_value, portfolio, banner) {
            Ok(result) => {
                info!(
                    equity_points = series.equity.len(),
                    trades = ledger.closed_trades().len(),
                    "statistics computed"
                );
                StatisticsOutcome::Computed(result)
            }
            Err(e) => {
                let reason = e.to_string();
                error!(
                    %reason,
                    starting_portfolio_value,
                    equity_points = series.equity.len(),
                    performance_points = series.daily_performance.len(),
                    benchmark_points = series.benchmark.len(),
                    trades = ledger.closed_trades().len(),
                    "statistics computation failed; reporting an empty result"
                );
                StatisticsOutcome::Failed { reason }
            }
        }
    }

    fn compute_with(
        &self,
        series: &RequiredSeries,
        ledger: &TradeLedger,
        starting_portfolio_value: f64,
        portfolio: &PortfolioSnapshot,
        banner: &mut Banner,
    ) -> Result<StatisticsResult, CalculatorError> {
        let profit_loss = ledger.profit_loss_record();
        let total_transactions = ledger.filled_order_count();

        let input = CalculatorInput {
            closed_trades: ledger.closed_trades(),
            profit_loss: &profit_loss,
            equity: &series.equity,
            daily_performance: &series.daily_performance,
            benchmark: &series.benchmark,
            starting_portfolio_value,
            total_fees: portfolio.total_fees,
            total_transactions,
        };
        let result = self.calculator.generate(&input)?;
        if let Some(metric) = result
            .total_performance
            .as_ref()
            .and_then(|p| p.first_non_finite())
        {
            return Err(CalculatorError::Failed(format!(
                "calculator produced a non-finite {metric}"
            )));
        }

        let net_return = portfolio.net_return(starting_portfolio_value);
        self.banner.update(banner, portfolio, net_return);

        Ok(result)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
