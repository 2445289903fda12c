//! QuantReport Core — domain types for the result-reporting layer.
//!
//! This crate holds everything reporting needs that does not touch a file:
//! - Charts and series with the chronological append invariant
//! - The lock-guarded chart store shared by producer and reporter
//! - Trade ledger, order log, and portfolio snapshot
//! - Runtime statistics and the five-label status banner
//! - The `StatisticsCalculator` seam and its result type

pub mod banner;
pub mod chart;
pub mod ledger;
pub mod portfolio;
pub mod runtime_stats;
pub mod statistics;
pub mod store;

pub use banner::{format_cost, format_currency, format_percent, Banner, BannerBuilder, BannerLabel};
pub use chart::{
    Chart, ChartError, Sample, Series, SeriesKind, BENCHMARK_CHART, BENCHMARK_SERIES,
    DAILY_PERFORMANCE_SERIES, EQUITY_SERIES, STRATEGY_EQUITY_CHART,
};
pub use ledger::{OrderRecord, OrderStatus, TradeDirection, TradeLedger, TradeRecord};
pub use portfolio::PortfolioSnapshot;
pub use runtime_stats::RuntimeStatistics;
pub use statistics::{
    CalculatorError, CalculatorInput, PerformanceSummary, StatisticsCalculator, StatisticsResult,
};
pub use store::{ChartMap, ChartStore, SampleWrite};
