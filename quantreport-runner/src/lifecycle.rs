//! Reporting lifecycle — run identity, shared reporting state, and the
//! collaborators a reporting cycle reads from.
//!
//! Construction goes through [`ReportingLifecycleBuilder`]: `build()` refuses
//! to produce a lifecycle until every collaborator is attached.
//!
//! Banner and runtime statistics sit behind their own mutexes, and
//! `run_report_cycle` holds a cycle mutex, so overlapping triggers (scheduler
//! plus end-of-run caller) take turns instead of racing on the banner.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use quantreport_core::{
    Banner, BannerBuilder, ChartError, ChartStore, PortfolioSnapshot, RuntimeStatistics, Sample,
    SampleWrite, StatisticsCalculator, TradeLedger, BENCHMARK_CHART, BENCHMARK_SERIES,
    DAILY_PERFORMANCE_SERIES, EQUITY_SERIES, STRATEGY_EQUITY_CHART,
};

use crate::aggregator::{StatisticsAggregator, StatisticsOutcome};
use crate::config::ReportingConfig;
use crate::metrics::StandardCalculator;
use crate::persist::{PersistError, ResultPersister};
use crate::report::{RunReport, SCHEMA_VERSION};

/// Owner of the trade ledger and portfolio totals.
pub trait ExecutionEngine: Send + Sync {
    fn trade_ledger(&self) -> TradeLedger;
    fn portfolio(&self) -> PortfolioSnapshot;
}

/// Source of the run's data subscriptions.
pub trait SubscriptionManager: Send + Sync {
    fn subscribed_symbols(&self) -> Vec<String>;
}

/// Insight counters published by an alpha model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlphaRuntimeStatistics {
    pub total_insights_generated: u64,
    pub total_insights_closed: u64,
    pub total_insights_analysis_completed: u64,
    pub mean_population_score: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("cannot build reporting lifecycle: {0} not attached")]
    MissingCollaborator(&'static str),
}

/// Result of one reporting cycle.
#[derive(Debug, Clone)]
pub struct ReportCycle {
    pub outcome: StatisticsOutcome,
    /// Banner as it stands after the cycle.
    pub banner: Banner,
}

/// Files written by [`ReportingLifecycle::persist`].
#[derive(Debug, Clone)]
pub struct PersistedPaths {
    pub logs: std::path::PathBuf,
    pub results: std::path::PathBuf,
}

pub struct ReportingLifecycleBuilder {
    engine: Option<Arc<dyn ExecutionEngine>>,
    subscriptions: Option<Arc<dyn SubscriptionManager>>,
    alpha: Option<AlphaRuntimeStatistics>,
    calculator: Option<Arc<dyn StatisticsCalculator>>,
    currency_symbol: String,
    risk_free_rate: f64,
    job_id: String,
    compile_id: String,
    starting_portfolio_value: Option<f64>,
}

impl Default for ReportingLifecycleBuilder {
    fn default() -> Self {
        Self {
            engine: None,
            subscriptions: None,
            alpha: None,
            calculator: None,
            currency_symbol: "$".into(),
            risk_free_rate: 0.0,
            job_id: String::new(),
            compile_id: String::new(),
            starting_portfolio_value: None,
        }
    }
}

impl ReportingLifecycleBuilder {
    pub fn engine(mut self, engine: Arc<dyn ExecutionEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn subscriptions(mut self, subscriptions: Arc<dyn SubscriptionManager>) -> Self {
        self.subscriptions = Some(subscriptions);
        self
    }

    pub fn alpha_statistics(mut self, alpha: AlphaRuntimeStatistics) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Replace the default [`StandardCalculator`].
    pub fn calculator(mut self, calculator: Arc<dyn StatisticsCalculator>) -> Self {
        self.calculator = Some(calculator);
        self
    }

    pub fn currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn job_id(mut self, id: impl Into<String>) -> Self {
        self.job_id = id.into();
        self
    }

    pub fn compile_id(mut self, id: impl Into<String>) -> Self {
        self.compile_id = id.into();
        self
    }

    /// Defaults to the engine's portfolio value at `build()` time.
    pub fn starting_portfolio_value(mut self, value: f64) -> Self {
        self.starting_portfolio_value = Some(value);
        self
    }

    pub fn with_config(mut self, config: &ReportingConfig) -> Self {
        self.currency_symbol = config.currency_symbol.clone();
        self.risk_free_rate = config.risk_free_rate;
        self
    }

    pub fn build(self) -> Result<ReportingLifecycle, LifecycleError> {
        let engine = self
            .engine
            .ok_or(LifecycleError::MissingCollaborator("execution engine"))?;
        let subscriptions = self
            .subscriptions
            .ok_or(LifecycleError::MissingCollaborator("subscription manager"))?;
        let alpha = self
            .alpha
            .ok_or(LifecycleError::MissingCollaborator("alpha statistics"))?;

        let starting_portfolio_value = self
            .starting_portfolio_value
            .unwrap_or_else(|| engine.portfolio().total_portfolio_value);
        let calculator = self
            .calculator
            .unwrap_or_else(|| Arc::new(StandardCalculator::new(self.risk_free_rate)));

        Ok(ReportingLifecycle {
            start_time: Utc::now(),
            job_id: self.job_id,
            compile_id: self.compile_id,
            starting_portfolio_value,
            charts: Arc::new(ChartStore::new()),
            runtime_statistics: Mutex::new(RuntimeStatistics::new()),
            banner: Mutex::new(Banner::new()),
            alpha: RwLock::new(alpha),
            log: Mutex::new(Vec::new()),
            engine,
            subscriptions,
            aggregator: StatisticsAggregator::new(
                calculator,
                BannerBuilder::new(self.currency_symbol),
            ),
            cycle: Mutex::new(()),
        })
    }
}

pub struct ReportingLifecycle {
    start_time: DateTime<Utc>,
    job_id: String,
    compile_id: String,
    starting_portfolio_value: f64,
    charts: Arc<ChartStore>,
    runtime_statistics: Mutex<RuntimeStatistics>,
    banner: Mutex<Banner>,
    alpha: RwLock<AlphaRuntimeStatistics>,
    log: Mutex<Vec<String>>,
    engine: Arc<dyn ExecutionEngine>,
    subscriptions: Arc<dyn SubscriptionManager>,
    aggregator: StatisticsAggregator,
    cycle: Mutex<()>,
}

impl ReportingLifecycle {
    pub fn builder() -> ReportingLifecycleBuilder {
        ReportingLifecycleBuilder::default()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn compile_id(&self) -> &str {
        &self.compile_id
    }

    pub fn starting_portfolio_value(&self) -> f64 {
        self.starting_portfolio_value
    }

    /// Shared chart store, for producers that sample directly.
    pub fn charts(&self) -> &Arc<ChartStore> {
        &self.charts
    }

    // ── Sampling ──

    pub fn sample_equity(&self, time: DateTime<Utc>, value: f64) -> Result<(), ChartError> {
        self.charts
            .sample(STRATEGY_EQUITY_CHART, EQUITY_SERIES, Sample::new(time, value))
    }

    pub fn sample_performance(&self, time: DateTime<Utc>, value: f64) -> Result<(), ChartError> {
        self.charts.sample(
            STRATEGY_EQUITY_CHART,
            DAILY_PERFORMANCE_SERIES,
            Sample::new(time, value),
        )
    }

    pub fn sample_benchmark(&self, time: DateTime<Utc>, value: f64) -> Result<(), ChartError> {
        self.charts
            .sample(BENCHMARK_CHART, BENCHMARK_SERIES, Sample::new(time, value))
    }

    /// Equity and daily performance as one write, so no reader sees one
    /// without the other.
    pub fn sample_daily(
        &self,
        time: DateTime<Utc>,
        equity: f64,
        daily_performance: f64,
    ) -> Result<(), ChartError> {
        self.charts.sample_many(&[
            SampleWrite {
                chart: STRATEGY_EQUITY_CHART,
                series: EQUITY_SERIES,
                sample: Sample::new(time, equity),
            },
            SampleWrite {
                chart: STRATEGY_EQUITY_CHART,
                series: DAILY_PERFORMANCE_SERIES,
                sample: Sample::new(time, daily_performance),
            },
        ])
    }

    // ── Host-supplied state ──

    pub fn set_runtime_statistic(&self, label: impl Into<String>, value: impl Into<String>) {
        self.runtime_statistics.lock().set(label, value);
    }

    pub fn runtime_statistics(&self) -> RuntimeStatistics {
        self.runtime_statistics.lock().clone()
    }

    /// Replace the alpha snapshot. Last write wins.
    pub fn set_alpha_statistics(&self, alpha: AlphaRuntimeStatistics) {
        *self.alpha.write() = alpha;
    }

    pub fn alpha_statistics(&self) -> AlphaRuntimeStatistics {
        self.alpha.read().clone()
    }

    pub fn banner(&self) -> Banner {
        self.banner.lock().clone()
    }

    /// Append a timestamped line to the run log.
    pub fn log_message(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        debug!(%message, "algorithm log");
        let line = format!("{} {}", Utc::now().format("%Y-%m-%d %H:%M:%S"), message);
        self.log.lock().push(line);
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    // ── Reporting ──

    /// Compute statistics and refresh the banner. Never fails; see
    /// [`StatisticsOutcome`] for what happened.
    pub fn run_report_cycle(&self) -> ReportCycle {
        self.cycle_with_ledger().0
    }

    fn cycle_with_ledger(&self) -> (ReportCycle, TradeLedger) {
        let _turn = self.cycle.lock();
        let ledger = self.engine.trade_ledger();
        let portfolio = self.engine.portfolio();

        let mut banner = self.banner.lock();
        let outcome = self.aggregator.compute_statistics(
            &self.charts,
            &ledger,
            self.starting_portfolio_value,
            &portfolio,
            &mut banner,
        );
        let cycle = ReportCycle {
            outcome,
            banner: banner.clone(),
        };
        (cycle, ledger)
    }

    /// Run a final cycle and assemble the full result object.
    pub fn final_report(&self) -> RunReport {
        let (cycle, ledger) = self.cycle_with_ledger();

        let mut runtime_statistics = self.runtime_statistics();
        runtime_statistics.merge(cycle.banner.to_display_map());

        RunReport {
            schema_version: SCHEMA_VERSION,
            job_id: self.job_id.clone(),
            compile_id: self.compile_id.clone(),
            start_time: self.start_time,
            end_time: Utc::now(),
            starting_portfolio_value: self.starting_portfolio_value,
            statistics: cycle.outcome.into_result(),
            runtime_statistics: runtime_statistics.into_iter().collect(),
            charts: self.charts.snapshot(),
            profit_loss: ledger.profit_loss_record(),
            closed_trades: ledger.closed_trades().to_vec(),
            orders: ledger.orders().to_vec(),
            alpha_statistics: self.alpha_statistics(),
            subscribed_symbols: self.subscriptions.subscribed_symbols(),
        }
    }

    /// Name stem for persisted files: job id, else compile id, else `run`.
    pub fn result_id(&self) -> &str {
        if !self.job_id.is_empty() {
            &self.job_id
        } else if !self.compile_id.is_empty() {
            &self.compile_id
        } else {
            "run"
        }
    }

    /// Write `<id>-log.txt` and `<id>.json` through `persister`.
    pub fn persist(&self, persister: &ResultPersister) -> Result<PersistedPaths, PersistError> {
        let report = self.final_report();
        let id = self.result_id();
        let logs = persister.save_logs(id, &self.log_lines())?;
        let results = persister.save_results(&format!("{id}.json"), &report)?;
        info!(
            job_id = %self.job_id,
            duration_secs = report.duration_secs(),
            "run persisted"
        );
        Ok(PersistedPaths { logs, results })
    }
}
