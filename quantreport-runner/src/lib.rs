//! QuantReport Runner — reporting cycles on top of `quantreport-core`.
//!
//! This crate provides:
//! - Statistics aggregation with a non-fatal failure boundary
//! - The reference `StandardCalculator`
//! - Result persistence (text logs, indented JSON results)
//! - The reporting lifecycle with a two-phase builder
//! - A periodic report scheduler
//! - TOML configuration and tracing setup

pub mod aggregator;
pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod persist;
pub mod report;
pub mod scheduler;

pub use aggregator::{RequiredSeries, StatisticsAggregator, StatisticsOutcome};
pub use config::{AppConfig, ConfigError, ReportingConfig};
pub use lifecycle::{
    AlphaRuntimeStatistics, ExecutionEngine, LifecycleError, PersistedPaths, ReportCycle,
    ReportingLifecycle, ReportingLifecycleBuilder, SubscriptionManager,
};
pub use logging::LoggingConfig;
pub use metrics::StandardCalculator;
pub use persist::{PersistError, ResultPersister};
pub use report::{RunReport, SCHEMA_VERSION};
pub use scheduler::ReportScheduler;
