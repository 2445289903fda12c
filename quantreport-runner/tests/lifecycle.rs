//! Reporting lifecycle: construction rules, reporting cycles, final report,
//! persistence, and the periodic scheduler.

use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use quantreport_core::{
    BannerLabel, OrderRecord, OrderStatus, PortfolioSnapshot, TradeDirection, TradeLedger,
    TradeRecord,
};
use quantreport_runner::{
    AlphaRuntimeStatistics, ExecutionEngine, LifecycleError, ReportScheduler, ReportingConfig,
    ReportingLifecycle, ResultPersister, RunReport, StatisticsOutcome, SubscriptionManager,
};

struct FakeEngine {
    ledger: Mutex<TradeLedger>,
    portfolio: Mutex<PortfolioSnapshot>,
}

impl FakeEngine {
    fn new(value: f64) -> Arc<Self> {
        Arc::new(Self {
            ledger: Mutex::new(TradeLedger::new()),
            portfolio: Mutex::new(PortfolioSnapshot {
                total_portfolio_value: value,
                ..Default::default()
            }),
        })
    }
}

impl ExecutionEngine for FakeEngine {
    fn trade_ledger(&self) -> TradeLedger {
        self.ledger.lock().clone()
    }

    fn portfolio(&self) -> PortfolioSnapshot {
        *self.portfolio.lock()
    }
}

struct Symbols(Vec<&'static str>);

impl SubscriptionManager for Symbols {
    fn subscribed_symbols(&self) -> Vec<String> {
        self.0.iter().map(|s| s.to_string()).collect()
    }
}

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 21, 0, 0).unwrap() + Duration::days(n)
}

fn lifecycle(engine: Arc<FakeEngine>) -> ReportingLifecycle {
    ReportingLifecycle::builder()
        .engine(engine)
        .subscriptions(Arc::new(Symbols(vec!["SPY", "AAPL"])))
        .alpha_statistics(AlphaRuntimeStatistics::default())
        .job_id("job-7")
        .build()
        .unwrap()
}

fn sample_days(lc: &ReportingLifecycle, days: i64) {
    for d in 0..days {
        lc.sample_daily(day(d), 10_000.0 + 100.0 * d as f64, 0.01).unwrap();
        lc.sample_benchmark(day(d), 400.0 + d as f64).unwrap();
    }
}

#[test]
fn build_requires_every_collaborator() {
    let err = ReportingLifecycle::builder()
        .subscriptions(Arc::new(Symbols(vec![])))
        .alpha_statistics(AlphaRuntimeStatistics::default())
        .build()
        .err();
    assert_eq!(err, Some(LifecycleError::MissingCollaborator("execution engine")));

    let err = ReportingLifecycle::builder()
        .engine(FakeEngine::new(1.0))
        .alpha_statistics(AlphaRuntimeStatistics::default())
        .build()
        .err();
    assert_eq!(err, Some(LifecycleError::MissingCollaborator("subscription manager")));

    let err = ReportingLifecycle::builder()
        .engine(FakeEngine::new(1.0))
        .subscriptions(Arc::new(Symbols(vec![])))
        .build()
        .err();
    assert_eq!(err, Some(LifecycleError::MissingCollaborator("alpha statistics")));
}

#[test]
fn fresh_lifecycle_state() {
    let before = Utc::now();
    let lc = ReportingLifecycle::builder()
        .engine(FakeEngine::new(25_000.0))
        .subscriptions(Arc::new(Symbols(vec![])))
        .alpha_statistics(AlphaRuntimeStatistics::default())
        .build()
        .unwrap();

    assert!(lc.start_time() >= before);
    assert_eq!(lc.job_id(), "");
    assert_eq!(lc.compile_id(), "");
    assert_eq!(lc.result_id(), "run");
    assert_eq!(lc.starting_portfolio_value(), 25_000.0);
    assert!(lc.runtime_statistics().is_empty());
    assert!(lc.banner().is_empty());
    assert!(lc.charts().chart_names().is_empty());
}

#[test]
fn cycle_not_ready_until_benchmark_arrives() {
    let engine = FakeEngine::new(10_000.0);
    let lc = lifecycle(engine);
    lc.sample_daily(day(0), 10_000.0, 0.0).unwrap();

    let cycle = lc.run_report_cycle();
    assert_eq!(
        cycle.outcome,
        StatisticsOutcome::NotReady {
            missing: vec!["Benchmark"]
        }
    );
    assert!(cycle.banner.is_empty());

    lc.sample_benchmark(day(0), 400.0).unwrap();
    assert!(lc.run_report_cycle().outcome.is_computed());
}

#[test]
fn separately_sampled_series_are_enough() {
    let lc = lifecycle(FakeEngine::new(10_000.0));
    for d in 0..3 {
        lc.sample_equity(day(d), 10_000.0 + d as f64).unwrap();
        lc.sample_performance(day(d), 0.0001).unwrap();
        lc.sample_benchmark(day(d), 400.0).unwrap();
    }
    assert!(lc.sample_equity(day(0), 1.0).is_err());

    assert!(lc.run_report_cycle().outcome.is_computed());
}

#[test]
fn banner_follows_engine_portfolio() {
    let engine = FakeEngine::new(10_000.0);
    let lc = lifecycle(Arc::clone(&engine));
    sample_days(&lc, 5);

    *engine.portfolio.lock() = PortfolioSnapshot {
        total_unrealized_profit: -35.0,
        total_fees: 4.0,
        total_profit: 1_035.0,
        total_portfolio_value: 11_000.0,
    };
    let cycle = lc.run_report_cycle();

    assert!(cycle.outcome.is_computed());
    assert_eq!(cycle.banner.get(BannerLabel::Return), Some("10.00%"));
    assert_eq!(cycle.banner.get(BannerLabel::Unrealized), Some("-$35.00"));
    assert_eq!(lc.banner(), cycle.banner);
}

#[test]
fn configured_currency_symbol_is_used() {
    let config = ReportingConfig {
        currency_symbol: "€".into(),
        ..Default::default()
    };
    let lc = ReportingLifecycle::builder()
        .engine(FakeEngine::new(2_000.0))
        .subscriptions(Arc::new(Symbols(vec![])))
        .alpha_statistics(AlphaRuntimeStatistics::default())
        .with_config(&config)
        .build()
        .unwrap();
    sample_days(&lc, 2);

    let cycle = lc.run_report_cycle();
    assert_eq!(cycle.banner.get(BannerLabel::Equity), Some("€2,000.00"));
}

#[test]
fn final_report_merges_runtime_statistics_under_banner() {
    let engine = FakeEngine::new(10_000.0);
    {
        let mut ledger = engine.ledger.lock();
        ledger.record_trade(TradeRecord {
            symbol: "SPY".into(),
            direction: TradeDirection::Long,
            entry_time: day(0),
            entry_price: 400.0,
            exit_time: day(3),
            exit_price: 410.0,
            quantity: 10.0,
            profit_loss: 100.0,
            fees: 2.0,
        });
        ledger.record_order(OrderRecord {
            id: 1,
            symbol: "SPY".into(),
            time: day(0),
            quantity: 10.0,
            price: 400.0,
            status: OrderStatus::Filled,
        });
    }
    let lc = lifecycle(Arc::clone(&engine));
    sample_days(&lc, 4);
    lc.set_runtime_statistic("Holdings", "1");
    lc.set_runtime_statistic("Return", "stale");
    lc.set_alpha_statistics(AlphaRuntimeStatistics {
        total_insights_generated: 12,
        ..Default::default()
    });

    let report = lc.final_report();

    assert_eq!(report.job_id, "job-7");
    assert_eq!(report.runtime_statistics["Holdings"], "1");
    assert_eq!(report.runtime_statistics["Return"], "0.00%");
    assert_eq!(report.runtime_statistics.len(), 6);
    assert_eq!(report.closed_trades.len(), 1);
    assert_eq!(report.orders.len(), 1);
    assert_eq!(report.profit_loss.get(&day(3)), Some(&100.0));
    assert_eq!(report.alpha_statistics.total_insights_generated, 12);
    assert_eq!(report.subscribed_symbols, vec!["SPY", "AAPL"]);
    let perf = report.statistics.total_performance.as_ref().unwrap();
    assert_eq!(perf.total_transactions, 1);
    assert!(report.end_time >= report.start_time);
}

#[test]
fn persist_writes_log_and_results() {
    let tmp = tempfile::tempdir().unwrap();
    let persister = ResultPersister::new(tmp.path()).unwrap();
    let lc = lifecycle(FakeEngine::new(10_000.0));
    sample_days(&lc, 3);
    lc.log_message("Initializing algorithm");
    lc.log_message("Algorithm finished");

    let paths = lc.persist(&persister).unwrap();

    assert_eq!(paths.logs.file_name().unwrap(), "job-7-log.txt");
    assert_eq!(paths.results.file_name().unwrap(), "job-7.json");
    let log = std::fs::read_to_string(&paths.logs).unwrap();
    let lines: Vec<_> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("Initializing algorithm"));
    assert!(lines[1].ends_with("Algorithm finished"));

    let report: RunReport = persister.load_results("job-7.json").unwrap();
    assert_eq!(report.job_id, "job-7");
    assert_eq!(report.charts.len(), 2);
}

#[test]
fn overflowing_metric_still_persists_a_loadable_report() {
    let tmp = tempfile::tempdir().unwrap();
    let persister = ResultPersister::new(tmp.path()).unwrap();
    let lc = lifecycle(FakeEngine::new(10_000.0));
    lc.sample_daily(day(0), 10_000.0, 0.0).unwrap();
    lc.sample_daily(day(1), 10_000_000.0, 999.0).unwrap();
    lc.sample_benchmark(day(0), 400.0).unwrap();
    lc.sample_benchmark(day(1), 401.0).unwrap();
    assert!(lc.sample_daily(day(2), f64::NAN, 0.0).is_err());

    let cycle = lc.run_report_cycle();
    assert!(matches!(cycle.outcome, StatisticsOutcome::Failed { .. }));

    let paths = lc.persist(&persister).unwrap();
    let report: RunReport = persister.load_results("job-7.json").unwrap();
    assert_eq!(paths.results.file_name().unwrap(), "job-7.json");
    assert!(report.statistics.total_performance.is_none());
    assert_eq!(report.charts.len(), 2);
}

#[test]
fn overlapping_cycles_take_turns() {
    let engine = FakeEngine::new(10_000.0);
    let lc = Arc::new(lifecycle(engine));
    sample_days(&lc, 10);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lc = Arc::clone(&lc);
            thread::spawn(move || {
                (0..25)
                    .filter(|_| lc.run_report_cycle().outcome.is_computed())
                    .count()
            })
        })
        .collect();

    let computed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(computed, 100);
    assert_eq!(lc.banner().len(), 5);
}

#[test]
fn scheduler_runs_until_stopped() {
    let lc = Arc::new(lifecycle(FakeEngine::new(10_000.0)));
    sample_days(&lc, 3);

    let scheduler = ReportScheduler::spawn(Arc::clone(&lc), StdDuration::from_millis(10)).unwrap();
    thread::sleep(StdDuration::from_millis(200));
    let cycles = scheduler.stop();

    assert!(cycles >= 1, "expected at least one cycle, got {cycles}");
    assert_eq!(lc.banner().len(), 5);
}
