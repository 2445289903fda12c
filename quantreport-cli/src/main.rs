//! QuantReport CLI — drive a reporting lifecycle and inspect its results.
//!
//! Commands:
//! - `simulate` — random-walk strategy against a benchmark, with periodic
//!   reporting cycles, then persist the run log and results
//! - `inspect` — print the banner and statistics of a persisted results file

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use quantreport_core::{
    OrderRecord, OrderStatus, PortfolioSnapshot, TradeDirection, TradeLedger, TradeRecord,
};
use quantreport_runner::{
    AlphaRuntimeStatistics, AppConfig, ExecutionEngine, ReportScheduler, ReportingLifecycle,
    ResultPersister, RunReport, SubscriptionManager,
};

const FEE_PER_ORDER: f64 = 1.0;

#[derive(Parser)]
#[command(
    name = "quantreport",
    about = "QuantReport CLI — live statistics and result persistence for trading runs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic strategy with periodic reporting, then persist the results.
    Simulate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of trading days to simulate.
        #[arg(long, default_value_t = 252)]
        days: u32,

        /// Seed for the price and trade generator.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Starting portfolio value.
        #[arg(long, default_value_t = 100_000.0)]
        starting_capital: f64,

        /// Traded symbol, also used as the benchmark.
        #[arg(long, default_value = "SPY")]
        symbol: String,

        /// Output directory. Overrides `reporting.output_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Job id used to name the persisted files.
        #[arg(long)]
        job_id: Option<String>,

        /// Reporting interval in milliseconds. Overrides `reporting.interval_secs`.
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Wall-clock delay per simulated day, in milliseconds.
        #[arg(long, default_value_t = 5)]
        step_ms: u64,
    },
    /// Print the banner and statistics summary of a persisted results file.
    Inspect {
        /// Path to a `<id>.json` results file.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            days,
            seed,
            starting_capital,
            symbol,
            output_dir,
            job_id,
            interval_ms,
            step_ms,
        } => {
            let opts = SimOptions {
                days,
                seed,
                starting_capital,
                symbol,
                step: StdDuration::from_millis(step_ms),
            };
            run_simulate(config.as_deref(), opts, output_dir, job_id, interval_ms)
        }
        Commands::Inspect { path } => run_inspect(&path),
    }
}

fn run_simulate(
    config_path: Option<&Path>,
    opts: SimOptions,
    output_dir: Option<PathBuf>,
    job_id: Option<String>,
    interval_ms: Option<u64>,
) -> Result<()> {
    if !opts.starting_capital.is_finite() || opts.starting_capital <= 0.0 {
        bail!("--starting-capital must be a positive number");
    }
    if opts.days == 0 {
        bail!("--days must be at least 1");
    }

    let mut config = match config_path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.reporting.output_dir = dir;
    }
    config.logging.init();

    let interval = match interval_ms {
        Some(0) => bail!("--interval-ms must be at least 1"),
        Some(ms) => StdDuration::from_millis(ms),
        None => config.reporting.interval(),
    };
    std::fs::create_dir_all(&config.reporting.output_dir).with_context(|| {
        format!(
            "creating output directory {}",
            config.reporting.output_dir.display()
        )
    })?;
    let persister = ResultPersister::new(&config.reporting.output_dir).with_context(|| {
        format!(
            "resolving output directory {}",
            config.reporting.output_dir.display()
        )
    })?;

    let engine = Arc::new(SimEngine::new(opts.starting_capital));
    let mut builder = ReportingLifecycle::builder()
        .engine(engine.clone())
        .subscriptions(Arc::new(FixedSubscriptions(vec![opts.symbol.clone()])))
        .alpha_statistics(AlphaRuntimeStatistics::default())
        .with_config(&config.reporting)
        .compile_id(config.fingerprint()?);
    if let Some(id) = job_id {
        builder = builder.job_id(id);
    }
    let lifecycle = Arc::new(builder.build()?);

    info!(
        compile_id = %lifecycle.compile_id(),
        days = opts.days,
        seed = opts.seed,
        interval_ms = interval.as_millis() as u64,
        "simulation starting"
    );
    lifecycle.log_message(format!(
        "Simulating {} days of {} from {:.2}",
        opts.days, opts.symbol, opts.starting_capital
    ));

    let scheduler = ReportScheduler::spawn(Arc::clone(&lifecycle), interval)
        .context("spawning report scheduler")?;
    let producer = {
        let lifecycle = Arc::clone(&lifecycle);
        let engine = Arc::clone(&engine);
        thread::Builder::new()
            .name("producer".into())
            .spawn(move || produce(&lifecycle, &engine, &opts))
            .context("spawning producer thread")?
    };
    let produced = producer
        .join()
        .map_err(|_| anyhow!("producer thread panicked"))?;
    let cycles = scheduler.stop();
    produced?;

    lifecycle.log_message(format!("Simulation finished after {cycles} reporting cycles"));
    let paths = lifecycle.persist(&persister)?;

    let file_name = paths
        .results
        .file_name()
        .and_then(|n| n.to_str())
        .context("results path has no file name")?;
    let report: RunReport = persister.load_results(file_name)?;
    print_report(&report);
    println!("Log saved to:     {}", paths.logs.display());
    println!("Results saved to: {}", paths.results.display());

    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading results file {}", path.display()))?;
    let report: RunReport = serde_json::from_str(&content)
        .with_context(|| format!("parsing results file {}", path.display()))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!("=== Run Report ===");
    if !report.job_id.is_empty() {
        println!("Job:        {}", report.job_id);
    }
    println!("Compile:    {}", report.compile_id);
    println!("Started:    {}", report.start_time.format("%Y-%m-%d %H:%M:%S"));
    println!("Duration:   {:.3}s", report.duration_secs());
    println!("Symbols:    {}", report.subscribed_symbols.join(", "));
    println!("Trades:     {}", report.closed_trades.len());
    println!("Orders:     {}", report.orders.len());
    println!();

    println!("--- Runtime Statistics ---");
    for (label, value) in &report.runtime_statistics {
        println!("{label:<28} {value:>16}");
    }
    println!();

    if report.statistics.is_empty() {
        println!("No statistics were computed for this run.");
    } else {
        println!("--- Statistics ---");
        for (label, value) in &report.statistics.summary {
            println!("{label:<28} {value:>16}");
        }
    }
    println!();
}

// ─── Synthetic producer ─────────────────────────────────────────────

struct SimOptions {
    days: u32,
    seed: u64,
    starting_capital: f64,
    symbol: String,
    step: StdDuration,
}

/// Execution engine backed by the producer's own bookkeeping.
struct SimEngine {
    ledger: Mutex<TradeLedger>,
    portfolio: Mutex<PortfolioSnapshot>,
}

impl SimEngine {
    fn new(starting_capital: f64) -> Self {
        Self {
            ledger: Mutex::new(TradeLedger::new()),
            portfolio: Mutex::new(PortfolioSnapshot {
                total_portfolio_value: starting_capital,
                ..Default::default()
            }),
        }
    }

    fn record_order(&self, order: OrderRecord) {
        self.ledger.lock().record_order(order);
    }

    fn record_trade(&self, trade: TradeRecord) {
        self.ledger.lock().record_trade(trade);
    }

    fn set_portfolio(&self, snapshot: PortfolioSnapshot) {
        *self.portfolio.lock() = snapshot;
    }
}

impl ExecutionEngine for SimEngine {
    fn trade_ledger(&self) -> TradeLedger {
        self.ledger.lock().clone()
    }

    fn portfolio(&self) -> PortfolioSnapshot {
        *self.portfolio.lock()
    }
}

struct FixedSubscriptions(Vec<String>);

impl SubscriptionManager for FixedSubscriptions {
    fn subscribed_symbols(&self) -> Vec<String> {
        self.0.clone()
    }
}

struct Position {
    quantity: f64,
    entry_price: f64,
    entry_time: DateTime<Utc>,
}

/// Long-only, all-in/all-out account on a single random-walk price.
struct Account {
    price: f64,
    cash: f64,
    position: Option<Position>,
    next_order_id: u64,
    realized: f64,
    fees: f64,
    opened: u64,
    closed: u64,
    wins: u64,
}

impl Account {
    fn new(cash: f64) -> Self {
        Self {
            price: 100.0,
            cash,
            position: None,
            next_order_id: 1,
            realized: 0.0,
            fees: 0.0,
            opened: 0,
            closed: 0,
            wins: 0,
        }
    }

    fn holdings(&self) -> f64 {
        self.position.as_ref().map_or(0.0, |p| p.quantity)
    }

    fn equity(&self) -> f64 {
        self.cash + self.holdings() * self.price
    }

    fn unrealized(&self) -> f64 {
        self.position
            .as_ref()
            .map_or(0.0, |p| p.quantity * (self.price - p.entry_price))
    }

    fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            total_unrealized_profit: self.unrealized(),
            total_fees: self.fees,
            total_profit: self.realized,
            total_portfolio_value: self.equity(),
        }
    }

    fn alpha_statistics(&self) -> AlphaRuntimeStatistics {
        let score = if self.closed == 0 {
            0.0
        } else {
            self.wins as f64 / self.closed as f64
        };
        AlphaRuntimeStatistics {
            total_insights_generated: self.opened,
            total_insights_closed: self.closed,
            total_insights_analysis_completed: self.closed,
            mean_population_score: score,
        }
    }

    fn order(&mut self, time: DateTime<Utc>, symbol: &str, quantity: f64) -> OrderRecord {
        let id = self.next_order_id;
        self.next_order_id += 1;
        OrderRecord {
            id,
            symbol: symbol.to_string(),
            time,
            quantity,
            price: self.price,
            status: OrderStatus::Filled,
        }
    }

    /// Enter when flat, exit when long.
    fn flip(&mut self, time: DateTime<Utc>, symbol: &str, engine: &SimEngine) {
        match self.position.take() {
            None => {
                let quantity = ((self.cash - FEE_PER_ORDER) * 0.95 / self.price).floor();
                if quantity < 1.0 {
                    return;
                }
                self.cash -= quantity * self.price + FEE_PER_ORDER;
                self.fees += FEE_PER_ORDER;
                self.opened += 1;
                let order = self.order(time, symbol, quantity);
                engine.record_order(order);
                self.position = Some(Position {
                    quantity,
                    entry_price: self.price,
                    entry_time: time,
                });
            }
            Some(pos) => {
                self.cash += pos.quantity * self.price - FEE_PER_ORDER;
                self.fees += FEE_PER_ORDER;
                let profit_loss =
                    pos.quantity * (self.price - pos.entry_price) - 2.0 * FEE_PER_ORDER;
                self.realized += profit_loss;
                self.closed += 1;
                if profit_loss > 0.0 {
                    self.wins += 1;
                }
                let order = self.order(time, symbol, -pos.quantity);
                engine.record_order(order);
                engine.record_trade(TradeRecord {
                    symbol: symbol.to_string(),
                    direction: TradeDirection::Long,
                    entry_time: pos.entry_time,
                    entry_price: pos.entry_price,
                    exit_time: time,
                    exit_price: self.price,
                    quantity: pos.quantity,
                    profit_loss,
                    fees: 2.0 * FEE_PER_ORDER,
                });
            }
        }
    }
}

fn produce(lifecycle: &ReportingLifecycle, engine: &SimEngine, opts: &SimOptions) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let start = Utc
        .with_ymd_and_hms(2024, 1, 2, 21, 0, 0)
        .single()
        .context("invalid simulation start time")?;
    let mut account = Account::new(opts.starting_capital);
    let mut prev_equity = opts.starting_capital;

    for day in 0..opts.days {
        let time = start + Duration::days(i64::from(day));
        account.price *= 1.0 + rng.gen_range(-0.02..0.021);
        if rng.gen_bool(0.1) {
            account.flip(time, &opts.symbol, engine);
            lifecycle.set_alpha_statistics(account.alpha_statistics());
        }

        let equity = account.equity();
        engine.set_portfolio(account.snapshot());
        lifecycle.sample_daily(time, equity, equity / prev_equity - 1.0)?;
        lifecycle.sample_benchmark(time, account.price)?;
        prev_equity = equity;

        if day % 21 == 20 {
            lifecycle.set_runtime_statistic("Holdings", format!("{:.0}", account.holdings()));
            lifecycle.log_message(format!(
                "{} equity {:.2} price {:.2}",
                time.format("%Y-%m-%d"),
                equity,
                account.price
            ));
        }
        thread::sleep(opts.step);
    }

    info!(
        trades = account.closed,
        final_equity = account.equity(),
        "producer finished"
    );
    Ok(())
}
