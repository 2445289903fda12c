//! Reference statistics calculator: pure metric functions over the series
//! handed to it by the aggregator.
//!
//! Daily performance values are fractional returns (0.01 = +1%). Equity and
//! benchmark values are price levels.

use std::collections::BTreeMap;

use quantreport_core::{
    CalculatorError, CalculatorInput, PerformanceSummary, StatisticsCalculator, StatisticsResult,
    TradeRecord,
};

const TRADING_DAYS: f64 = 252.0;

/// Calculator used when the host does not plug in its own.
#[derive(Debug, Clone, Default)]
pub struct StandardCalculator {
    /// Annual risk-free rate used for Sharpe/Sortino.
    pub risk_free_rate: f64,
}

impl StandardCalculator {
    pub fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }
}

impl StatisticsCalculator for StandardCalculator {
    fn generate(&self, input: &CalculatorInput<'_>) -> Result<StatisticsResult, CalculatorError> {
        for (name, values) in [
            ("equity", input.equity),
            ("daily performance", input.daily_performance),
            ("benchmark", input.benchmark),
        ] {
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(CalculatorError::InvalidInput(format!(
                    "non-finite {name} value {bad}"
                )));
            }
        }

        let benchmark_returns = pct_changes(input.benchmark);
        let (alpha, beta) = alpha_beta(input.daily_performance, &benchmark_returns);

        let perf = PerformanceSummary {
            total_return: total_return(input.equity, input.starting_portfolio_value),
            compounding_annual_return: cagr(input.equity, input.starting_portfolio_value),
            sharpe_ratio: sharpe_ratio(input.daily_performance, self.risk_free_rate),
            sortino_ratio: sortino_ratio(input.daily_performance, self.risk_free_rate),
            max_drawdown: max_drawdown(input.equity),
            alpha,
            beta,
            win_rate: win_rate(input.closed_trades),
            profit_factor: profit_factor(input.closed_trades),
            total_trades: input.closed_trades.len(),
            total_fees: input.total_fees,
            total_transactions: input.total_transactions,
        };

        Ok(StatisticsResult {
            summary: summarize(&perf),
            total_performance: Some(perf),
        })
    }
}

fn summarize(p: &PerformanceSummary) -> BTreeMap<String, String> {
    let pct = |v: f64| format!("{:.3}%", v * 100.0);
    let mut s = BTreeMap::new();
    s.insert("Total Trades".into(), p.total_trades.to_string());
    s.insert("Total Orders".into(), p.total_transactions.to_string());
    s.insert("Net Profit".into(), pct(p.total_return));
    s.insert("Compounding Annual Return".into(), pct(p.compounding_annual_return));
    s.insert("Drawdown".into(), pct(p.max_drawdown.abs()));
    s.insert("Sharpe Ratio".into(), format!("{:.3}", p.sharpe_ratio));
    s.insert("Sortino Ratio".into(), format!("{:.3}", p.sortino_ratio));
    s.insert("Alpha".into(), format!("{:.3}", p.alpha));
    s.insert("Beta".into(), format!("{:.3}", p.beta));
    s.insert("Win Rate".into(), format!("{:.0}%", p.win_rate * 100.0));
    s.insert("Profit-Loss Ratio".into(), format!("{:.2}", p.profit_factor));
    s.insert("Total Fees".into(), format!("{:.2}", p.total_fees));
    s
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction of the starting value.
pub fn total_return(equity: &[f64], starting_value: f64) -> f64 {
    match equity.last() {
        Some(&last) if starting_value > 0.0 => (last - starting_value) / starting_value,
        _ => 0.0,
    }
}

/// Compound annual growth rate, one equity sample per trading day.
pub fn cagr(equity: &[f64], starting_value: f64) -> f64 {
    let Some(&last) = equity.last() else {
        return 0.0;
    };
    if equity.len() < 2 || starting_value <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = equity.len() as f64 / TRADING_DAYS;
    (last / starting_value).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio of daily returns.
///
/// Returns 0.0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(daily_returns: &[f64], risk_free_rate: f64) -> f64 {
    if daily_returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS;
    let excess: Vec<f64> = daily_returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / std * TRADING_DAYS.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
pub fn sortino_ratio(daily_returns: &[f64], risk_free_rate: f64) -> f64 {
    if daily_returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS;
    let excess: Vec<f64> = daily_returns.iter().map(|r| r - daily_rf).collect();
    let downside: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside == 0.0 {
        return 0.0;
    }
    let downside_std = (downside / excess.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / downside_std * TRADING_DAYS.sqrt()
}

/// Maximum drawdown as a negative fraction (-0.15 = 15% drawdown).
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for &eq in equity {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Jensen's alpha (annualized) and beta against benchmark returns.
///
/// The two return series are aligned on their most recent values.
pub fn alpha_beta(strategy: &[f64], benchmark: &[f64]) -> (f64, f64) {
    let n = strategy.len().min(benchmark.len());
    if n < 2 {
        return (0.0, 0.0);
    }
    let s = &strategy[strategy.len() - n..];
    let b = &benchmark[benchmark.len() - n..];
    let (ms, mb) = (mean(s), mean(b));
    let cov = s.iter().zip(b).map(|(x, y)| (x - ms) * (y - mb)).sum::<f64>() / (n - 1) as f64;
    let var = b.iter().map(|y| (y - mb).powi(2)).sum::<f64>() / (n - 1) as f64;
    if var < 1e-15 {
        return (0.0, 0.0);
    }
    let beta = cov / var;
    ((ms - beta * mb) * TRADING_DAYS, beta)
}

/// Fraction of closed trades with positive P&L.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profit / gross loss, capped at 100.0.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades.iter().map(|t| t.profit_loss.max(0.0)).sum();
    let gross_loss: f64 = trades.iter().map(|t| (-t.profit_loss).max(0.0)).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Period-over-period fractional changes. Non-positive bases yield 0.0.
pub fn pct_changes(levels: &[f64]) -> Vec<f64> {
    levels
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
