//! Status banner — five fixed labels rendered as currency/percent strings.
//!
//! The label set is closed: `BannerLabel` is the only key type a `Banner`
//! accepts, so nothing can introduce a sixth entry at runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::portfolio::PortfolioSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BannerLabel {
    Unrealized,
    Fees,
    #[serde(rename = "Net Profit")]
    NetProfit,
    Return,
    Equity,
}

impl BannerLabel {
    pub const ALL: [BannerLabel; 5] = [
        BannerLabel::Unrealized,
        BannerLabel::Fees,
        BannerLabel::NetProfit,
        BannerLabel::Return,
        BannerLabel::Equity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BannerLabel::Unrealized => "Unrealized",
            BannerLabel::Fees => "Fees",
            BannerLabel::NetProfit => "Net Profit",
            BannerLabel::Return => "Return",
            BannerLabel::Equity => "Equity",
        }
    }
}

impl fmt::Display for BannerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Banner entries. Updated in place each reporting cycle; entries survive
/// cycles that do not rewrite them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Banner {
    entries: BTreeMap<BannerLabel, String>,
}

impl Banner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, label: BannerLabel, value: String) {
        self.entries.insert(label, value);
    }

    pub fn get(&self, label: BannerLabel) -> Option<&str> {
        self.entries.get(&label).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BannerLabel, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries keyed by their display label.
    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.clone()))
            .collect()
    }
}

/// Writes the five banner entries from a portfolio snapshot.
#[derive(Debug, Clone)]
pub struct BannerBuilder {
    currency_symbol: String,
}

impl Default for BannerBuilder {
    fn default() -> Self {
        Self::new("$")
    }
}

impl BannerBuilder {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn update(&self, banner: &mut Banner, portfolio: &PortfolioSnapshot, net_return: f64) {
        let sym = &self.currency_symbol;
        banner.set(
            BannerLabel::Unrealized,
            format_currency(sym, portfolio.total_unrealized_profit),
        );
        banner.set(BannerLabel::Fees, format_cost(sym, portfolio.total_fees));
        banner.set(
            BannerLabel::NetProfit,
            format_currency(sym, portfolio.total_profit),
        );
        banner.set(BannerLabel::Return, format_percent(net_return));
        banner.set(
            BannerLabel::Equity,
            format_currency(sym, portfolio.total_portfolio_value),
        );
    }
}

/// `$1,234.50`, or `-$1,234.50` for negative amounts.
pub fn format_currency(symbol: &str, value: f64) -> String {
    let cents = (value * 100.0).round();
    let body = group_thousands(&format!("{:.2}", cents.abs() / 100.0));
    if cents < 0.0 {
        format!("-{symbol}{body}")
    } else {
        format!("{symbol}{body}")
    }
}

/// A cost is always shown negative: `-$12.00` for fees of `12.0`.
pub fn format_cost(symbol: &str, value: f64) -> String {
    let cents = (value * 100.0).round();
    let body = group_thousands(&format!("{:.2}", cents.abs() / 100.0));
    format!("-{symbol}{body}")
}

/// Fraction to percent with two decimals: `0.1` → `10.00%`.
pub fn format_percent(fraction: f64) -> String {
    let pct = (fraction * 10_000.0).round() / 100.0;
    // avoid "-0.00%"
    let pct = if pct == 0.0 { 0.0 } else { pct };
    format!("{pct:.2}%")
}

fn group_thousands(fixed: &str) -> String {
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed, ""));
    let mut out = String::with_capacity(fixed.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency("$", 0.0), "$0.00");
        assert_eq!(format_currency("$", 12.346), "$12.35");
        assert_eq!(format_currency("$", 11_000.0), "$11,000.00");
        assert_eq!(format_currency("$", 1_234_567.891), "$1,234,567.89");
        assert_eq!(format_currency("$", -5.0), "-$5.00");
        assert_eq!(format_currency("$", -0.001), "$0.00");
        assert_eq!(format_currency("€", 999.999), "€1,000.00");
    }

    #[test]
    fn cost_formatting() {
        assert_eq!(format_cost("$", 12.0), "-$12.00");
        assert_eq!(format_cost("$", 1_500.5), "-$1,500.50");
        assert_eq!(format_cost("$", 0.0), "-$0.00");
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(0.10), "10.00%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(-0.0525), "-5.25%");
        assert_eq!(format_percent(-0.00001), "0.00%");
        assert_eq!(format_percent(1.5), "150.00%");
    }

    #[test]
    fn builder_writes_all_five_labels() {
        let mut banner = Banner::new();
        let portfolio = PortfolioSnapshot {
            total_unrealized_profit: 250.0,
            total_fees: 12.5,
            total_profit: 750.0,
            total_portfolio_value: 11_000.0,
        };
        BannerBuilder::default().update(&mut banner, &portfolio, 0.10);

        assert_eq!(banner.len(), 5);
        assert_eq!(banner.get(BannerLabel::Unrealized), Some("$250.00"));
        assert_eq!(banner.get(BannerLabel::Fees), Some("-$12.50"));
        assert_eq!(banner.get(BannerLabel::NetProfit), Some("$750.00"));
        assert_eq!(banner.get(BannerLabel::Return), Some("10.00%"));
        assert_eq!(banner.get(BannerLabel::Equity), Some("$11,000.00"));
    }

    #[test]
    fn banner_serializes_with_display_labels() {
        let mut banner = Banner::new();
        banner.set(BannerLabel::NetProfit, "$1.00".into());
        let json = serde_json::to_string(&banner).unwrap();
        assert_eq!(json, r#"{"Net Profit":"$1.00"}"#);
        let back: Banner = serde_json::from_str(&json).unwrap();
        assert_eq!(back, banner);
    }
}
