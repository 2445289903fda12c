//! Portfolio totals as read at report time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSnapshot {
    pub total_unrealized_profit: f64,
    pub total_fees: f64,
    /// Realized profit across all closed positions.
    pub total_profit: f64,
    pub total_portfolio_value: f64,
}

impl PortfolioSnapshot {
    /// Fractional return relative to `starting_value`.
    ///
    /// A non-positive starting value yields exactly `0.0`.
    pub fn net_return(&self, starting_value: f64) -> f64 {
        if starting_value > 0.0 {
            (self.total_portfolio_value - starting_value) / starting_value
        } else {
            0.0
        }
    }
}
