//! Trade ledger — closed trades ordered by close time, plus the order log.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeDirection {
    Long,
    Short,
}

/// Economic summary of one closed round-trip trade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub quantity: f64,
    /// Realized P&L net of fees.
    pub profit_loss: f64,
    pub fees: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.profit_loss > 0.0
    }

    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        let cost = self.entry_price * self.quantity.abs();
        if cost == 0.0 {
            return 0.0;
        }
        self.profit_loss / cost
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    PartiallyFilled,
    Filled,
    Canceled,
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub id: u64,
    pub symbol: String,
    pub time: DateTime<Utc>,
    pub quantity: f64,
    pub price: f64,
    pub status: OrderStatus,
}

/// Closed trades (sorted by exit time) and every order the engine produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TradeLedger {
    trades: Vec<TradeRecord>,
    orders: Vec<OrderRecord>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(mut trades: Vec<TradeRecord>, orders: Vec<OrderRecord>) -> Self {
        trades.sort_by_key(|t| t.exit_time);
        Self { trades, orders }
    }

    /// Insert a closed trade, keeping the ledger ordered by exit time.
    /// Trades closing at the same instant keep their arrival order.
    pub fn record_trade(&mut self, trade: TradeRecord) {
        let idx = self.trades.partition_point(|t| t.exit_time <= trade.exit_time);
        self.trades.insert(idx, trade);
    }

    pub fn record_order(&mut self, order: OrderRecord) {
        self.orders.push(order);
    }

    pub fn closed_trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    pub fn filled_order_count(&self) -> usize {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::Filled)
            .count()
    }

    pub fn total_fees(&self) -> f64 {
        self.trades.iter().map(|t| t.fees).sum()
    }

    /// Realized P&L keyed by trade close time.
    ///
    /// Trades closing at the same instant are spread one millisecond apart so
    /// each keeps its own entry.
    pub fn profit_loss_record(&self) -> BTreeMap<DateTime<Utc>, f64> {
        let mut record = BTreeMap::new();
        for trade in &self.trades {
            let mut time = trade.exit_time;
            while record.contains_key(&time) {
                time += Duration::milliseconds(1);
            }
            record.insert(time, trade.profit_loss);
        }
        record
    }
}
