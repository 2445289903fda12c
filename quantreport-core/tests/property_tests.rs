//! Property tests for domain invariants.
//!
//! 1. Ledger ordering: closed trades stay sorted by exit time
//! 2. P&L record: one entry per closed trade, even with colliding times
//! 3. Series ordering: accepted samples are always chronological
//! 4. Net return: zero starting value always yields exactly zero

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use quantreport_core::{
    PortfolioSnapshot, Sample, Series, TradeDirection, TradeLedger, TradeRecord, EQUITY_SERIES,
};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn trade_closing_at(minute: i64, pnl: f64) -> TradeRecord {
    TradeRecord {
        symbol: "QQQ".into(),
        direction: TradeDirection::Short,
        entry_time: base(),
        entry_price: 400.0,
        exit_time: base() + Duration::minutes(minute),
        exit_price: 390.0,
        quantity: 5.0,
        profit_loss: pnl,
        fees: 0.5,
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_trades() -> impl Strategy<Value = Vec<(i64, f64)>> {
    prop::collection::vec((0i64..20, -500.0..500.0_f64), 0..40)
}

proptest! {
    #[test]
    fn ledger_stays_sorted(trades in arb_trades()) {
        let mut ledger = TradeLedger::new();
        for (minute, pnl) in &trades {
            ledger.record_trade(trade_closing_at(*minute, *pnl));
        }
        let exits: Vec<_> = ledger.closed_trades().iter().map(|t| t.exit_time).collect();
        prop_assert!(exits.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn profit_loss_record_keeps_every_trade(trades in arb_trades()) {
        let ledger = TradeLedger::from_parts(
            trades.iter().map(|(m, p)| trade_closing_at(*m, *p)).collect(),
            vec![],
        );
        let record = ledger.profit_loss_record();
        prop_assert_eq!(record.len(), trades.len());
        let total: f64 = record.values().sum();
        let expected: f64 = trades.iter().map(|(_, p)| p).sum();
        prop_assert!((total - expected).abs() < 1e-6);
    }

    #[test]
    fn accepted_samples_are_chronological(offsets in prop::collection::vec(-5i64..10, 1..60)) {
        let mut series = Series::new(EQUITY_SERIES);
        let mut cursor = base();
        for off in offsets {
            cursor += Duration::seconds(off);
            let _ = series.push(Sample::new(cursor, 1.0));
        }
        let times: Vec<_> = series.samples().iter().map(|s| s.time).collect();
        prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn zero_start_means_zero_return(final_value in -1e9..1e9_f64) {
        let snap = PortfolioSnapshot {
            total_portfolio_value: final_value,
            ..Default::default()
        };
        prop_assert_eq!(snap.net_return(0.0), 0.0);
    }
}
