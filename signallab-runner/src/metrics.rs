//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: balance path and/or trade list in, scalar out.
//! No dependencies on the runner, data pipeline, or engine.

use serde::{Deserialize, Serialize};
use signallab_core::domain::{Ledger, Trade};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_profit: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub max_drawdown: f64,
    pub days_with_trades: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from a ledger.
    pub fn compute(ledger: &Ledger) -> Self {
        let trades = ledger.trades();
        Self {
            total_return: total_return(ledger.initial_balance(), ledger.final_balance()),
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            avg_profit: avg_profit(trades),
            best_trade: best_trade(trades),
            worst_trade: worst_trade(trades),
            max_drawdown: max_drawdown(&ledger.balance_path()),
            days_with_trades: days_with_trades(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(initial: f64, final_balance: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_balance - initial) / initial
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if the balance is constant or monotonically increasing.
pub fn max_drawdown(balance_path: &[f64]) -> f64 {
    let Some(&first) = balance_path.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &b in balance_path {
        if b > peak {
            peak = b;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((b - peak) / peak);
        }
    }
    max_dd
}

/// Win rate: fraction of trades with positive profit.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.profit > 0.0)
        .map(|t| t.profit)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit < 0.0)
        .map(|t| t.profit.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn avg_profit(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.profit).sum::<f64>() / trades.len() as f64
}

/// Largest single-trade profit (0.0 with no trades).
pub fn best_trade(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .map(|t| t.profit)
        .max_by(f64::total_cmp)
        .unwrap_or(0.0)
}

/// Smallest single-trade profit (0.0 with no trades).
pub fn worst_trade(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .map(|t| t.profit)
        .min_by(f64::total_cmp)
        .unwrap_or(0.0)
}

/// Distinct dates with at least one trade. Trades are in date order.
pub fn days_with_trades(trades: &[Trade]) -> usize {
    let mut count = 0;
    let mut last = None;
    for t in trades {
        if last != Some(t.date) {
            count += 1;
            last = Some(t.date);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trade(day: u32, profit: f64, balance_after: f64) -> Trade {
        Trade {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            ticker: "AAA".into(),
            predicted_probability_up: 0.8,
            forward_return: profit / 1000.0,
            position_size: 1000.0,
            profit,
            balance_after,
        }
    }

    fn ledger() -> Ledger {
        let mut l = Ledger::new(1000.0);
        l.append(vec![
            trade(2, 50.0, 1050.0),
            trade(2, -100.0, 950.0),
            trade(3, 25.0, 975.0),
        ]);
        l
    }

    #[test]
    fn compute_all() {
        let m = PerformanceMetrics::compute(&ledger());
        assert_eq!(m.trade_count, 3);
        assert!((m.total_return - (-0.025)).abs() < 1e-12);
        assert!((m.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.profit_factor - 0.75).abs() < 1e-12);
        assert!((m.avg_profit - (-25.0 / 3.0)).abs() < 1e-12);
        assert_eq!(m.best_trade, 50.0);
        assert_eq!(m.worst_trade, -100.0);
        // peak 1050 -> trough 950
        assert!((m.max_drawdown - (-100.0 / 1050.0)).abs() < 1e-12);
        assert_eq!(m.days_with_trades, 2);
    }

    #[test]
    fn empty_ledger_is_all_zero() {
        let m = PerformanceMetrics::compute(&Ledger::new(500.0));
        assert_eq!(m, PerformanceMetrics::default());
    }

    #[test]
    fn profit_factor_capped_without_losses() {
        let trades = vec![trade(2, 10.0, 1010.0)];
        assert_eq!(profit_factor(&trades), 100.0);
    }

    #[test]
    fn monotonic_path_has_no_drawdown() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn total_return_guards_zero_initial() {
        assert_eq!(total_return(0.0, 10.0), 0.0);
        assert!((total_return(100.0, 110.0) - 0.1).abs() < 1e-12);
    }
}
