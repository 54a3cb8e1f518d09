//! Ledger: the append-only, chronological history of simulated trades.
//!
//! The ledger is the only authoritative record of balance evolution. Its
//! accounting identity is `balance_after[i] == balance_after[i-1] + profit[i]`,
//! with the first trade based on the initial balance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::trade::Trade;

/// Violation of the ledger's accounting identity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error(
        "accounting identity broken at trade {index}: expected balance {expected}, recorded {recorded}"
    )]
    BalanceMismatch {
        index: usize,
        expected: f64,
        recorded: f64,
    },
}

/// Ordered sequence of trades. Insertion order is simulation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    initial_balance: f64,
    trades: Vec<Trade>,
}

impl Ledger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            trades: Vec::new(),
        }
    }

    /// Append one day's trades, in the order the simulator produced them.
    pub fn append(&mut self, trades: impl IntoIterator<Item = Trade>) {
        self.trades.extend(trades);
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Balance after the last trade, or the initial balance if nothing traded.
    pub fn final_balance(&self) -> f64 {
        self.trades
            .last()
            .map(|t| t.balance_after)
            .unwrap_or(self.initial_balance)
    }

    /// Initial balance followed by every `balance_after`, in ledger order.
    pub fn balance_path(&self) -> Vec<f64> {
        std::iter::once(self.initial_balance)
            .chain(self.trades.iter().map(|t| t.balance_after))
            .collect()
    }

    /// Re-check the accounting identity over the whole ledger.
    pub fn verify(&self) -> Result<(), LedgerError> {
        let mut balance = self.initial_balance;
        for (index, trade) in self.trades.iter().enumerate() {
            let expected = balance + trade.profit;
            if expected != trade.balance_after {
                return Err(LedgerError::BalanceMismatch {
                    index,
                    expected,
                    recorded: trade.balance_after,
                });
            }
            balance = trade.balance_after;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trade(day: u32, profit: f64, balance_after: f64) -> Trade {
        Trade {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            ticker: "X".into(),
            predicted_probability_up: 0.9,
            forward_return: profit / 1_000.0,
            position_size: 1_000.0,
            profit,
            balance_after,
        }
    }

    #[test]
    fn empty_ledger_keeps_initial_balance() {
        let ledger = Ledger::new(50_000.0);
        assert!(ledger.is_empty());
        assert_eq!(ledger.final_balance(), 50_000.0);
        assert_eq!(ledger.balance_path(), vec![50_000.0]);
        assert!(ledger.verify().is_ok());
    }

    #[test]
    fn append_preserves_order() {
        let mut ledger = Ledger::new(100.0);
        ledger.append(vec![trade(2, 1.0, 101.0), trade(2, -2.0, 99.0)]);
        ledger.append(vec![trade(3, 0.5, 99.5)]);

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.final_balance(), 99.5);
        assert_eq!(ledger.balance_path(), vec![100.0, 101.0, 99.0, 99.5]);
        assert!(ledger.verify().is_ok());
    }

    #[test]
    fn verify_reports_first_mismatch() {
        let mut ledger = Ledger::new(100.0);
        ledger.append(vec![trade(2, 1.0, 101.0), trade(3, 1.0, 105.0)]);

        match ledger.verify() {
            Err(LedgerError::BalanceMismatch {
                index,
                expected,
                recorded,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(expected, 102.0);
                assert_eq!(recorded, 105.0);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }
}
