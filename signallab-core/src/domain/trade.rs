//! Trade: one simulated position opened on a cutoff date and settled at its forward return.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A simulated trade. Created at most once per (date, ticker); never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub ticker: String,
    pub predicted_probability_up: f64,
    pub forward_return: f64,
    /// Capital committed: balance before the trade times the position fraction.
    pub position_size: f64,
    pub profit: f64,
    /// Account balance immediately after this trade settled.
    pub balance_after: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    /// Balance immediately before this trade.
    pub fn balance_before(&self) -> f64 {
        self.balance_after - self.profit
    }
}
