//! Trade simulator: fixed-fraction sizing with sequential compounding.

use crate::domain::Trade;

use super::scorer::ScoredCandidate;

/// Simulate one day's candidates against their realized forward returns.
///
/// Each trade is sized off the balance left by the previous trade of the same
/// day. Candidates without a realized forward return are skipped, not booked
/// at zero profit. Returns the closing balance and the trades in input order.
pub fn simulate(
    candidates: &[ScoredCandidate<'_>],
    balance: f64,
    position_fraction: f64,
) -> (f64, Vec<Trade>) {
    candidates
        .iter()
        .filter_map(|c| c.forward_return().map(|r| (c, r)))
        .fold((balance, Vec::new()), |(balance, mut trades), (c, forward_return)| {
            let position_size = balance * position_fraction;
            let profit = position_size * forward_return;
            let balance_after = balance + profit;
            trades.push(Trade {
                date: c.date(),
                ticker: c.ticker().to_string(),
                predicted_probability_up: c.predicted_probability_up,
                forward_return,
                position_size,
                profit,
                balance_after,
            });
            (balance_after, trades)
        })
}
