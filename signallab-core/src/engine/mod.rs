//! Walk-forward engine.
//!
//! For every cutoff date after the warmup:
//!
//! 1. Train: fit scaler + forest on rows strictly before the cutoff
//! 2. Score: predict P(up) for the cutoff's rows, apply volatility and confidence filters
//! 3. Simulate: size survivors off the running balance, book realized forward returns
//! 4. Record: append trades to the ledger, thread the balance into the next day

pub mod driver;
pub mod error;
pub mod predict;
pub mod scorer;
pub mod simulator;
pub mod trainer;

pub use driver::{run, BacktestOutcome, BacktestParams, DayReport, DegeneratePolicy, SkippedDay};
pub use error::EngineError;
pub use predict::{latest_rows, predict, train_model, PredictOutput, Prediction};
pub use scorer::{
    passes_confidence, passes_volatility, score, volatility_ratio, ScoreOutput, ScoredCandidate,
    Thresholds,
};
pub use simulator::simulate;
pub use trainer::{fit, FittedModel};
