//! Domain types for SignalLab

pub mod ids;
pub mod ledger;
pub mod quality;
pub mod row;
pub mod trade;

pub use ids::{ConfigHash, DatasetHash, RunId};
pub use ledger::{Ledger, LedgerError};
pub use quality::{DataQualityIssue, IssueKind};
pub use row::FeatureRow;
pub use trade::Trade;
