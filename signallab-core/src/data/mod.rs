//! Feature table: column schema, ingestion, and per-cutoff views

pub mod ingest;
pub mod schema;
pub mod table;

pub use ingest::{ingest_dataframe, read_feature_file, IngestError, IngestResult};
pub use schema::{ColumnSchema, SchemaError};
pub use table::{EvaluationSlice, FeatureTable, TrainingWindow};
