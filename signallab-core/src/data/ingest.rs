//! Feature table ingestion from CSV and Parquet files.
//!
//! Reading goes through polars; conversion into `FeatureRow`s is row by row so
//! each defective row can be recorded as a `DataQualityIssue` and dropped
//! without failing the whole load. Structural problems (unreadable file,
//! missing columns) are hard errors.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::data::schema::{ColumnSchema, SchemaError};
use crate::data::table::FeatureTable;
use crate::domain::{DataQualityIssue, FeatureRow, IssueKind};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ingest failed: {0}")]
    Polars(String),

    #[error("unsupported file format '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<PolarsError> for IngestError {
    fn from(e: PolarsError) -> Self {
        IngestError::Polars(e.to_string())
    }
}

/// A loaded table plus every row-level issue found while converting it.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub table: FeatureTable,
    pub issues: Vec<DataQualityIssue>,
}

/// Read a CSV or Parquet file (chosen by extension) into a feature table.
pub fn read_feature_file(path: &Path, schema: &ColumnSchema) -> Result<IngestResult, IngestError> {
    let df = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => read_csv(path)?,
        Some("parquet") | Some("pq") => read_parquet(path)?,
        other => return Err(IngestError::UnsupportedFormat(other.unwrap_or("").to_string())),
    };
    ingest_dataframe(&df, schema)
}

pub fn read_csv(path: &Path) -> Result<DataFrame, IngestError> {
    if !path.exists() {
        return Err(IngestError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

pub fn read_parquet(path: &Path) -> Result<DataFrame, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ParquetReader::new(file).finish()?)
}

/// Convert a DataFrame into a feature table.
pub fn ingest_dataframe(df: &DataFrame, schema: &ColumnSchema) -> Result<IngestResult, IngestError> {
    let feature_names = schema.validate(df)?;

    let dates = string_column(df, &schema.date)?;
    let tickers = string_column(df, &schema.ticker)?;
    let labels = float_column(df, &schema.label)?;
    let closes = float_column(df, &schema.close)?;
    let vols = float_column(df, &schema.volatility)?;
    let fwd = float_column(df, &schema.forward_return)?;
    let feature_cols: Vec<Float64Chunked> = feature_names
        .iter()
        .map(|name| float_column(df, name))
        .collect::<Result<_, _>>()?;

    let mut rows = Vec::with_capacity(df.height());
    let mut issues = Vec::new();

    for i in 0..df.height() {
        let date = dates.get(i).and_then(parse_date);
        let ticker = tickers.get(i).map(str::trim).filter(|t| !t.is_empty());

        let (date, ticker) = match (date, ticker) {
            (Some(d), Some(t)) => (d, t),
            (d, t) => {
                let missing = if d.is_none() { &schema.date } else { &schema.ticker };
                issues.push(DataQualityIssue::new(
                    d,
                    t,
                    IssueKind::MissingField,
                    format!("row {i}: '{missing}' is null or unparsable"),
                ));
                continue;
            }
        };

        let label = match finite(labels.get(i)) {
            Some(v) if v == 0.0 || v == 1.0 => v as u8,
            Some(v) => {
                issues.push(DataQualityIssue::new(
                    Some(date),
                    Some(ticker),
                    IssueKind::InvalidLabel,
                    format!("'{}' = {v}", schema.label),
                ));
                continue;
            }
            None => {
                issues.push(missing_field(date, ticker, &schema.label));
                continue;
            }
        };

        let Some(close_price) = finite(closes.get(i)) else {
            issues.push(missing_field(date, ticker, &schema.close));
            continue;
        };
        let Some(volatility_measure) = finite(vols.get(i)) else {
            issues.push(missing_field(date, ticker, &schema.volatility));
            continue;
        };

        let mut features = BTreeMap::new();
        let mut missing = None;
        for (name, col) in feature_names.iter().zip(&feature_cols) {
            match finite(col.get(i)) {
                Some(v) => {
                    features.insert(name.clone(), v);
                }
                None => {
                    missing = Some(name);
                    break;
                }
            }
        }
        if let Some(name) = missing {
            issues.push(missing_field(date, ticker, name));
            continue;
        }

        rows.push(FeatureRow {
            date,
            ticker: ticker.to_string(),
            features,
            label,
            close_price,
            volatility_measure,
            forward_return: finite(fwd.get(i)),
        });
    }

    Ok(IngestResult {
        table: FeatureTable::new(rows, feature_names),
        issues,
    })
}

fn missing_field(date: NaiveDate, ticker: &str, column: &str) -> DataQualityIssue {
    DataQualityIssue::new(
        Some(date),
        Some(ticker),
        IssueKind::MissingField,
        format!("'{column}' is null"),
    )
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time component.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn string_column(df: &DataFrame, name: &str) -> Result<StringChunked, IngestError> {
    let col = df
        .column(name)
        .map_err(|_| SchemaError::MissingColumn(name.to_string()))?;
    let cast = col.cast(&DataType::String)?;
    Ok(cast.str()?.clone())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked, IngestError> {
    let col = df
        .column(name)
        .map_err(|_| SchemaError::MissingColumn(name.to_string()))?;
    let cast = col.cast(&DataType::Float64)?;
    Ok(cast.f64()?.clone())
}
