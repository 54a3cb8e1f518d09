//! SignalLab Core: feature table, classifier, walk-forward engine, ledger.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (feature rows, trades, ledger, data quality issues, ids)
//! - Feature table ingestion from CSV / Parquet and per-cutoff views
//! - Standard scaler and random forest classifier
//! - Walk-forward driver: train, score, filter, simulate, one cutoff at a time
//! - Single-date model training and prediction

pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod model;
pub mod rng;
