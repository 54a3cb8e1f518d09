//! Shared fixtures: a small synthetic feature panel written to a temp dir.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub const DATES: usize = 30;
pub const WARMUP: usize = 10;

pub fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Three tickers per date:
/// - `UP`: trend_x = 1, label 1, forward return +2%
/// - `DOWN`: trend_x = -1, label 0, forward return -2%
/// - `FLAT`: trend_x = 0, label alternating, forward return +/-0.5%
///
/// ATR is 5% of close everywhere. The last date has no realized forward
/// return.
pub fn panel_csv() -> String {
    let mut out =
        String::from("date,ticker,target,Close,volatility_atr,future_return_5d,trend_x\n");
    for d in 0..DATES {
        let date = start() + chrono::Duration::days(d as i64);
        let last = d + 1 == DATES;
        let fwd = |r: f64| if last { String::new() } else { r.to_string() };
        let flat_label = d % 2;
        let flat_ret = if flat_label == 1 { 0.005 } else { -0.005 };
        writeln!(out, "{date},UP,1,100.0,5.0,{},1.0", fwd(0.02)).unwrap();
        writeln!(out, "{date},DOWN,0,50.0,2.5,{},-1.0", fwd(-0.02)).unwrap();
        writeln!(out, "{date},FLAT,{flat_label},75.0,3.75,{},0.0", fwd(flat_ret)).unwrap();
    }
    out
}

pub fn write_panel(dir: &Path) -> PathBuf {
    write_csv(dir, &panel_csv())
}

/// Date after the warmup on which `panel_with_zero_close_csv` adds a bad row.
pub fn zero_close_date() -> NaiveDate {
    start() + chrono::Duration::days(15)
}

/// The standard panel plus a `BAD` ticker with close 0 on `zero_close_date()`.
/// Its features match `UP`, so only the close keeps it from trading.
pub fn panel_with_zero_close_csv() -> String {
    let mut out = panel_csv();
    writeln!(out, "{},BAD,1,0.0,5.0,0.02,1.0", zero_close_date()).unwrap();
    out
}

pub fn write_csv(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("features.csv");
    std::fs::write(&path, contents).unwrap();
    path
}

/// TOML config pointing at `data_path`, with a small forest.
pub fn config_toml(data_path: &Path, output_dir: &Path) -> String {
    format!(
        r#"[data]
path = "{data}"

[backtest]
warmup_days = {WARMUP}
initial_balance = 100000.0
volatility_threshold = 0.02
confidence_threshold = 0.7
position_fraction = 0.01

[model]
n_trees = 12
max_depth = 4
seed = 7

[output]
dir = "{out}"

[sweep]
confidence_thresholds = [0.6, 0.8, 0.95]
volatility_thresholds = [0.01, 0.04, 0.06]
parallel = true
"#,
        data = data_path.display().to_string().replace('\\', "/"),
        out = output_dir.display().to_string().replace('\\', "/"),
    )
}
