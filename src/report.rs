use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::signal::Signal;
use crate::pipeline::{PairOutcome, PairRun};
use crate::screening::ScreeningResult;

/// One timestamp-indexed row, every stage side by side.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub timestamp_ms: u64,
    pub timestamp: Option<String>,
    pub price_x: f64,
    pub price_y: f64,
    pub hedge: f64,
    pub intercept: f64,
    pub residual: f64,
    pub forecast_std: f64,
    pub signal: Signal,
    pub pos_x: f64,
    pub pos_y: f64,
    pub daily_pnl: Option<f64>,
    pub cumulative_pnl: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub long_entries: usize,
    pub short_entries: usize,
    pub total_pnl: f64,
    pub max_drawdown: f64,
    pub final_hedge: f64,
    pub final_intercept: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub leg_x: String,
    pub leg_y: String,
    pub screening: Option<ScreeningResult>,
    pub summary: RunSummary,
    pub rows: Vec<ReportRow>,
}

fn format_timestamp(ms: u64) -> Option<String> {
    let ms = i64::try_from(ms).ok()?;
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339())
}

/// Largest peak-to-trough fall of the cumulative PnL curve, as a positive number.
pub fn max_drawdown(cumulative: impl IntoIterator<Item = f64>) -> f64 {
    let mut peak = 0.0_f64;
    let mut worst = 0.0_f64;
    for value in cumulative {
        peak = peak.max(value);
        worst = worst.max(peak - value);
    }
    worst
}

pub fn summarize(run: &PairRun) -> RunSummary {
    let last = run.filter.last().copied();
    RunSummary {
        steps: run.pair.len(),
        long_entries: run
            .signals
            .iter()
            .filter(|s| **s == Signal::EnterLongSpread)
            .count(),
        short_entries: run
            .signals
            .iter()
            .filter(|s| **s == Signal::EnterShortSpread)
            .count(),
        total_pnl: run.total_pnl(),
        max_drawdown: max_drawdown(run.pnl.iter().filter_map(|r| r.cumulative_pnl)),
        final_hedge: last.map(|o| o.hedge).unwrap_or(0.0),
        final_intercept: last.map(|o| o.intercept).unwrap_or(0.0),
    }
}

pub fn build_report(run: &PairRun, screening: Option<ScreeningResult>) -> PairReport {
    let rows = run
        .pair
        .points()
        .iter()
        .zip(run.filter.outputs())
        .zip(run.signals.iter().zip(&run.positions))
        .zip(&run.pnl)
        .map(|(((pt, out), (signal, pos)), pnl)| ReportRow {
            timestamp_ms: pt.timestamp_ms,
            timestamp: format_timestamp(pt.timestamp_ms),
            price_x: pt.price_x,
            price_y: pt.price_y,
            hedge: out.hedge,
            intercept: out.intercept,
            residual: out.residual,
            forecast_std: out.forecast_std(),
            signal: *signal,
            pos_x: pos.pos_x,
            pos_y: pos.pos_y,
            daily_pnl: pnl.daily_pnl,
            cumulative_pnl: pnl.cumulative_pnl,
        })
        .collect();

    PairReport {
        leg_x: run.pair.leg_x().to_string(),
        leg_y: run.pair.leg_y().to_string(),
        screening,
        summary: summarize(run),
        rows,
    }
}

pub fn report_file_name(leg_x: &str, leg_y: &str) -> String {
    format!("{}_{}.json", leg_y.to_ascii_lowercase(), leg_x.to_ascii_lowercase())
}

pub fn write_report(dir: &Path, report: &PairReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(report_file_name(&report.leg_x, &report.leg_y));
    let payload = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(&path, payload).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Write a report for every completed outcome; returns the written paths.
pub fn write_reports(dir: &Path, outcomes: &[PairOutcome]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for outcome in outcomes {
        if let PairOutcome::Completed { screening, run } = outcome {
            written.push(write_report(dir, &build_report(run, *screening))?);
        }
    }
    Ok(written)
}
