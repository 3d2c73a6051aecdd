use std::sync::Arc;

use tokio::task::JoinSet;

use crate::backtest::{PnlAccumulator, PositionSimulator};
use crate::config::Config;
use crate::error::{PairsError, PairsResult};
use crate::estimator::{FilterRun, KalmanConfig, KalmanHedgeEstimator};
use crate::model::pnl::PnlRecord;
use crate::model::position::LegPosition;
use crate::model::series::TimeSeriesPair;
use crate::model::signal::Signal;
use crate::price_table::PriceTable;
use crate::screening::{ScreeningResult, StationarityScreen};
use crate::strategy::ResidualSignalGenerator;

/// Core parameters for one pair run.
#[derive(Debug, Clone, Copy)]
pub struct PairSettings {
    pub kalman: KalmanConfig,
    pub threshold_multiplier: f64,
    pub notional: f64,
}

impl Default for PairSettings {
    fn default() -> Self {
        Self {
            kalman: KalmanConfig::default(),
            threshold_multiplier: crate::strategy::residual_band::DEFAULT_THRESHOLD_MULTIPLIER,
            notional: crate::backtest::position::DEFAULT_NOTIONAL,
        }
    }
}

impl PairSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            kalman: cfg.filter.kalman(),
            threshold_multiplier: cfg.signal.effective_multiplier(),
            notional: cfg.position.notional,
        }
    }
}

/// Every stage's output for one pair, aligned step by step with the input.
#[derive(Debug, Clone)]
pub struct PairRun {
    pub pair: TimeSeriesPair,
    pub filter: FilterRun,
    pub signals: Vec<Signal>,
    pub positions: Vec<LegPosition>,
    pub pnl: Vec<PnlRecord>,
}

impl PairRun {
    pub fn label(&self) -> String {
        pair_label(self.pair.leg_x(), self.pair.leg_y())
    }

    pub fn total_pnl(&self) -> f64 {
        self.pnl
            .last()
            .and_then(|r| r.cumulative_pnl)
            .unwrap_or(0.0)
    }

    pub fn signal_count(&self) -> usize {
        self.signals.iter().filter(|s| s.is_event()).count()
    }
}

pub fn pair_label(leg_x: &str, leg_y: &str) -> String {
    format!("{}/{}", leg_y, leg_x)
}

/// Estimator -> signal generator -> position simulator -> PnL, for one pair.
pub fn run_pair(pair: TimeSeriesPair, settings: &PairSettings) -> PairsResult<PairRun> {
    let estimator = KalmanHedgeEstimator::new(settings.kalman)?;
    let simulator = PositionSimulator::new(settings.notional)?;
    if !settings.threshold_multiplier.is_finite() || settings.threshold_multiplier <= 0.0 {
        return Err(PairsError::InvalidConfig(format!(
            "threshold_multiplier must be > 0, got {}",
            settings.threshold_multiplier
        )));
    }

    let filter = estimator.run(&pair)?;
    let signals = ResidualSignalGenerator::generate(settings.threshold_multiplier, filter.outputs());
    let positions = simulator.simulate(&signals, &filter.hedges())?;
    let pnl = PnlAccumulator.accumulate(&pair, &positions)?;

    Ok(PairRun {
        pair,
        filter,
        signals,
        positions,
        pnl,
    })
}

#[derive(Debug, Clone)]
pub enum PairOutcome {
    Completed {
        screening: Option<ScreeningResult>,
        run: Box<PairRun>,
    },
    Rejected {
        leg_x: String,
        leg_y: String,
        screening: ScreeningResult,
    },
    Failed {
        leg_x: String,
        leg_y: String,
        error: PairsError,
    },
}

impl PairOutcome {
    pub fn label(&self) -> String {
        match self {
            Self::Completed { run, .. } => run.label(),
            Self::Rejected { leg_x, leg_y, .. } | Self::Failed { leg_x, leg_y, .. } => {
                pair_label(leg_x, leg_y)
            }
        }
    }

    pub fn run(&self) -> Option<&PairRun> {
        match self {
            Self::Completed { run, .. } => Some(run.as_ref()),
            _ => None,
        }
    }
}

/// Align, screen and run one pair against the shared table.
pub fn evaluate_pair(
    table: &PriceTable,
    reference: &str,
    symbol: &str,
    settings: &PairSettings,
    screen: Option<&StationarityScreen>,
) -> PairOutcome {
    let failed = |error: PairsError| PairOutcome::Failed {
        leg_x: reference.to_string(),
        leg_y: symbol.to_string(),
        error,
    };

    let pair = match table.pair(reference, symbol) {
        Ok(p) => p,
        Err(e) => return failed(e),
    };

    let screening = screen.map(|s| s.screen(&pair));
    if let Some(result) = screening {
        tracing::debug!(
            pair = %pair_label(reference, symbol),
            statistic = ?result.statistic,
            p_value = result.p_value,
            passed = result.passed,
            "Stationarity screen"
        );
        if !result.passed {
            return PairOutcome::Rejected {
                leg_x: pair.leg_x().to_string(),
                leg_y: pair.leg_y().to_string(),
                screening: result,
            };
        }
    }

    match run_pair(pair, settings) {
        Ok(run) => PairOutcome::Completed {
            screening,
            run: Box::new(run),
        },
        Err(e) => failed(e),
    }
}

/// Fan out one blocking task per dependent symbol, all reading the same
/// table, and collect the outcomes in input order.
pub async fn run_pairs(
    table: Arc<PriceTable>,
    reference: &str,
    symbols: &[String],
    settings: PairSettings,
    screen: Option<StationarityScreen>,
) -> Vec<PairOutcome> {
    let mut tasks = JoinSet::new();
    for (idx, symbol) in symbols.iter().enumerate() {
        let table = Arc::clone(&table);
        let reference = reference.to_string();
        let symbol = symbol.clone();
        tasks.spawn_blocking(move || {
            let outcome = evaluate_pair(&table, &reference, &symbol, &settings, screen.as_ref());
            (idx, outcome)
        });
    }

    let mut slots: Vec<Option<PairOutcome>> = vec![None; symbols.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, outcome)) => {
                match &outcome {
                    PairOutcome::Completed { run, .. } => tracing::info!(
                        pair = %run.label(),
                        steps = run.pair.len(),
                        signals = run.signal_count(),
                        total_pnl = run.total_pnl(),
                        "Pair run complete"
                    ),
                    PairOutcome::Rejected { screening, .. } => tracing::info!(
                        pair = %outcome.label(),
                        p_value = screening.p_value,
                        "Pair rejected by stationarity screen"
                    ),
                    PairOutcome::Failed { error, .. } => tracing::warn!(
                        pair = %outcome.label(),
                        error = %error,
                        "Pair run failed"
                    ),
                }
                slots[idx] = Some(outcome);
            }
            Err(e) => tracing::error!(error = %e, "Pair task panicked"),
        }
    }
    slots.into_iter().flatten().collect()
}
