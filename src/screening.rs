//! Stationarity pre-filter for candidate pairs.
//!
//! Runs a Dickey-Fuller regression with constant on the raw price spread
//!
//! ```text
//! Δs[t] = α + γ·s[t-1] + ε
//! ```
//!
//! and converts the t-statistic of γ to an approximate p-value with
//! MacKinnon's response-surface polynomials (constant, single series).
//! A pair proceeds to the filter only when `p < cutoff`.

use serde::Serialize;

use crate::model::series::TimeSeriesPair;

pub const DEFAULT_P_VALUE_CUTOFF: f64 = 0.10;

/// Below this many observations the test is not attempted.
pub const MIN_OBSERVATIONS: usize = 20;

// MacKinnon (1994, 2010) surface for the constant-only case, N = 1.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DickeyFuller {
    pub statistic: f64,
    pub p_value: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreeningResult {
    pub statistic: Option<f64>,
    pub p_value: f64,
    pub passed: bool,
}

/// Dickey-Fuller test with constant. `None` when the series is too short
/// or the regression is degenerate (e.g. a constant spread).
pub fn dickey_fuller(series: &[f64]) -> Option<DickeyFuller> {
    if series.len() < MIN_OBSERVATIONS {
        return None;
    }
    let n = series.len() - 1;
    let n_f64 = n as f64;

    let lag_mean = series[..n].iter().sum::<f64>() / n_f64;
    let diff_mean = (series[n] - series[0]) / n_f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for w in series.windows(2) {
        let lag = w[0] - lag_mean;
        let diff = (w[1] - w[0]) - diff_mean;
        sxy += lag * diff;
        sxx += lag * lag;
    }
    if sxx.abs() < f64::EPSILON {
        return None;
    }
    let gamma = sxy / sxx;

    let mut sse = 0.0;
    for w in series.windows(2) {
        let fitted = gamma * (w[0] - lag_mean) + diff_mean;
        let resid = (w[1] - w[0]) - fitted;
        sse += resid * resid;
    }
    // Two estimated parameters: α and γ.
    let mse = sse / (n_f64 - 2.0);
    let se = (mse / sxx).sqrt();
    if !se.is_finite() || se < f64::EPSILON {
        return None;
    }

    let statistic = gamma / se;
    Some(DickeyFuller {
        statistic,
        p_value: mackinnon_p_value(statistic),
        observations: n,
    })
}

/// Approximate p-value of a Dickey-Fuller tau statistic (constant case).
pub fn mackinnon_p_value(tau: f64) -> f64 {
    if tau > TAU_MAX {
        return 1.0;
    }
    if tau < TAU_MIN {
        return 0.0;
    }
    let z = if tau <= TAU_STAR {
        polyval(&TAU_SMALL_P, tau)
    } else {
        polyval(&TAU_LARGE_P, tau)
    };
    normal_cdf(z).clamp(0.0, 1.0)
}

fn polyval(coef: &[f64], x: f64) -> f64 {
    coef.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf_approx(x / 2f64.sqrt()))
}

// Abramowitz-Stegun 7.1.26; max error ~1.5e-7, plenty for a gate.
fn erf_approx(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let y = 1.0 - (((((a5 * t + a4) * t + a3) * t + a2) * t + a1) * t * (-x * x).exp());
    sign * y
}

#[derive(Debug, Clone, Copy)]
pub struct StationarityScreen {
    p_value_cutoff: f64,
}

impl StationarityScreen {
    pub fn new(p_value_cutoff: f64) -> Self {
        Self { p_value_cutoff }
    }

    pub fn p_value_cutoff(&self) -> f64 {
        self.p_value_cutoff
    }

    /// Screen a pair on its raw `y - x` spread.
    pub fn screen(&self, pair: &TimeSeriesPair) -> ScreeningResult {
        self.screen_series(&pair.raw_spread())
    }

    pub fn screen_series(&self, spread: &[f64]) -> ScreeningResult {
        match dickey_fuller(spread) {
            Some(df) => ScreeningResult {
                statistic: Some(df.statistic),
                p_value: df.p_value,
                passed: df.p_value < self.p_value_cutoff,
            },
            None => ScreeningResult {
                statistic: None,
                p_value: 1.0,
                passed: false,
            },
        }
    }
}

impl Default for StationarityScreen {
    fn default() -> Self {
        Self::new(DEFAULT_P_VALUE_CUTOFF)
    }
}
