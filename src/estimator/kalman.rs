//! Two-state Kalman filter tracking a drifting hedge ratio and intercept.
//!
//! Observation model, one step per aligned price pair:
//!
//! ```text
//! y[t]    = x[t] * hedge[t] + intercept[t] + v,   v ~ N(0, Ve)
//! beta[t] = beta[t-1] + w,                         w ~ N(0, Vw * I)
//! Vw      = delta / (1 - delta)
//! ```
//!
//! The filter starts from `beta = (0, 0)` with a zero covariance and injects
//! no state noise before the first observation, so the first step leaves
//! `beta` untouched. Short series therefore carry a warm-up transient.

use serde::Serialize;

use crate::error::{PairsError, PairsResult};
use crate::model::series::TimeSeriesPair;

const DIM: usize = 2;

type Vec2 = [f64; DIM];
type Mat2 = [[f64; DIM]; DIM];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanConfig {
    /// State drift control in (0, 1).
    pub delta: f64,
    /// Observation noise variance `Ve`, must be > 0.
    pub observation_var: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            delta: 1e-4,
            observation_var: 1e-3,
        }
    }
}

impl KalmanConfig {
    pub fn validate(&self) -> PairsResult<()> {
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(PairsError::InvalidConfig(format!(
                "delta must be in (0, 1), got {}",
                self.delta
            )));
        }
        if !self.observation_var.is_finite() || self.observation_var <= 0.0 {
            return Err(PairsError::InvalidConfig(format!(
                "observation_var must be > 0, got {}",
                self.observation_var
            )));
        }
        Ok(())
    }

    /// Diagonal entry of the state noise covariance `Vw`.
    pub fn state_noise_var(&self) -> f64 {
        self.delta / (1.0 - self.delta)
    }
}

/// Posterior state after a step: `beta = (hedge, intercept)` and its covariance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KalmanState {
    pub beta: Vec2,
    pub p: Mat2,
}

impl KalmanState {
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn hedge(&self) -> f64 {
        self.beta[0]
    }

    pub fn intercept(&self) -> f64 {
        self.beta[1]
    }

    /// Smallest eigenvalue of the symmetric part of `P`.
    pub fn min_eigenvalue(&self) -> f64 {
        let a = self.p[0][0];
        let d = self.p[1][1];
        let b = 0.5 * (self.p[0][1] + self.p[1][0]);
        let half_trace = 0.5 * (a + d);
        let det = a * d - b * b;
        let disc = (half_trace * half_trace - det).max(0.0);
        half_trace - disc.sqrt()
    }
}

/// Per-step filter output, never revised once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterOutput {
    pub hedge: f64,
    pub intercept: f64,
    /// Innovation `e = y - y_est`, computed with the prior `beta`.
    pub residual: f64,
    /// Innovation variance `Q`.
    pub forecast_var: f64,
}

impl FilterOutput {
    pub fn forecast_std(&self) -> f64 {
        self.forecast_var.sqrt()
    }
}

/// One filter recursion. `step` is the zero-based position in the series;
/// step 0 skips the state-noise injection.
pub fn kalman_step(
    prior: &KalmanState,
    price_x: f64,
    price_y: f64,
    step: usize,
    cfg: &KalmanConfig,
) -> PairsResult<(KalmanState, FilterOutput)> {
    let x: Vec2 = [price_x, 1.0];

    let mut r = prior.p;
    if step > 0 {
        let vw = cfg.state_noise_var();
        r[0][0] += vw;
        r[1][1] += vw;
    }

    let y_est = dot(&x, &prior.beta);
    let rx = mat_vec(&r, &x);
    let q = dot(&x, &rx) + cfg.observation_var;
    if !q.is_finite() || q <= 0.0 {
        return Err(PairsError::SingularCovariance {
            step,
            forecast_var: q,
        });
    }

    let e = price_y - y_est;
    let k = [rx[0] / q, rx[1] / q];

    let beta = [prior.beta[0] + k[0] * e, prior.beta[1] + k[1] * e];

    // P = R - K (x^T R)
    let xr = vec_mat(&x, &r);
    let mut p = [[0.0; DIM]; DIM];
    for (i, row) in p.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = r[i][j] - k[i] * xr[j];
        }
    }

    let state = KalmanState { beta, p };
    let output = FilterOutput {
        hedge: beta[0],
        intercept: beta[1],
        residual: e,
        forecast_var: q,
    };
    Ok((state, output))
}

fn dot(a: &Vec2, b: &Vec2) -> f64 {
    let mut s = 0.0;
    for i in 0..DIM {
        s += a[i] * b[i];
    }
    s
}

fn mat_vec(m: &Mat2, v: &Vec2) -> Vec2 {
    let mut out = [0.0; DIM];
    for (i, out_i) in out.iter_mut().enumerate() {
        *out_i = dot(&m[i], v);
    }
    out
}

fn vec_mat(v: &Vec2, m: &Mat2) -> Vec2 {
    let mut out = [0.0; DIM];
    for (j, out_j) in out.iter_mut().enumerate() {
        let mut s = 0.0;
        for (i, v_i) in v.iter().enumerate() {
            s += *v_i * m[i][j];
        }
        *out_j = s;
    }
    out
}

/// Full filter trajectory: posterior states and outputs, one per input step.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRun {
    states: Vec<KalmanState>,
    outputs: Vec<FilterOutput>,
}

impl FilterRun {
    pub fn states(&self) -> &[KalmanState] {
        &self.states
    }

    pub fn outputs(&self) -> &[FilterOutput] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn hedges(&self) -> Vec<f64> {
        self.outputs.iter().map(|o| o.hedge).collect()
    }

    pub fn residuals(&self) -> Vec<f64> {
        self.outputs.iter().map(|o| o.residual).collect()
    }

    pub fn last(&self) -> Option<&FilterOutput> {
        self.outputs.last()
    }
}

#[derive(Debug, Clone)]
pub struct KalmanHedgeEstimator {
    cfg: KalmanConfig,
}

impl KalmanHedgeEstimator {
    pub fn new(cfg: KalmanConfig) -> PairsResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &KalmanConfig {
        &self.cfg
    }

    pub fn run(&self, pair: &TimeSeriesPair) -> PairsResult<FilterRun> {
        let n = pair.len();
        let mut states = Vec::with_capacity(n);
        let mut outputs = Vec::with_capacity(n);
        let mut state = KalmanState::initial();
        for (step, pt) in pair.points().iter().enumerate() {
            let (next, out) = kalman_step(&state, pt.price_x, pt.price_y, step, &self.cfg)?;
            states.push(next);
            outputs.push(out);
            state = next;
        }
        tracing::trace!(
            leg_x = pair.leg_x(),
            leg_y = pair.leg_y(),
            steps = n,
            hedge = state.hedge(),
            intercept = state.intercept(),
            "Kalman filter run complete"
        );
        Ok(FilterRun { states, outputs })
    }
}
