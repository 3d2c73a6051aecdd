pub mod kalman;

pub use kalman::{
    kalman_step, FilterOutput, FilterRun, KalmanConfig, KalmanHedgeEstimator, KalmanState,
};
