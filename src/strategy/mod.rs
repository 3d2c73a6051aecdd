pub mod residual_band;

pub use residual_band::{band_crossing, Regime, ResidualSignalGenerator};
