use thiserror::Error;

/// Leg of a price pair, used to point at the offending series in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    X,
    Y,
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::X => f.write_str("x"),
            Leg::Y => f.write_str("y"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PairsError {
    #[error("malformed input: series lengths differ ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("malformed input: non-finite {leg} price {value} at step {step}")]
    NonFinitePrice { leg: Leg, step: usize, value: f64 },

    #[error("malformed input: timestamp at step {step} is not strictly increasing")]
    UnsortedTimestamps { step: usize },

    #[error("insufficient data: need at least 2 observations, got {len}")]
    InsufficientData { len: usize },

    #[error("singular covariance at step {step}: forecast variance {forecast_var} <= 0")]
    SingularCovariance { step: usize, forecast_var: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown asset: {0}")]
    UnknownAsset(String),
}

impl PairsError {
    /// True for the malformed-input family (length, finiteness, ordering).
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::LengthMismatch { .. } | Self::NonFinitePrice { .. } | Self::UnsortedTimestamps { .. }
        )
    }
}

pub type PairsResult<T> = std::result::Result<T, PairsError>;
