use crate::error::{Leg, PairsError, PairsResult};

/// One aligned observation of both legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp_ms: u64,
    pub price_x: f64,
    pub price_y: f64,
}

/// Immutable, validated pair of aligned price series.
///
/// Leg X is the regressor (the hedge leg), leg Y the dependent leg.
/// Construction guarantees: at least two points, finite prices and strictly
/// increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPair {
    leg_x: String,
    leg_y: String,
    points: Vec<PricePoint>,
}

impl TimeSeriesPair {
    pub fn new(
        leg_x: impl Into<String>,
        leg_y: impl Into<String>,
        points: Vec<PricePoint>,
    ) -> PairsResult<Self> {
        if points.len() < 2 {
            return Err(PairsError::InsufficientData { len: points.len() });
        }
        for (step, p) in points.iter().enumerate() {
            if !p.price_x.is_finite() {
                return Err(PairsError::NonFinitePrice {
                    leg: Leg::X,
                    step,
                    value: p.price_x,
                });
            }
            if !p.price_y.is_finite() {
                return Err(PairsError::NonFinitePrice {
                    leg: Leg::Y,
                    step,
                    value: p.price_y,
                });
            }
            if step > 0 && p.timestamp_ms <= points[step - 1].timestamp_ms {
                return Err(PairsError::UnsortedTimestamps { step });
            }
        }
        Ok(Self {
            leg_x: leg_x.into(),
            leg_y: leg_y.into(),
            points,
        })
    }

    /// Build from three parallel columns.
    pub fn from_columns(
        leg_x: impl Into<String>,
        leg_y: impl Into<String>,
        timestamps_ms: &[u64],
        prices_x: &[f64],
        prices_y: &[f64],
    ) -> PairsResult<Self> {
        if prices_x.len() != prices_y.len() {
            return Err(PairsError::LengthMismatch {
                left: prices_x.len(),
                right: prices_y.len(),
            });
        }
        if timestamps_ms.len() != prices_x.len() {
            return Err(PairsError::LengthMismatch {
                left: timestamps_ms.len(),
                right: prices_x.len(),
            });
        }
        let points = timestamps_ms
            .iter()
            .zip(prices_x.iter().zip(prices_y.iter()))
            .map(|(&timestamp_ms, (&price_x, &price_y))| PricePoint {
                timestamp_ms,
                price_x,
                price_y,
            })
            .collect();
        Self::new(leg_x, leg_y, points)
    }

    /// Build with a synthetic 1, 2, 3, ... index. Handy for fixtures.
    pub fn from_prices(prices_x: &[f64], prices_y: &[f64]) -> PairsResult<Self> {
        let timestamps: Vec<u64> = (1..=prices_x.len() as u64).collect();
        Self::from_columns("X", "Y", &timestamps, prices_x, prices_y)
    }

    pub fn leg_x(&self) -> &str {
        &self.leg_x
    }

    pub fn leg_y(&self) -> &str {
        &self.leg_y
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn timestamps_ms(&self) -> impl Iterator<Item = u64> + '_ {
        self.points.iter().map(|p| p.timestamp_ms)
    }

    pub fn prices_x(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price_x)
    }

    pub fn prices_y(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price_y)
    }

    /// Raw price spread `y - x`, the series fed to stationarity screening.
    pub fn raw_spread(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price_y - p.price_x).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_single_point() {
        let err = TimeSeriesPair::from_prices(&[1.0], &[2.0]).unwrap_err();
        assert_eq!(err, PairsError::InsufficientData { len: 1 });
    }

    #[test]
    fn rejects_nan_on_either_leg() {
        let err = TimeSeriesPair::from_prices(&[1.0, f64::NAN], &[2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            PairsError::NonFinitePrice {
                leg: Leg::X,
                step: 1,
                ..
            }
        ));
        let err = TimeSeriesPair::from_prices(&[1.0, 2.0], &[f64::INFINITY, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            PairsError::NonFinitePrice {
                leg: Leg::Y,
                step: 0,
                ..
            }
        ));
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err =
            TimeSeriesPair::from_columns("A", "B", &[10, 20, 20], &[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0])
                .unwrap_err();
        assert_eq!(err, PairsError::UnsortedTimestamps { step: 2 });
    }

    #[test]
    fn raw_spread_is_y_minus_x() {
        let pair = TimeSeriesPair::from_prices(&[1.0, 2.0], &[3.0, 5.0]).unwrap();
        assert_eq!(pair.raw_spread(), vec![2.0, 3.0]);
    }
}
