use crate::error::{PairsError, PairsResult};
use crate::model::position::LegPosition;
use crate::model::signal::Signal;

pub const DEFAULT_NOTIONAL: f64 = 1000.0;

/// Turns a sparse signal stream into sustained per-leg exposure.
///
/// A signal at step `t` takes effect at `t + 1` and is held until the next
/// one. With direction `d` (+1 long spread, -1 short spread) and hedge ratio
/// `h` at the effective step: `pos_x = -d * notional * h`, `pos_y = d * notional`.
#[derive(Debug, Clone, Copy)]
pub struct PositionSimulator {
    notional: f64,
}

impl PositionSimulator {
    pub fn new(notional: f64) -> PairsResult<Self> {
        if !notional.is_finite() || notional <= 0.0 {
            return Err(PairsError::InvalidConfig(format!(
                "notional must be > 0, got {}",
                notional
            )));
        }
        Ok(Self { notional })
    }

    pub fn notional(&self) -> f64 {
        self.notional
    }

    pub fn simulate(&self, signals: &[Signal], hedges: &[f64]) -> PairsResult<Vec<LegPosition>> {
        if signals.len() != hedges.len() {
            return Err(PairsError::LengthMismatch {
                left: signals.len(),
                right: hedges.len(),
            });
        }

        let mut out = Vec::with_capacity(signals.len());
        let mut held = LegPosition::default();
        let mut pending: Option<Signal> = None;
        for (signal, hedge) in signals.iter().zip(hedges) {
            if let Some(d) = pending.and_then(Signal::direction) {
                let sign = d.sign();
                held = LegPosition {
                    pos_x: -sign * self.notional * hedge,
                    pos_y: sign * self.notional,
                };
            }
            out.push(held);
            pending = signal.is_event().then_some(*signal);
        }
        Ok(out)
    }
}

impl Default for PositionSimulator {
    fn default() -> Self {
        Self {
            notional: DEFAULT_NOTIONAL,
        }
    }
}
