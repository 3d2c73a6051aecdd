use crate::estimator::FilterOutput;
use crate::model::signal::{Signal, SpreadDirection};

pub const DEFAULT_THRESHOLD_MULTIPLIER: f64 = 1.0;
pub const AGGRESSIVE_THRESHOLD_MULTIPLIER: f64 = 0.5;

/// Currently held spread direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Regime {
    #[default]
    NoRegime,
    LongSpread,
    ShortSpread,
}

impl Regime {
    fn of(direction: SpreadDirection) -> Self {
        match direction {
            SpreadDirection::Long => Self::LongSpread,
            SpreadDirection::Short => Self::ShortSpread,
        }
    }
}

/// Band crossing between two consecutive steps.
///
/// Residual moving above `+band` from at-or-below it calls for shorting the
/// spread; moving below `-band` from at-or-above it calls for going long.
pub fn band_crossing(
    prev_residual: f64,
    prev_band: f64,
    residual: f64,
    band: f64,
) -> Option<SpreadDirection> {
    if residual > band && prev_residual <= prev_band {
        Some(SpreadDirection::Short)
    } else if residual < -band && prev_residual >= -prev_band {
        Some(SpreadDirection::Long)
    } else {
        None
    }
}

/// Edge-triggered spread signal over the filter's residual stream.
///
/// Raw band crossings drive a three-state regime machine; a signal is emitted
/// only when the regime actually changes, so repeated crossings in the
/// direction already held stay silent.
#[derive(Debug, Clone)]
pub struct ResidualSignalGenerator {
    threshold_multiplier: f64,
    regime: Regime,
    prev: Option<(f64, f64)>,
    flips: u64,
}

impl ResidualSignalGenerator {
    pub fn new(threshold_multiplier: f64) -> Self {
        Self {
            threshold_multiplier,
            regime: Regime::NoRegime,
            prev: None,
            flips: 0,
        }
    }

    pub fn threshold_multiplier(&self) -> f64 {
        self.threshold_multiplier
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    /// Number of regime changes seen so far.
    pub fn flip_count(&self) -> u64 {
        self.flips
    }

    pub fn on_step(&mut self, residual: f64, forecast_std: f64) -> Signal {
        let band = self.threshold_multiplier * forecast_std;
        let raw = self
            .prev
            .and_then(|(prev_e, prev_band)| band_crossing(prev_e, prev_band, residual, band));
        self.prev = Some((residual, band));

        match raw {
            Some(direction) => self.transition(direction),
            None => Signal::NoEvent,
        }
    }

    pub fn on_output(&mut self, out: &FilterOutput) -> Signal {
        self.on_step(out.residual, out.forecast_std())
    }

    fn transition(&mut self, direction: SpreadDirection) -> Signal {
        let next = Regime::of(direction);
        if next == self.regime {
            return Signal::NoEvent;
        }
        self.regime = next;
        self.flips += 1;
        Signal::entering(direction)
    }

    /// Run a fresh generator over a whole filter trajectory.
    pub fn generate(threshold_multiplier: f64, outputs: &[FilterOutput]) -> Vec<Signal> {
        let mut generator = Self::new(threshold_multiplier);
        outputs.iter().map(|o| generator.on_output(o)).collect()
    }
}

impl Default for ResidualSignalGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_MULTIPLIER)
    }
}
