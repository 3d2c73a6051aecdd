use serde::Serialize;

/// Notional exposure held in each leg at one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LegPosition {
    pub pos_x: f64,
    pub pos_y: f64,
}

impl LegPosition {
    pub fn is_flat(&self) -> bool {
        self.pos_x == 0.0 && self.pos_y == 0.0
    }

    /// Mark-to-market change for one step given both legs' price moves.
    pub fn mark(&self, dx: f64, dy: f64) -> f64 {
        self.pos_x * dx + self.pos_y * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_flat() {
        assert!(LegPosition::default().is_flat());
    }

    #[test]
    fn mark_sums_both_legs() {
        let pos = LegPosition {
            pos_x: -2000.0,
            pos_y: 1000.0,
        };
        // Short 2000 of X that rose 0.5, long 1000 of Y that rose 1.5
        assert!((pos.mark(0.5, 1.5) - 500.0).abs() < f64::EPSILON);
    }
}
