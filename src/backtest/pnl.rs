use crate::error::{PairsError, PairsResult};
use crate::model::pnl::PnlRecord;
use crate::model::position::LegPosition;
use crate::model::series::TimeSeriesPair;

/// Mark-to-market PnL of held positions against each step's price change.
#[derive(Debug, Clone, Copy, Default)]
pub struct PnlAccumulator;

impl PnlAccumulator {
    pub fn accumulate(
        &self,
        pair: &TimeSeriesPair,
        positions: &[LegPosition],
    ) -> PairsResult<Vec<PnlRecord>> {
        if positions.len() != pair.len() {
            return Err(PairsError::LengthMismatch {
                left: positions.len(),
                right: pair.len(),
            });
        }

        let points = pair.points();
        let mut out = Vec::with_capacity(points.len());
        out.push(PnlRecord::default());
        let mut cumulative = 0.0;
        for (window, pos) in points.windows(2).zip(&positions[1..]) {
            let dx = window[1].price_x - window[0].price_x;
            let dy = window[1].price_y - window[0].price_y;
            let daily = pos.mark(dx, dy);
            cumulative += daily;
            out.push(PnlRecord {
                daily_pnl: Some(daily),
                cumulative_pnl: Some(cumulative),
            });
        }
        Ok(out)
    }
}
