use serde::Serialize;

/// PnL at one step. Both fields are `None` on the first step, where no
/// price change exists yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PnlRecord {
    pub daily_pnl: Option<f64>,
    pub cumulative_pnl: Option<f64>,
}
