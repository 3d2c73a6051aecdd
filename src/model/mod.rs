pub mod pnl;
pub mod position;
pub mod series;
pub mod signal;
