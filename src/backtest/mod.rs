pub mod pnl;
pub mod position;

pub use pnl::PnlAccumulator;
pub use position::PositionSimulator;
