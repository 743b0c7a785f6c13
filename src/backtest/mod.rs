//! 0DTE backtesting: the simulation engine and position lifecycle.

pub mod engine;
pub mod position;

pub use engine::{BacktestEngine, BacktestResult, EngineError};
pub use position::{ClosedTrade, ExitReason, Position};
