pub mod backtest;
pub mod config;
pub mod data;
pub mod journal;
pub mod pricing;
pub mod session;

// Re-export commonly used types
pub use backtest::{BacktestEngine, BacktestResult, ClosedTrade, EngineError, ExitReason, Position};
pub use config::BacktestConfig;
pub use data::{load_bars, load_signals, Greeks, OptionType, PriceBar, Signal};
pub use journal::{RunSummary, TradeJournal};
pub use pricing::{BlackScholes, VolatilityEstimator};
pub use session::{TradingSession, TradingWindow};
