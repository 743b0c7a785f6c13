//! Closed-form option valuation and volatility estimation.
//!
//! Pure numerical functions with no simulation state: Black-Scholes
//! pricing and Greeks, plus a rolling historical volatility estimator.

pub mod black_scholes;
pub mod volatility;

pub use black_scholes::BlackScholes;
pub use volatility::VolatilityEstimator;
