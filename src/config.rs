//! Backtest configuration.
//!
//! Every threshold the simulation uses is a named field here so tests can
//! target boundary values and runs stay reproducible from a single TOML
//! file. Defaults match the documented strategy: 0.3% OTM strikes, 20%
//! capital per trade, 40% hard stop, 500% take profit, 20% trailing stop.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::TradingSession;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting account balance.
    pub initial_balance: Decimal,

    /// Annualized risk-free rate for the pricing model.
    pub risk_free_rate: f64,

    /// OTM fraction for strike selection (above spot for calls, below for puts).
    pub otm_pct: f64,

    /// Entries this close to expiry (minutes) are rejected; open positions
    /// are force-closed at this threshold.
    pub min_minutes_to_expiry: i64,

    /// Entries further than this from expiry are not genuinely short-dated.
    pub max_minutes_to_expiry: i64,

    /// Number of trailing log returns in the volatility window.
    pub vol_window: usize,

    /// Lower clamp for the volatility estimate.
    pub min_vol: f64,

    /// Upper clamp for the volatility estimate.
    pub max_vol: f64,

    /// Estimate used when the volatility window has insufficient history.
    pub fallback_vol: f64,

    /// Entry premiums below this are rejected as degenerate.
    pub min_premium: f64,

    /// Entry premiums above this are rejected as pricing blow-ups.
    pub max_premium: f64,

    /// Entry premiums above this fraction of spot are rejected.
    pub max_premium_frac_of_spot: f64,

    /// Spot prices outside (0, max_spot] are treated as invalid.
    pub max_spot: f64,

    /// Fraction of balance allocated per trade.
    pub target_size_pct: f64,

    /// Hard cap on the cost of any single trade as a fraction of balance.
    pub max_single_trade_risk_pct: f64,

    /// Hard cap on contracts per trade.
    pub max_contracts: u32,

    /// Shares per contract.
    pub contract_multiplier: u32,

    /// Stop loss as a fraction of entry premium (0.40 = exit at -40%).
    pub sl_pct: f64,

    /// Take profit as a multiple of entry premium (5.0 = exit at +500%).
    pub tp_pct: f64,

    /// Trailing stop as a fraction retraced from peak premium.
    pub trail_pct: f64,

    /// Mark-to-market premiums are capped at this multiple of entry premium.
    pub premium_clamp_multiple: f64,

    /// Mark-to-market premiums are floored at this value.
    pub min_exit_premium: f64,

    /// Trading days per year, for annualization.
    pub trading_days_per_year: f64,

    /// Trading hours per session, for annualization.
    pub trading_hours_per_day: f64,

    /// Bar granularity of the input series in minutes.
    pub bar_interval_minutes: f64,

    /// Session clock: entry windows and close time.
    pub session: TradingSession,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_balance: Decimal::from(1_000),
            risk_free_rate: 0.045,
            otm_pct: 0.003,
            min_minutes_to_expiry: 15,
            max_minutes_to_expiry: 400,
            vol_window: 20,
            min_vol: 0.10,
            max_vol: 1.00,
            fallback_vol: 0.20,
            min_premium: 0.05,
            max_premium: 50.0,
            max_premium_frac_of_spot: 0.15,
            max_spot: 10_000.0,
            target_size_pct: 0.20,
            max_single_trade_risk_pct: 0.50,
            max_contracts: 100,
            contract_multiplier: 100,
            sl_pct: 0.40,
            tp_pct: 5.0,
            trail_pct: 0.20,
            premium_clamp_multiple: 10.0,
            min_exit_premium: 0.01,
            trading_days_per_year: 252.0,
            trading_hours_per_day: 6.5,
            bar_interval_minutes: 15.0,
            session: TradingSession::default(),
        }
    }
}

impl BacktestConfig {
    /// Bar periods per trading year for the configured granularity
    /// (15m bars: 26/day * 252 days = 6552).
    pub fn periods_per_year(&self) -> f64 {
        self.trading_days_per_year * self.trading_hours_per_day * 60.0 / self.bar_interval_minutes
    }

    /// Minutes in a trading year, the denominator for time-to-expiry.
    pub fn minutes_per_trading_year(&self) -> f64 {
        self.trading_days_per_year * self.trading_hours_per_day * 60.0
    }

    /// Parse a configuration from TOML; omitted fields keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
