//! Core 0DTE simulation loop.
//!
//! Runs the per-bar state machine:
//! 1. Validate the input series (lengths, monotonic timestamps, finite prices)
//! 2. For each bar past the volatility warm-up:
//!    a. If a position is open, run the exit policy
//!    b. If flat, the signal is active and the bar sits in an entry window,
//!       run the entry policy
//! 3. Settlement folds each close into the balance and the trade journal
//!
//! One engine instance owns the balance and the single position slot for
//! exactly one run; independent runs never share state.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::BacktestConfig;
use crate::data::{OptionType, PriceBar, Signal};
use crate::journal::{RunSummary, TradeJournal};
use crate::pricing::{BlackScholes, VolatilityEstimator};

use super::position::{ClosedTrade, ExitReason, Position};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("series length mismatch: {bars} bars vs {signals} signals")]
    LengthMismatch { bars: usize, signals: usize },

    #[error("non-monotonic timestamp at bar {index}")]
    NonMonotonicTimestamp { index: usize },

    #[error("non-finite price field at bar {index}")]
    NonFinitePrice { index: usize },
}

/// Engine position slot: flat, or holding exactly one position.
enum State {
    Flat,
    Open(Position),
}

impl State {
    fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Symbol label, bookkeeping only.
    pub symbol: String,
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    /// All closed trades, in close order.
    pub journal: TradeJournal,
}

impl BacktestResult {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_run(
            &self.symbol,
            &self.journal,
            self.initial_balance,
            self.final_balance,
        )
    }
}

/// The backtesting engine: drives the loop, owns balance and the single
/// position slot, emits closed trades.
pub struct BacktestEngine {
    config: BacktestConfig,
    pricer: BlackScholes,
    estimator: VolatilityEstimator,
    symbol: String,
    balance: Decimal,
    state: State,
    journal: TradeJournal,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig, symbol: &str) -> Self {
        let pricer = BlackScholes::new(config.risk_free_rate);
        let estimator = VolatilityEstimator::new(
            config.vol_window,
            config.periods_per_year(),
            config.fallback_vol,
        );
        let balance = config.initial_balance;
        Self {
            config,
            pricer,
            estimator,
            symbol: symbol.to_string(),
            balance,
            state: State::Flat,
            journal: TradeJournal::new(),
        }
    }

    /// Structural validation shared by `run` and the CLI verify command.
    /// Malformed input is fatal before the loop; the engine assumes
    /// well-formed input thereafter.
    pub fn validate_series(bars: &[PriceBar], signals: &[Signal]) -> Result<(), EngineError> {
        if bars.len() != signals.len() {
            return Err(EngineError::LengthMismatch {
                bars: bars.len(),
                signals: signals.len(),
            });
        }
        for (index, bar) in bars.iter().enumerate() {
            if ![bar.open, bar.high, bar.low, bar.close]
                .iter()
                .all(|v| v.is_finite())
            {
                return Err(EngineError::NonFinitePrice { index });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(EngineError::NonMonotonicTimestamp { index });
            }
        }
        Ok(())
    }

    /// Run the simulation over an aligned bar and signal series.
    ///
    /// Consumes the engine: one instance per run. A position still open
    /// when the series ends is left open and does not touch the balance;
    /// on any complete session the end-of-day rule closes it first.
    pub fn run(
        mut self,
        bars: &[PriceBar],
        signals: &[Signal],
    ) -> Result<BacktestResult, EngineError> {
        Self::validate_series(bars, signals)?;

        info!(
            symbol = %self.symbol,
            bars = bars.len(),
            balance = %self.balance,
            "starting 0DTE backtest"
        );

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        // Warm-up: the volatility window needs `vol_window` prior bars.
        for i in self.config.vol_window..bars.len() {
            let bar = &bars[i];

            if self.state.is_open() {
                self.check_exit(bar);
            }

            if !self.state.is_open()
                && signals[i].is_active()
                && self.config.session.is_entry_time(bar.timestamp)
            {
                self.try_enter(signals[i], bar, &closes[..=i]);
            }
        }

        info!(
            symbol = %self.symbol,
            trades = self.journal.len(),
            final_balance = %self.balance,
            "backtest complete"
        );

        Ok(BacktestResult {
            symbol: self.symbol,
            initial_balance: self.config.initial_balance,
            final_balance: self.balance,
            journal: self.journal,
        })
    }

    /// Entry policy. Every rejection is silent (the loop continues) and
    /// logged at debug level.
    fn try_enter(&mut self, signal: Signal, bar: &PriceBar, closes: &[f64]) {
        let spot = bar.close;
        if spot <= 0.0 || spot > self.config.max_spot {
            debug!(spot, "entry rejected: spot outside sanity bounds");
            return;
        }

        let option_type = match signal {
            Signal::Long => OptionType::Call,
            Signal::Short => OptionType::Put,
            Signal::Flat => return,
        };

        // OTM strike: above spot for calls, below for puts.
        let strike = match option_type {
            OptionType::Call => (spot * (1.0 + self.config.otm_pct)).round(),
            OptionType::Put => (spot * (1.0 - self.config.otm_pct)).round(),
        };

        let minutes = self.config.session.minutes_to_close(bar.timestamp);
        if minutes <= self.config.min_minutes_to_expiry {
            debug!(minutes, "entry rejected: too close to expiry");
            return;
        }
        if minutes > self.config.max_minutes_to_expiry {
            debug!(minutes, "entry rejected: not short-dated");
            return;
        }
        let t_years = minutes as f64 / self.config.minutes_per_trading_year();

        let sigma = self
            .estimator
            .estimate(closes)
            .clamp(self.config.min_vol, self.config.max_vol);

        let premium = self.pricer.price(spot, strike, t_years, sigma, option_type);
        if premium < self.config.min_premium
            || premium > self.config.max_premium
            || premium > spot * self.config.max_premium_frac_of_spot
        {
            debug!(premium, "entry rejected: premium outside bounds");
            return;
        }

        let Some(contracts) = self.size_contracts(premium) else {
            debug!(premium, "entry rejected: cannot size even one contract");
            return;
        };

        let cost_basis = dollars(premium)
            * Decimal::from(contracts)
            * Decimal::from(self.config.contract_multiplier);
        let cost_f64: f64 = cost_basis.try_into().unwrap_or(f64::MAX);
        if cost_f64 > self.balance_f64() * self.config.max_single_trade_risk_pct {
            debug!(%cost_basis, "entry rejected: exceeds single-trade risk cap");
            return;
        }

        let entry_greeks = self.pricer.greeks(spot, strike, t_years, sigma, option_type);

        let position = Position {
            option_type,
            strike,
            entry_premium: premium,
            contracts,
            cost_basis,
            entry_time: bar.timestamp,
            sigma,
            sl_price: premium * (1.0 - self.config.sl_pct),
            tp_price: premium * (1.0 + self.config.tp_pct),
            max_premium_seen: premium,
            entry_greeks,
        };

        info!(
            symbol = %self.symbol,
            option_type = position.option_type.as_str(),
            strike,
            premium,
            contracts,
            sigma,
            "entered position"
        );
        self.state = State::Open(position);
    }

    /// Exit policy: defensive force-close, end-of-day expiry, then the
    /// priority-ordered market exits.
    fn check_exit(&mut self, bar: &PriceBar) {
        let spot = bar.close;

        let decision = match &mut self.state {
            State::Flat => return,
            State::Open(position) => {
                if spot <= 0.0 || spot > self.config.max_spot {
                    // Conservative fallback, not a market exit: settle at
                    // entry premium so the simulation keeps progressing.
                    Some((position.entry_premium, ExitReason::InvalidPrice))
                } else {
                    let minutes = self.config.session.minutes_to_close(bar.timestamp);
                    if minutes <= self.config.min_minutes_to_expiry {
                        let t_years = minutes as f64 / self.config.minutes_per_trading_year();
                        let settle = self.pricer.price(
                            spot,
                            position.strike,
                            t_years,
                            position.sigma,
                            position.option_type,
                        );
                        Some((settle, ExitReason::EodExpire))
                    } else {
                        let t_years = minutes as f64 / self.config.minutes_per_trading_year();
                        let raw = self.pricer.price(
                            spot,
                            position.strike,
                            t_years,
                            position.sigma,
                            position.option_type,
                        );
                        // Clamp mark-to-market to suppress pricing blow-ups
                        // far outside model calibration.
                        let current = raw.clamp(
                            self.config.min_exit_premium,
                            position.entry_premium * self.config.premium_clamp_multiple,
                        );

                        position.update_peak(current);
                        let trailing_stop = position.trailing_stop(self.config.trail_pct);

                        evaluate_exit(
                            current,
                            position.entry_premium,
                            position.sl_price,
                            position.tp_price,
                            trailing_stop,
                        )
                        .map(|reason| (current, reason))
                    }
                }
            }
        };

        if let Some((final_premium, reason)) = decision {
            self.settle(final_premium, reason, bar.timestamp);
        }
    }

    /// Capital-constrained sizing: allocate `target_size_pct` of balance,
    /// cap at `max_contracts`. Below one contract, allow exactly one only
    /// when its cost fits the single-trade risk cap.
    fn size_contracts(&self, premium: f64) -> Option<u32> {
        let balance = self.balance_f64();
        let per_contract = premium * self.config.contract_multiplier as f64;
        let capital_alloc = balance * self.config.target_size_pct;

        let mut contracts = (capital_alloc / per_contract).floor() as i64;
        contracts = contracts.min(self.config.max_contracts as i64);

        if contracts < 1 {
            if balance * self.config.max_single_trade_risk_pct >= per_contract {
                contracts = 1;
            } else {
                return None;
            }
        }
        Some(contracts as u32)
    }

    /// Settlement shared by every close reason: fold PnL into the balance,
    /// append the closed trade, free the position slot.
    fn settle(&mut self, final_premium: f64, reason: ExitReason, exit_time: NaiveDateTime) {
        let State::Open(position) = std::mem::replace(&mut self.state, State::Flat) else {
            return;
        };

        let proceeds = dollars(final_premium)
            * Decimal::from(position.contracts)
            * Decimal::from(self.config.contract_multiplier);
        let pnl = proceeds - position.cost_basis;

        let pnl_f64: f64 = pnl.try_into().unwrap_or(0.0);
        let cost_f64: f64 = position.cost_basis.try_into().unwrap_or(1.0);
        let pnl_pct = pnl_f64 / cost_f64 * 100.0;

        self.balance += pnl;

        info!(
            symbol = %self.symbol,
            reason = reason.as_str(),
            exit_premium = final_premium,
            %pnl,
            balance = %self.balance,
            "closed position"
        );

        self.journal.append(ClosedTrade {
            entry_time: position.entry_time,
            exit_time,
            option_type: position.option_type,
            strike: position.strike,
            entry_premium: position.entry_premium,
            exit_premium: final_premium,
            contracts: position.contracts,
            exit_reason: reason,
            pnl,
            pnl_pct,
            balance_after: self.balance,
            entry_greeks: position.entry_greeks,
        });
    }

    fn balance_f64(&self) -> f64 {
        self.balance.try_into().unwrap_or(0.0)
    }

    /// Current balance (mutated only at trade close).
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Whether a position is currently held.
    pub fn has_open_position(&self) -> bool {
        self.state.is_open()
    }
}

fn dollars(premium: f64) -> Decimal {
    Decimal::try_from(premium).unwrap_or(Decimal::ZERO)
}

/// Market-exit triggers in strict priority order, first match wins:
/// hard stop, trailing stop (win then loss leg), take profit.
fn evaluate_exit(
    current: f64,
    entry: f64,
    sl_price: f64,
    tp_price: f64,
    trailing_stop: f64,
) -> Option<ExitReason> {
    if current <= sl_price {
        Some(ExitReason::StopLoss)
    } else if current <= trailing_stop && current > entry {
        Some(ExitReason::TrailingWin)
    } else if current <= trailing_stop {
        Some(ExitReason::TrailingLoss)
    } else if current >= tp_price {
        Some(ExitReason::TakeProfit)
    } else {
        None
    }
}
