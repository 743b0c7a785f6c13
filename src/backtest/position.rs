//! Position lifecycle types.
//!
//! A position is created by the entry policy, revalued every bar it stays
//! open, and destroyed by whichever exit rule fires first. Closing folds
//! it into the account balance and produces an immutable [`ClosedTrade`].

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::{Greeks, OptionType};

/// Reason a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Hard stop: premium fell to the stop-loss level.
    StopLoss,
    /// Trailing stop fired above entry, locking in a gain.
    TrailingWin,
    /// Trailing stop fired at or below entry.
    TrailingLoss,
    /// Premium reached the take-profit multiple.
    TakeProfit,
    /// Forced close at session end; 0DTE positions never carry overnight.
    EodExpire,
    /// Defensive close on an invalid spot price, settled at entry premium.
    InvalidPrice,
}

impl ExitReason {
    /// Journal status label, the stable contract consumed by reporting tools.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StopLoss => "Loss_SL",
            Self::TrailingWin => "Win_Trail",
            Self::TrailingLoss => "Loss_Trail",
            Self::TakeProfit => "Win_TP_Moon",
            Self::EodExpire => "EOD_Expire",
            Self::InvalidPrice => "Error_InvalidPrice",
        }
    }
}

/// A single live option position. The engine holds at most one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub option_type: OptionType,
    /// Strike price, rounded to the nearest whole strike at entry.
    pub strike: f64,
    /// Premium paid per share at entry.
    pub entry_premium: f64,
    /// Contracts held (>= 1).
    pub contracts: u32,
    /// Total entry cost: premium * contracts * multiplier.
    pub cost_basis: Decimal,
    pub entry_time: NaiveDateTime,
    /// Volatility frozen at entry and reused for every revaluation.
    pub sigma: f64,
    /// Stop-loss premium level.
    pub sl_price: f64,
    /// Take-profit premium level.
    pub tp_price: f64,
    /// Peak premium observed since entry, ratchets the trailing stop.
    pub max_premium_seen: f64,
    pub entry_greeks: Greeks,
}

impl Position {
    /// Ratchet the peak premium.
    pub fn update_peak(&mut self, premium: f64) {
        if premium > self.max_premium_seen {
            self.max_premium_seen = premium;
        }
    }

    /// Trailing-stop level for the current peak.
    pub fn trailing_stop(&self, trail_pct: f64) -> f64 {
        self.max_premium_seen * (1.0 - trail_pct)
    }
}

/// A completed trade, appended once to the journal at close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub option_type: OptionType,
    pub strike: f64,
    pub entry_premium: f64,
    pub exit_premium: f64,
    pub contracts: u32,
    pub exit_reason: ExitReason,
    pub pnl: Decimal,
    /// PnL as a percentage of cost basis.
    pub pnl_pct: f64,
    /// Account balance immediately after this close.
    pub balance_after: Decimal,
    pub entry_greeks: Greeks,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_reason_labels() {
        assert_eq!(ExitReason::StopLoss.as_str(), "Loss_SL");
        assert_eq!(ExitReason::TrailingWin.as_str(), "Win_Trail");
        assert_eq!(ExitReason::TrailingLoss.as_str(), "Loss_Trail");
        assert_eq!(ExitReason::TakeProfit.as_str(), "Win_TP_Moon");
        assert_eq!(ExitReason::EodExpire.as_str(), "EOD_Expire");
        assert_eq!(ExitReason::InvalidPrice.as_str(), "Error_InvalidPrice");
    }

    #[test]
    fn test_peak_ratchet_and_trailing_stop() {
        let mut position = Position {
            option_type: OptionType::Call,
            strike: 500.0,
            entry_premium: 1.0,
            contracts: 1,
            cost_basis: Decimal::from(100),
            entry_time: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            sigma: 0.2,
            sl_price: 0.6,
            tp_price: 6.0,
            max_premium_seen: 1.0,
            entry_greeks: Greeks::default(),
        };

        position.update_peak(1.30);
        assert_eq!(position.max_premium_seen, 1.30);
        // Peak never retreats
        position.update_peak(1.10);
        assert_eq!(position.max_premium_seen, 1.30);
        assert!((position.trailing_stop(0.20) - 1.04).abs() < 1e-12);
    }
}
