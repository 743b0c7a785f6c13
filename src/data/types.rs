//! Core data types for the 0DTE simulation.
//!
//! A run consumes two externally supplied, index-aligned series: intraday
//! price bars for the underlying and one discrete directional signal per bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" | "CALL" => Some(Self::Call),
            "P" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

/// Greeks for an option contract. Theta is daily (annualized / 365),
/// vega is per 1% change in volatility.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// A single OHLC bar for the underlying, one per sampling interval.
///
/// Bars are read-only inputs: the loader produces them, the engine only
/// ever borrows them. Timestamps must be strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Per-bar directional signal from the external predictive component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Bearish: enter a put.
    Short,
    /// No opinion: never enter.
    Flat,
    /// Bullish: enter a call.
    Long,
}

impl Signal {
    /// Parse from the {-1, 0, 1} encoding used in signal files.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Short),
            0 => Some(Self::Flat),
            1 => Some(Self::Long),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Short => -1,
            Self::Flat => 0,
            Self::Long => 1,
        }
    }

    /// Whether this signal requests an entry at all.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Flat)
    }
}
