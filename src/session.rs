//! Exchange session clock: entry windows and time-to-close.
//!
//! Every calendar and timezone assumption lives in this one configurable
//! type rather than in the simulation core. Times are interpreted in
//! whatever clock the input series uses; the defaults approximate the US
//! equity session as seen from UTC (09:30-16:00 ET ~= 13:30-20:00 UTC)
//! with no daylight-saving or holiday handling. Swap the configuration to
//! change the exchange calendar; the engine only ever calls
//! [`TradingSession::minutes_to_close`] and [`TradingSession::is_entry_time`].

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A time-of-day interval during which entries are permitted.
/// Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Session-close time plus the set of entry windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingSession {
    /// Time of day the session (and any 0DTE option) expires.
    pub close: NaiveTime,
    /// Windows in which new positions may be opened: defaults cover the
    /// open, midday and pre-close segments.
    pub entry_windows: Vec<TradingWindow>,
}

impl Default for TradingSession {
    fn default() -> Self {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        Self {
            close: t(20, 0),
            entry_windows: vec![
                TradingWindow::new(t(13, 30), t(14, 59)),
                TradingWindow::new(t(16, 0), t(16, 59)),
                TradingWindow::new(t(18, 30), t(19, 15)),
            ],
        }
    }
}

impl TradingSession {
    /// Whole minutes until session close; negative after the close.
    pub fn minutes_to_close(&self, timestamp: NaiveDateTime) -> i64 {
        let time = timestamp.time();
        let close_minutes = self.close.hour() as i64 * 60 + self.close.minute() as i64;
        let bar_minutes = time.hour() as i64 * 60 + time.minute() as i64;
        close_minutes - bar_minutes
    }

    /// Whether a bar's time of day falls inside any entry window.
    pub fn is_entry_time(&self, timestamp: NaiveDateTime) -> bool {
        let time = timestamp.time();
        self.entry_windows.iter().any(|w| w.contains(time))
    }
}
