//! Trade journal and run summary.
//!
//! The journal is the audit trail of a run: every closed trade, appended
//! once at settlement and never mutated afterwards. Exports use a fixed
//! column layout so downstream reporting notebooks keep working across
//! engine versions.

use std::io::Write;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backtest::ClosedTrade;
use crate::data::loader::TIMESTAMP_FORMAT;

/// CSV column layout. Order and names are a stable contract.
pub const JOURNAL_COLUMNS: &[&str] = &[
    "EntryTime",
    "ExitTime",
    "Type",
    "Strike",
    "EntryPremium",
    "ExitPremium",
    "Contracts",
    "Status",
    "PnL",
    "PnL%",
    "Balance",
    "Delta",
    "Gamma",
    "Theta",
];

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only record of closed trades, in close order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeJournal {
    trades: Vec<ClosedTrade>,
}

impl TradeJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, trade: ClosedTrade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Write the journal as CSV to `path`, overwriting any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<(), JournalError> {
        let writer = csv::Writer::from_path(path)?;
        self.write_to(writer)
    }

    fn write_to<W: Write>(&self, mut writer: csv::Writer<W>) -> Result<(), JournalError> {
        writer.write_record(JOURNAL_COLUMNS)?;
        for trade in &self.trades {
            writer.write_record(&journal_row(trade))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// One journal row. Dollar figures and percentages carry two decimals;
/// gamma keeps four since ATM 0DTE gamma lives in the third decimal.
fn journal_row(trade: &ClosedTrade) -> Vec<String> {
    vec![
        trade.entry_time.format(TIMESTAMP_FORMAT).to_string(),
        trade.exit_time.format(TIMESTAMP_FORMAT).to_string(),
        trade.option_type.as_str().to_string(),
        format!("{:.2}", trade.strike),
        format!("{:.2}", trade.entry_premium),
        format!("{:.2}", trade.exit_premium),
        trade.contracts.to_string(),
        trade.exit_reason.as_str().to_string(),
        format!("{:.2}", trade.pnl),
        format!("{:.2}", trade.pnl_pct),
        format!("{:.2}", trade.balance_after),
        format!("{:.2}", trade.entry_greeks.delta),
        format!("{:.4}", trade.entry_greeks.gamma),
        format!("{:.2}", trade.entry_greeks.theta),
    ]
}

/// Aggregate statistics for a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub symbol: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winners as a percentage of all trades; zero for an empty run.
    pub win_rate_pct: f64,
    /// Mean PnL% across winning trades.
    pub avg_win_pct: f64,
    /// Mean PnL% across non-winning trades (zero-PnL trades count here).
    pub avg_loss_pct: f64,
    pub net_pnl: Decimal,
    pub return_pct: f64,
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
}

impl RunSummary {
    pub fn from_run(
        symbol: &str,
        journal: &TradeJournal,
        initial_balance: Decimal,
        final_balance: Decimal,
    ) -> Self {
        let trades = journal.trades();
        let total_trades = trades.len();
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = total_trades - winning_trades;

        let mean_pct = |keep: &dyn Fn(&&ClosedTrade) -> bool| -> f64 {
            let selected: Vec<f64> = trades.iter().filter(keep).map(|t| t.pnl_pct).collect();
            if selected.is_empty() {
                0.0
            } else {
                selected.iter().sum::<f64>() / selected.len() as f64
            }
        };

        let net_pnl = final_balance - initial_balance;
        let initial_f64: f64 = initial_balance.try_into().unwrap_or(1.0);
        let net_f64: f64 = net_pnl.try_into().unwrap_or(0.0);

        Self {
            symbol: symbol.to_string(),
            total_trades,
            winning_trades,
            losing_trades,
            win_rate_pct: if total_trades == 0 {
                0.0
            } else {
                winning_trades as f64 / total_trades as f64 * 100.0
            },
            avg_win_pct: mean_pct(&|t| t.is_winner()),
            avg_loss_pct: mean_pct(&|t| !t.is_winner()),
            net_pnl,
            return_pct: net_f64 / initial_f64 * 100.0,
            initial_balance,
            final_balance,
        }
    }

    /// Human-readable report block for the CLI.
    pub fn report(&self) -> String {
        format!(
            "=== Backtest Summary: {} ===\n\
             Trades:      {}\n\
             Win rate:    {:.1}% ({}W / {}L)\n\
             Avg win:     {:+.1}%\n\
             Avg loss:    {:+.1}%\n\
             Net PnL:     ${:.2}\n\
             Return:      {:+.2}%\n\
             Balance:     ${:.2} -> ${:.2}",
            self.symbol,
            self.total_trades,
            self.win_rate_pct,
            self.winning_trades,
            self.losing_trades,
            self.avg_win_pct,
            self.avg_loss_pct,
            self.net_pnl,
            self.return_pct,
            self.initial_balance,
            self.final_balance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::ExitReason;
    use crate::data::{Greeks, OptionType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal, pnl_pct: f64, balance_after: Decimal) -> ClosedTrade {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        ClosedTrade {
            entry_time: day.and_hms_opt(14, 0, 0).unwrap(),
            exit_time: day.and_hms_opt(15, 0, 0).unwrap(),
            option_type: OptionType::Call,
            strike: 500.0,
            entry_premium: 0.50,
            exit_premium: 0.75,
            contracts: 4,
            exit_reason: ExitReason::TrailingWin,
            pnl,
            pnl_pct,
            balance_after,
            entry_greeks: Greeks {
                delta: 0.48,
                gamma: 0.0231,
                theta: -0.35,
                vega: 0.04,
            },
        }
    }

    #[test]
    fn test_csv_header_contract() {
        let mut journal = TradeJournal::new();
        journal.append(trade(dec!(100), 50.0, dec!(1100)));

        let mut buf = Vec::new();
        journal.write_to(csv::Writer::from_writer(&mut buf)).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "EntryTime,ExitTime,Type,Strike,EntryPremium,ExitPremium,\
             Contracts,Status,PnL,PnL%,Balance,Delta,Gamma,Theta"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("2024-03-01 14:00:00,2024-03-01 15:00:00,call,500.00"));
        assert!(row.contains(",Win_Trail,100.00,50.00,1100.00,"));
        // Gamma keeps four decimals
        assert!(row.contains(",0.0231,"));
    }

    #[test]
    fn test_summary_statistics() {
        let mut journal = TradeJournal::new();
        journal.append(trade(dec!(100), 50.0, dec!(1100)));
        journal.append(trade(dec!(-40), -20.0, dec!(1060)));
        // Break-even trades count as losses
        journal.append(trade(dec!(0), 0.0, dec!(1060)));

        let summary = RunSummary::from_run("SPY", &journal, dec!(1000), dec!(1060));
        assert_eq!(summary.total_trades, 3);
        assert_eq!(summary.winning_trades, 1);
        assert_eq!(summary.losing_trades, 2);
        assert!((summary.win_rate_pct - 100.0 / 3.0).abs() < 1e-9);
        assert!((summary.avg_win_pct - 50.0).abs() < 1e-9);
        assert!((summary.avg_loss_pct - (-10.0)).abs() < 1e-9);
        assert_eq!(summary.net_pnl, dec!(60));
        assert!((summary.return_pct - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_run_summary() {
        let journal = TradeJournal::new();
        let summary = RunSummary::from_run("SPY", &journal, dec!(1000), dec!(1000));
        assert_eq!(summary.total_trades, 0);
        assert_eq!(summary.win_rate_pct, 0.0);
        assert_eq!(summary.net_pnl, Decimal::ZERO);

        let report = summary.report();
        assert!(report.contains("Trades:      0"));
        assert!(report.contains("SPY"));
    }
}
