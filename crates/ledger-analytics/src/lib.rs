//! Statistics and reporting for pachi-ledger sessions.
//!
//! Computes win rates, per-employee and per-machine rollups, and daily and
//! monthly profit series, plus markdown/text report generation.

pub mod aggregations;
pub mod reports;

pub use aggregations::{
    cumulative, Aggregator, DailyProfit, DailyWindow, GroupSort, GroupStats, MonthlyProfit,
    Overview,
};
pub use reports::ReportGenerator;
