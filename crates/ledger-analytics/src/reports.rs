//! Text and markdown report generation from session statistics.

use crate::aggregations::{cumulative, format_amount, Aggregator, DailyWindow, GroupSort};
use chrono::NaiveDate;
use ledger_core::lookup::LookupTables;
use ledger_core::types::Session;

/// Report generator for printing summaries outside the dashboard.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Generate a markdown report covering all sessions, with a daily table
    /// for the last `days` days before `today`.
    pub fn markdown_report(
        aggregator: &Aggregator,
        sessions: &[Session],
        lookups: &LookupTables,
        today: NaiveDate,
        days: u32,
    ) -> String {
        let overview = aggregator.overview(sessions);
        let mut report = String::new();

        report.push_str(&format!(
            "# Session Report\n\n**As of {}**\n\n",
            today.format("%B %d, %Y")
        ));

        report.push_str("## Overview\n\n");
        report.push_str(&format!("- **Sessions:** {}\n", overview.total_sessions));
        report.push_str(&format!(
            "- **Win Rate:** {:.1}% ({} wins)\n",
            overview.win_rate, overview.win_count
        ));
        report.push_str(&format!(
            "- **Total Profit:** ¥{}\n",
            format_amount(overview.total_profit)
        ));
        report.push_str(&format!(
            "- **Avg Investment:** ¥{}\n",
            format_amount(overview.avg_investment.round() as i64)
        ));
        report.push_str(&format!(
            "- **Avg Payout:** ¥{}\n",
            format_amount(overview.avg_payout.round() as i64)
        ));
        report.push_str(&format!(
            "- **Best / Worst Session:** ¥{} / ¥{}\n\n",
            format_amount(overview.max_profit),
            format_amount(overview.min_profit)
        ));

        // Newest month first, as on the dashboard.
        if !overview.monthly_profit.is_empty() {
            report.push_str("## Monthly Profit\n\n");
            report.push_str("| Month | Profit |\n");
            report.push_str("|-------|--------|\n");
            for (month, profit) in overview.monthly_profit.iter().rev() {
                report.push_str(&format!("| {} | ¥{} |\n", month, format_amount(*profit)));
            }
            report.push('\n');
        }

        let groups = [
            (
                "Employees",
                aggregator.by_employee(sessions, lookups, GroupSort::Profit),
            ),
            (
                "Machines",
                aggregator.by_machine(sessions, lookups, GroupSort::Profit),
            ),
        ];
        for (title, stats) in &groups {
            if stats.is_empty() {
                continue;
            }
            report.push_str(&format!("## {}\n\n", title));
            report.push_str("| Name | Sessions | Win Rate | Profit | Avg Profit |\n");
            report.push_str("|------|----------|----------|--------|------------|\n");
            for g in stats {
                report.push_str(&format!(
                    "| {} | {} | {:.1}% | ¥{} | ¥{} |\n",
                    g.name,
                    g.sessions,
                    g.win_rate,
                    format_amount(g.profit),
                    format_amount(g.avg_profit.round() as i64),
                ));
            }
            report.push('\n');
        }

        let daily = aggregator.daily_profit_filled(sessions, DailyWindow::Days(days), today);
        let running = cumulative(&daily);
        report.push_str(&format!("## Last {} Days\n\n", days));
        report.push_str("| Day | Profit | Cumulative |\n");
        report.push_str("|-----|--------|------------|\n");
        for (day, total) in daily.iter().zip(&running) {
            if day.profit == 0 {
                report.push_str(&format!("| {} | - | ¥{} |\n", day.date, format_amount(total.profit)));
            } else {
                report.push_str(&format!(
                    "| {} | ¥{} | ¥{} |\n",
                    day.date,
                    format_amount(day.profit),
                    format_amount(total.profit)
                ));
            }
        }
        report.push('\n');

        report
    }

    /// Generate a compact plain-text summary for the terminal.
    pub fn text_summary(
        aggregator: &Aggregator,
        sessions: &[Session],
        lookups: &LookupTables,
        today: NaiveDate,
    ) -> String {
        let mut output = String::new();
        let overview = aggregator.overview(sessions);

        if overview.total_sessions == 0 {
            output.push_str("  No sessions recorded\n");
            return output;
        }

        output.push_str(&format!(
            "  All time: {} sessions, win rate {:.1}%, profit ¥{}\n",
            overview.total_sessions,
            overview.win_rate,
            format_amount(overview.total_profit)
        ));
        output.push_str(&format!(
            "  Avg investment ¥{}  Avg payout ¥{}\n",
            format_amount(overview.avg_investment.round() as i64),
            format_amount(overview.avg_payout.round() as i64)
        ));

        for (month, profit) in overview.monthly_profit.iter().rev().take(3) {
            output.push_str(&format!("  {}: ¥{}\n", month, format_amount(*profit)));
        }

        let week = aggregator.daily_profit(sessions, DailyWindow::Days(7), today);
        let week_profit: i64 = week.iter().map(|d| d.profit).sum();
        output.push_str(&format!(
            "  Last 7 days: ¥{} over {} active days\n",
            format_amount(week_profit),
            week.len()
        ));

        if let Some(best) = aggregator
            .by_employee(sessions, lookups, GroupSort::Profit)
            .first()
        {
            output.push_str(&format!(
                "  Top employee: {} (¥{})\n",
                best.name,
                format_amount(best.profit)
            ));
        }
        if let Some(best) = aggregator
            .by_machine(sessions, lookups, GroupSort::Profit)
            .first()
        {
            output.push_str(&format!(
                "  Top machine: {} (¥{})\n",
                best.name,
                format_amount(best.profit)
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::seed::demo_sessions;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 17).unwrap()
    }

    #[test]
    fn test_markdown_report_structure() {
        let report = ReportGenerator::markdown_report(
            &Aggregator::default(),
            &demo_sessions(),
            &LookupTables::default(),
            today(),
            7,
        );
        assert!(report.contains("# Session Report"));
        assert!(report.contains("## Overview"));
        assert!(report.contains("## Monthly Profit"));
        assert!(report.contains("| 2025-05 | ¥22,000 |"));
        assert!(report.contains("## Employees"));
        assert!(report.contains("## Machines"));
        assert!(report.contains("## Last 7 Days"));
        assert!(report.contains("ハナハナ"));
    }

    #[test]
    fn test_markdown_daily_table_cumulative() {
        let report = ReportGenerator::markdown_report(
            &Aggregator::default(),
            &demo_sessions(),
            &LookupTables::default(),
            today(),
            3,
        );
        assert!(report.contains("| 2025-05-15 | ¥15,000 | ¥15,000 |"));
        assert!(report.contains("| 2025-05-16 | ¥15,000 | ¥30,000 |"));
        assert!(report.contains("| 2025-05-17 | ¥-8,000 | ¥22,000 |"));
    }

    #[test]
    fn test_text_summary() {
        let summary = ReportGenerator::text_summary(
            &Aggregator::default(),
            &demo_sessions(),
            &LookupTables::default(),
            today(),
        );
        assert!(summary.contains("All time: 5 sessions"));
        assert!(summary.contains("win rate 40.0%"));
        assert!(summary.contains("2025-05: ¥22,000"));
        assert!(summary.contains("Top machine: ハナハナ (¥20,000)"));
    }

    #[test]
    fn test_empty_text_summary() {
        let summary = ReportGenerator::text_summary(
            &Aggregator::default(),
            &[],
            &LookupTables::default(),
            today(),
        );
        assert!(summary.contains("No sessions"));
    }

    #[test]
    fn test_empty_markdown_report() {
        let report = ReportGenerator::markdown_report(
            &Aggregator::default(),
            &[],
            &LookupTables::default(),
            today(),
            7,
        );
        assert!(report.contains("- **Sessions:** 0"));
        assert!(report.contains("| - |"));
        assert!(!report.contains("## Monthly Profit"));
    }
}
