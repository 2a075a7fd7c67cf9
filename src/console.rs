use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use prettytable::{row, Table};

use crate::report::ReportRow;

/// レポートをConsoleに表示するためのtrait。
pub trait ReportPresenter {
    /// プロジェクトごとの集計結果を表示する。
    ///
    /// # Arguments
    ///
    /// * `label` - 期間の表示ラベル
    /// * `start_at` - 表示上の期間の開始
    /// * `end_at` - 期間の終了
    /// * `rows` - 集計結果の行
    /// * `total_hours` - 合計時間
    fn show_report(
        &mut self,
        label: &str,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
        rows: &[ReportRow],
        total_hours: f64,
    ) -> Result<()>;

    /// 期間内にエントリーがなかったことを表示する。
    fn show_empty_range(
        &mut self,
        label: &str,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<()>;
}

/// レポートを表形式で表示する。
pub struct ConsoleReportTable<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleReportTable<'a, W> {
    /// 新しい`ConsoleReportTable`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ReportPresenter for ConsoleReportTable<'a, W> {
    fn show_report(
        &mut self,
        label: &str,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
        rows: &[ReportRow],
        total_hours: f64,
    ) -> Result<()> {
        writeln!(
            self.writer,
            "{} ({} to {})",
            label.to_uppercase(),
            start_at.format("%Y-%m-%d"),
            end_at.format("%Y-%m-%d"),
        )
        .context("Failed to write report caption")?;

        let mut table = Table::new();
        table.set_titles(row!["PROJECT", "HOURS", "PERCENT"]);
        for report_row in rows {
            table.add_row(row![
                report_row.name,
                format!("{:.1}", report_row.hours),
                format!("{:.1}%", report_row.percent),
            ]);
        }
        let percent_sum = rows.iter().map(|row| row.percent).sum::<f64>();
        table.add_row(row![
            "TOTAL",
            format!("{:.1} hrs", total_hours),
            format!("{:.1}%", percent_sum),
        ]);
        table
            .print(self.writer)
            .context("Failed to write report table")?;

        Ok(())
    }

    fn show_empty_range(
        &mut self,
        label: &str,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<()> {
        writeln!(
            self.writer,
            "No entries found for {} ({} to {})",
            label,
            start_at.format("%Y-%m-%d"),
            end_at.format("%Y-%m-%d"),
        )
        .context("Failed to write empty range message")?;

        Ok(())
    }
}
