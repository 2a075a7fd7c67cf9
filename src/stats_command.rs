use std::io;

use anyhow::{Context, Result};
use chrono::DateTime;
use log::info;

use crate::config::{self, ConfigError};
use crate::console::{ConsoleReportTable, ReportPresenter};
use crate::paymo::{PaymoClient, PaymoRepository};
use crate::range::{resolve_range, RangeSpec};
use crate::report;
use crate::time_entry::earliest_activity;

/// 集計期間を指定するための引数。
#[derive(Debug, clap::Args)]
pub struct StatsArgs {
    #[clap(
        short = 'r',
        long = "range",
        help = "Predefined range: week|2w|month|3m|6m|ytd|all"
    )]
    pub range: Option<String>,

    #[clap(
        short = 's',
        long = "start",
        help = "Start date in the format YYYY-MM-DD"
    )]
    pub start: Option<String>,

    #[clap(short = 'e', long = "end", help = "End date in the format YYYY-MM-DD")]
    pub end: Option<String>,
}

impl StatsArgs {
    /// いずれかのフラグで期間が指定されているかどうか。
    pub fn has_selection(&self) -> bool {
        self.range.is_some() || self.start.is_some() || self.end.is_some()
    }
}

/// プロジェクトごとの作業時間のレポートを組み立てるコマンド。
pub struct StatsCommand<'a, T: PaymoRepository> {
    paymo_client: &'a T,
}

impl<'a, T: PaymoRepository> StatsCommand<'a, T> {
    /// 新しい`StatsCommand`を返す。
    ///
    /// # Arguments
    /// * `paymo_client` - Paymo APIと通信するためのリポジトリ
    pub fn new(paymo_client: &'a T) -> Self {
        Self { paymo_client }
    }

    /// 指定された期間のタイムエントリーを集計して表示する。
    ///
    /// エントリーが1件もない場合はその旨のメッセージだけを表示する。
    /// 全期間のレポートでは表示上の開始日を実際に最も早いエントリーの時刻に置き換える。
    pub async fn run(&self, spec: &RangeSpec, presenter: &mut impl ReportPresenter) -> Result<()> {
        let user_id = self
            .paymo_client
            .me()
            .await
            .context("Failed to get current user")?;
        let time_entries = self
            .paymo_client
            .read_time_entries(user_id, &spec.start, &spec.end)
            .await
            .context("Failed to retrieve time entries")?;
        info!(
            "Retrieved {} time entries for range: {}",
            time_entries.len(),
            spec.label
        );

        if time_entries.is_empty() {
            return presenter.show_empty_range(&spec.label, &spec.start, &spec.end);
        }

        let projects = self
            .paymo_client
            .read_projects()
            .await
            .context("Failed to retrieve projects")?;
        let (rows, total_hours) = report::build(&time_entries, &projects);

        let display_start = if spec.start == DateTime::UNIX_EPOCH {
            earliest_activity(&time_entries).unwrap_or(spec.start)
        } else {
            spec.start
        };

        presenter.show_report(&spec.label, &display_start, &spec.end, &rows, total_hours)
    }
}

/// フラグで指定された期間のレポートを表示する。
pub async fn stats_command(stats: StatsArgs) -> Result<()> {
    let api_key = match config::resolve_api_key() {
        Ok(api_key) => api_key,
        Err(ConfigError::NoApiKey) => {
            println!("No API key found. Run `paymostats login --api-key <YOUR_KEY>` first");
            return Ok(());
        }
        Err(err) => return Err(err).context("Failed to resolve API key"),
    };

    let spec = resolve_range(
        stats.range.as_deref(),
        stats.start.as_deref(),
        stats.end.as_deref(),
    )?;

    let client = PaymoClient::new(&api_key);
    let mut stdout = io::stdout();
    let mut presenter = ConsoleReportTable::new(&mut stdout);
    StatsCommand::new(&client).run(&spec, &mut presenter).await
}
