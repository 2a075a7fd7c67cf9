use std::io;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Select};
use log::warn;

use crate::config::{self, ConfigError};
use crate::console::ConsoleReportTable;
use crate::paymo::{self, PaymoClient, PaymoRepository};
use crate::range::{resolve_range, MENU_CHOICES};
use crate::stats_command::StatsCommand;

/// 対話メニューを表示して選択された期間のレポートを繰り返し表示する。
///
/// APIキーが保存されていない場合や認証に失敗した場合は、`login`コマンドへの案内だけを
/// 表示して終了する。レポート1回分のエラーではメニューを終了しない。
pub async fn run_menu() -> Result<()> {
    let api_key = match config::resolve_api_key() {
        Ok(api_key) => api_key,
        Err(ConfigError::NoApiKey) => {
            println!("No API key found, please run `paymostats login` first.");
            return Ok(());
        }
        Err(err) => return Err(err).context("Failed to resolve API key"),
    };

    let client = PaymoClient::new(&api_key);
    if let Err(err) = client.me().await {
        if paymo::is_unauthorized(&err) {
            println!("Stored API key is invalid or expired. Run `paymostats login --api-key <NEW_KEY>` and try again");
            return Ok(());
        }
        return Err(err).context("Failed to get current user");
    }

    let mut items = MENU_CHOICES
        .iter()
        .map(|(_, label)| *label)
        .collect::<Vec<_>>();
    items.push("Quit");

    loop {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Display your Paymo stats")
            .items(&items)
            .default(0)
            .interact()
            .context("Failed to read menu selection")?;
        if selection == items.len() - 1 {
            return Ok(());
        }

        let (token, _) = MENU_CHOICES[selection];
        let spec = resolve_range(Some(token), None, None)?;
        let mut stdout = io::stdout();
        let mut presenter = ConsoleReportTable::new(&mut stdout);
        if let Err(err) = StatsCommand::new(&client).run(&spec, &mut presenter).await {
            warn!("Failed to show report: {:#}", err);
            println!("Error: {:#}", err);
        }
        println!();
    }
}
