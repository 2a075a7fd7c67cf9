use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};

mod config;
mod console;
mod datetime;
mod login_command;
mod logout_command;
mod menu;
mod paymo;
mod range;
mod report;
mod stats_command;
mod time_entry;

use login_command::{login_command, LoginArgs};
use logout_command::logout_command;
use stats_command::{stats_command, StatsArgs};

/// Paymoのプロジェクトごとの作業時間の割合を表示するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- --range 2w
/// $ cargo run -- --start 2025-07-01 --end 2025-07-25
/// $ cargo run              # 対話メニュー
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(flatten)]
    stats: StatsArgs,

    #[clap(subcommand)]
    subcommand: Option<SubCommands>,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Validate and store your Paymo API key
    Login(LoginArgs),
    /// Remove your stored Paymo API key
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logger().context("Failed to set up logger")?;

    match args.subcommand {
        Some(SubCommands::Login(login)) => login_command(login).await?,
        Some(SubCommands::Logout) => logout_command()?,
        None if args.stats.has_selection() => stats_command(args.stats).await?,
        None => menu::run_menu().await?,
    }

    Ok(())
}

/// stderrにログを出力するloggerを設定する。
fn setup_logger() -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                message
            ))
        })
        .level(log::LevelFilter::Warn)
        .level_for("paymostats", log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()
        .context("Failed to apply logger configuration")?;

    Ok(())
}
