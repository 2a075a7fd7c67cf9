use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Password};

use crate::config;
use crate::paymo::{self, PaymoClient, PaymoRepository};

const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// `login`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    #[clap(
        short = 'k',
        long = "api-key",
        help = "Paymo API key (validated and stored)"
    )]
    api_key: Option<String>,
}

/// `login`サブコマンドの処理を行う。
///
/// `--api-key`が指定されていれば検証して保存する。指定がない場合は対話的に入力を求め、
/// 認証エラーの場合は最大3回まで再入力できる。空の入力でキャンセルする。
pub async fn login_command(login: LoginArgs) -> Result<()> {
    // フラグ指定時は確認なしで既存のキーを上書きする
    if let Some(api_key) = login
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|api_key| !api_key.is_empty())
    {
        match validate_api_key(api_key).await {
            Ok(()) => {}
            Err(err) if paymo::is_unauthorized(&err) => bail!("The provided API key is invalid"),
            Err(err) => return Err(err).context("Could not validate API key"),
        }
        config::save_api_key(api_key).context("Failed to save API key")?;
        println!("API key saved");
        return Ok(());
    }

    // 既にログイン済みであれば上書きするか確認する
    if config::resolve_api_key().is_ok() {
        let replace = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("You're already logged in. Login with a different API key?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !replace {
            return Ok(());
        }
        config::delete_api_key().context("Failed to delete stored API key")?;
    }

    for attempt in 1..=MAX_LOGIN_ATTEMPTS {
        let api_key = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Paste your Paymo API key (empty to cancel)")
            .allow_empty_password(true)
            .interact()
            .context("Failed to read API key")?;
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            println!("Canceled");
            return Ok(());
        }

        match validate_api_key(&api_key).await {
            Ok(()) => {
                config::save_api_key(&api_key).context("Failed to save API key")?;
                println!("API key saved");
                return Ok(());
            }
            Err(err) if paymo::is_unauthorized(&err) => {
                println!(
                    "API key is invalid. Try again ({}/{})",
                    attempt, MAX_LOGIN_ATTEMPTS
                );
            }
            Err(err) => return Err(err).context("Could not validate API key"),
        }
    }

    println!("Too many failed attempts. Aborting.");
    Ok(())
}

/// APIキーで認証できることを確認する。
async fn validate_api_key(api_key: &str) -> Result<()> {
    let client = PaymoClient::new(api_key);
    client.me().await.map(|_| ())
}
