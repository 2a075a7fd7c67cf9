use anyhow::{Context, Result};

use crate::config::{self, ConfigError};

/// `logout`サブコマンドの処理を行う。
///
/// 保存されたAPIキーを削除する。キーが保存されていない場合もエラーにはしない。
pub fn logout_command() -> Result<()> {
    match config::delete_api_key() {
        Ok(()) => {
            println!("API key removed");
            Ok(())
        }
        Err(ConfigError::NoApiKey) => {
            println!("No API key stored.");
            Ok(())
        }
        Err(err) => Err(err).context("Failed to delete API key"),
    }
}
