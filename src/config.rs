use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// APIキーを上書きするための環境変数。主に開発用。
const API_KEY_ENV: &str = "PAYMOSTATS_API_KEY";
const APP_DIR: &str = "paymostats";
const API_KEY_FILE: &str = "api_key";

/// APIキーの保存と取得に関するエラー。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no api key configured")]
    NoApiKey,
    #[error("config directory is not available")]
    NoConfigDir,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// 保存されたAPIキーを取得する。
///
/// 環境変数`PAYMOSTATS_API_KEY`が設定されていればそちらを優先する。
/// どちらにもキーがない場合は`ConfigError::NoApiKey`を返す。
pub fn resolve_api_key() -> Result<String, ConfigError> {
    if let Some(api_key) = env::var(API_KEY_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        return Ok(api_key);
    }

    read_api_key(&api_key_path()?)
}

/// APIキーをユーザー設定ディレクトリ配下のファイルに保存する。
pub fn save_api_key(api_key: &str) -> Result<(), ConfigError> {
    write_api_key(&api_key_path()?, api_key)
}

/// 保存されたAPIキーを削除する。
///
/// キーが保存されていない場合は`ConfigError::NoApiKey`を返す。
pub fn delete_api_key() -> Result<(), ConfigError> {
    remove_api_key(&api_key_path()?)
}

fn api_key_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join(APP_DIR).join(API_KEY_FILE))
}

fn read_api_key(path: &Path) -> Result<String, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(ConfigError::NoApiKey),
        Err(err) => return Err(err.into()),
    };

    let api_key = contents.trim().to_string();
    if api_key.is_empty() {
        return Err(ConfigError::NoApiKey);
    }
    Ok(api_key)
}

fn write_api_key(path: &Path, api_key: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{}\n", api_key))?;

    // キーのファイルは所有者のみ読み書き可能にする
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

fn remove_api_key(path: &Path) -> Result<(), ConfigError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ConfigError::NoApiKey),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    /// 環境変数を触るテストの直列化用。
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(Mutex::default);

    /// 保存したAPIキーがそのまま読み出せることを確認する。
    #[test]
    fn test_write_and_read_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(API_KEY_FILE);

        write_api_key(&path, "1234567890abcdef").unwrap();

        assert_eq!(read_api_key(&path).unwrap(), "1234567890abcdef");
    }

    /// 保存先のディレクトリがなければ作成されることを確認する。
    #[test]
    fn test_write_api_key_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(APP_DIR).join(API_KEY_FILE);

        write_api_key(&path, "key").unwrap();

        assert!(path.exists());
    }

    /// ファイルがない場合は`NoApiKey`になることを確認する。
    #[test]
    fn test_read_api_key_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(API_KEY_FILE);

        let result = read_api_key(&path);

        assert!(matches!(result, Err(ConfigError::NoApiKey)));
    }

    /// 空のファイルはキーなしとして扱われることを確認する。
    #[test]
    fn test_read_api_key_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(API_KEY_FILE);
        std::fs::write(&path, "  \n").unwrap();

        let result = read_api_key(&path);

        assert!(matches!(result, Err(ConfigError::NoApiKey)));
    }

    /// 削除後はキーが読み出せなくなることを確認する。
    #[test]
    fn test_remove_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(API_KEY_FILE);
        write_api_key(&path, "key").unwrap();

        remove_api_key(&path).unwrap();

        assert!(matches!(read_api_key(&path), Err(ConfigError::NoApiKey)));
    }

    /// 保存されていないキーの削除は`NoApiKey`になることを確認する。
    #[test]
    fn test_remove_api_key_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(API_KEY_FILE);

        let result = remove_api_key(&path);

        assert!(matches!(result, Err(ConfigError::NoApiKey)));
    }

    /// 環境変数のAPIキーがファイルより優先されることを確認する。
    #[test]
    fn test_resolve_api_key_prefers_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(API_KEY_ENV, " from-env ");

        let result = resolve_api_key();

        env::remove_var(API_KEY_ENV);
        assert_eq!(result.unwrap(), "from-env");
    }
}
