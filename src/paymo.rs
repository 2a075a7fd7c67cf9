use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::info;
#[cfg(test)]
use mockall::automock;
use reqwest::{header::ACCEPT, Client, StatusCode};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use thiserror::Error;

use crate::time_entry::{ProjectMap, TimeEntry};

const PAYMO_API_URL: &str = "https://app.paymoapp.com/api";

/// Paymo APIが返すエラー。
///
/// 認証エラーはリトライせずに呼び出し元で分岐できるよう独立した種類とする。
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(StatusCode),
    #[error("api {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// エラーの原因が認証エラーかどうかを判定する。
pub fn is_unauthorized(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unauthorized(_))
    )
}

/// Paymo APIと通信するためのリポジトリを表すtrait。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaymoRepository {
    /// 現在のユーザーのIDを取得する。
    async fn me(&self) -> Result<i64>;

    /// 指定された期間のタイムエントリーを取得する。
    async fn read_time_entries(
        &self,
        user_id: i64,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>>;

    /// プロジェクトIDから表示名への対応表を取得する。
    async fn read_projects(&self) -> Result<ProjectMap>;
}

/// Paymo APIのタイムエントリーをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct PaymoTimeEntry {
    #[serde(default)]
    project_id: i64,
    #[serde(default)]
    duration: f64,
    #[serde(default, deserialize_with = "unix_timestamp")]
    start_time: Option<i64>,
    #[serde(default, deserialize_with = "unix_timestamp")]
    date: Option<i64>,
}

impl From<PaymoTimeEntry> for TimeEntry {
    fn from(entry: PaymoTimeEntry) -> Self {
        Self {
            project_id: entry.project_id,
            duration: entry.duration,
            start_time: entry.start_time.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            date: entry.date.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

/// Paymo APIのユーザー情報をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct PaymoUser {
    id: i64,
}

/// Paymo APIのプロジェクト情報をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct PaymoProject {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    users: Vec<PaymoUser>,
}

#[derive(Debug, Deserialize)]
struct EntriesResponse {
    entries: Vec<PaymoTimeEntry>,
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    projects: Vec<PaymoProject>,
}

/// Paymo APIのタイムスタンプをepoch秒としてデシリアライズする。
///
/// APIは数値、数値の文字列、RFC3339、日付のみのいずれの形式でも返すため、すべて受け付ける。
/// `null`と空文字は値なしとして扱う。
fn unix_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Number(f64),
        Text(String),
    }

    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Number(value)) => Ok(Some(value as i64)),
        Some(RawTimestamp::Text(value)) => {
            let value = value.trim();
            if value.is_empty() {
                return Ok(None);
            }
            parse_timestamp(value).map(Some).ok_or_else(|| {
                de::Error::custom(format!("unsupported timestamp format: {:?}", value))
            })
        }
    }
}

fn parse_timestamp(value: &str) -> Option<i64> {
    if let Ok(seconds) = value.parse::<i64>() {
        return Some(seconds);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp());
    }
    None
}

/// Paymo APIと通信するためのクライアント。
///
/// # Examples
///
/// ```ignore
/// let client = PaymoClient::new(&api_key);
/// let user_id = client.me().await?;
/// let time_entries = client.read_time_entries(user_id, &start_at, &end_at).await?;
/// ```
pub struct PaymoClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl PaymoClient {
    /// 新しい`PaymoClient`を返す。
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: PAYMO_API_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// GETリクエストを送信してJSONレスポンスをデシリアライズする。
    ///
    /// 401/403は`ApiError::Unauthorized`、その他の失敗ステータスは`ApiError::Status`になる。
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.api_url, path);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.api_key, Some("X"))
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Paymo API at {}", url))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(status).into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body }.into());
        }

        response
            .json::<T>()
            .await
            .context("Failed to deserialize response")
    }
}

#[async_trait]
impl PaymoRepository for PaymoClient {
    async fn me(&self) -> Result<i64> {
        let response: MeResponse = self
            .get_json("me", &[])
            .await
            .context("Failed to get current user from Paymo")?;
        let user = response.users.first().context("No users in /me response")?;

        Ok(user.id)
    }

    async fn read_time_entries(
        &self,
        user_id: i64,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        // 期間はサーバー側のフィルタに両端を含む形で渡す
        let where_clause = format!(
            r#"user_id={} and time_interval in ("{}","{}")"#,
            user_id,
            start_at.format("%Y-%m-%dT%H:%M:%SZ"),
            end_at.format("%Y-%m-%dT%H:%M:%SZ"),
        );
        let response: EntriesResponse = self
            .get_json("entries", &[("where", where_clause)])
            .await
            .context("Failed to retrieve time entries from Paymo")?;
        info!("length of time entries: {}", response.entries.len());

        Ok(response.entries.into_iter().map(TimeEntry::from).collect())
    }

    async fn read_projects(&self) -> Result<ProjectMap> {
        let response: ProjectsResponse = self
            .get_json("projects", &[])
            .await
            .context("Failed to retrieve project list from Paymo")?;
        info!("length of projects: {}", response.projects.len());

        Ok(response
            .projects
            .into_iter()
            .map(|project| (project.id, project.name))
            .collect())
    }
}
