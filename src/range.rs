use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use crate::datetime;

/// 対話メニューに表示する期間の選択肢。トークンと表示ラベルの組。
pub const MENU_CHOICES: [(&str, &str); 7] = [
    ("week", "Last week"),
    ("2w", "Last two weeks"),
    ("month", "Last month"),
    ("3m", "Last 3 months"),
    ("6m", "Last 6 months"),
    ("ytd", "Year to date"),
    ("all", "All time"),
];

/// 解決済みの集計期間。
///
/// `start`と`end`はどちらも集計対象に含まれる。`end`が`start`より前になることはない。
#[derive(Clone, Debug, PartialEq)]
pub struct RangeSpec {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 期間の解決に失敗した場合のエラー。
#[derive(Debug, Error, PartialEq)]
pub enum RangeError {
    #[error("no range selected (use: week|2w|month|3m|6m|ytd|all, or a start/end date)")]
    NoSelection,
    #[error("unknown range {0:?} (use: week|2w|month|3m|6m|ytd|all)")]
    UnknownRange(String),
    #[error("a start date is required when an end date is given")]
    MissingStartDate,
    #[error("invalid date {0:?} (expected format: YYYY-MM-DD)")]
    InvalidDateFormat(String),
    #[error("end date {end} is before start date {start}")]
    InvertedRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// 期間トークンまたは明示的な日付指定から集計期間を解決する。
///
/// 日付が1つでも指定されている場合はトークンを無視して日付指定を優先する。
/// 終了日のみの指定はエラー、開始日のみの指定では終了を現在時刻とする。
/// 時刻の基準はすべてUTCで、1回だけ取得した現在時刻を使う。
///
/// # Arguments
///
/// * `token` - 名前付き期間のトークン(例: `"2w"`、`"ytd"`)
/// * `start_date` - `YYYY-MM-DD`形式の開始日
/// * `end_date` - `YYYY-MM-DD`形式の終了日
pub fn resolve_range(
    token: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<RangeSpec, RangeError> {
    let now = datetime::now();
    let start_date = start_date.map(str::trim).filter(|value| !value.is_empty());
    let end_date = end_date.map(str::trim).filter(|value| !value.is_empty());

    // 日付指定があれば名前付き期間より優先する
    if start_date.is_some() || end_date.is_some() {
        let start_date = start_date.ok_or(RangeError::MissingStartDate)?;
        let start = parse_date(start_date)?;
        let end = match end_date {
            Some(value) => parse_date(value)?,
            None => now,
        };
        if end < start {
            return Err(RangeError::InvertedRange { start, end });
        }
        return Ok(RangeSpec {
            label: "Custom".to_string(),
            start,
            end,
        });
    }

    let token = token.map(str::trim).unwrap_or_default().to_lowercase();
    match token.as_str() {
        "week" | "1w" | "last-week" => Ok(days_back("Last week", now, 7)),
        "2w" | "two-weeks" | "last-2-weeks" => Ok(days_back("Last two weeks", now, 14)),
        "month" | "1m" | "last-month" => Ok(months_back("Last month", now, 1)),
        "3m" | "quarter" | "last-3-months" => Ok(months_back("Last 3 months", now, 3)),
        "6m" | "last-6-months" => Ok(months_back("Last 6 months", now, 6)),
        "ytd" | "year-to-date" => Ok(RangeSpec {
            label: "Year to date".to_string(),
            start: NaiveDate::from_ymd_opt(now.year(), 1, 1)
                .expect("January 1 always exists")
                .and_time(NaiveTime::MIN)
                .and_utc(),
            end: now,
        }),
        "all" | "forever" => Ok(RangeSpec {
            label: "All time".to_string(),
            start: DateTime::UNIX_EPOCH,
            end: now,
        }),
        "" => Err(RangeError::NoSelection),
        _ => Err(RangeError::UnknownRange(token)),
    }
}

/// `YYYY-MM-DD`形式の日付をUTCの00:00:00としてパースする。
fn parse_date(value: &str) -> Result<DateTime<Utc>, RangeError> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RangeError::InvalidDateFormat(value.to_string()))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

fn days_back(label: &str, now: DateTime<Utc>, days: i64) -> RangeSpec {
    RangeSpec {
        label: label.to_string(),
        start: now - Duration::days(days),
        end: now,
    }
}

fn months_back(label: &str, now: DateTime<Utc>, months: u32) -> RangeSpec {
    RangeSpec {
        label: label.to_string(),
        // 月単位の減算は短い月では月末に丸められる
        start: now
            .checked_sub_months(Months::new(months))
            .expect("subtracting months from the current time never underflows"),
        end: now,
    }
}
