use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// 1件の作業時間の記録。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub project_id: i64,
    /// 作業時間(秒)。
    pub duration: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub date: Option<DateTime<Utc>>,
}

/// プロジェクトIDから表示名への対応表。
pub type ProjectMap = HashMap<i64, String>;

/// 全エントリーの中で最も早い記録時刻を返す。
///
/// `start_time`と`date`の両方を対象とする。どのエントリーにも時刻がない場合は`None`を返す。
pub fn earliest_activity(entries: &[TimeEntry]) -> Option<DateTime<Utc>> {
    entries
        .iter()
        .flat_map(|entry| entry.start_time.into_iter().chain(entry.date))
        .min()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::earliest_activity;
    use super::TimeEntry;

    fn entry(start_time: Option<(i32, u32, u32)>, date: Option<(i32, u32, u32)>) -> TimeEntry {
        let to_datetime =
            |(year, month, day)| Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap();
        TimeEntry {
            project_id: 1,
            duration: 3600.0,
            start_time: start_time.map(to_datetime),
            date: date.map(to_datetime),
        }
    }

    /// `start_time`と`date`の混在した中から最小の時刻が選ばれることを確認する。
    #[test]
    fn test_earliest_activity_mixed_fields() {
        let entries = vec![
            entry(Some((2024, 3, 1)), None),
            entry(None, Some((2021, 5, 2))),
            entry(Some((2023, 1, 1)), Some((2022, 12, 31))),
        ];

        assert_eq!(
            earliest_activity(&entries),
            Some(Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap())
        );
    }

    /// 時刻を持つエントリーが1件もない場合は`None`になることを確認する。
    #[test]
    fn test_earliest_activity_no_timestamps() {
        let entries = vec![entry(None, None), entry(None, None)];

        assert_eq!(earliest_activity(&entries), None);
    }

    /// 空のエントリー列では`None`になることを確認する。
    #[test]
    fn test_earliest_activity_empty() {
        assert_eq!(earliest_activity(&[]), None);
    }
}
