use chrono::{DateTime, Utc};

/// 現在のUTC時間を取得する。
///
/// テストビルドでは`mock_datetime`で固定した時間を返す。
#[cfg(not(test))]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
pub use mock_datetime::now;


#[cfg(test)]
mod tests {
    use chrono::{SecondsFormat, TimeZone, Utc};

    use super::mock_datetime;

    /// 固定しない場合は現在時間が取得できることを確認する。
    ///
    /// ミリ秒単位の比較ではテストが不安定になるため、秒単位で比較する。
    #[test]
    fn test_now_without_frozen_time() {
        assert_eq!(
            mock_datetime::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    /// 固定した時間がクロージャ内で取得でき、終了後は解除されることを確認する。
    #[test]
    fn test_with_frozen_time() {
        let frozen = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let observed = mock_datetime::with_frozen_time(frozen, mock_datetime::now);

        assert_eq!(observed, frozen);
        assert_eq!(
            mock_datetime::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
}
