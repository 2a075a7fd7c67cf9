use std::cmp::Ordering;
use std::collections::HashMap;

use crate::time_entry::{ProjectMap, TimeEntry};

/// 表示名が不明なプロジェクトに割り当てるラベル。
pub const UNASSIGNED_PROJECT: &str = "Unassigned Project";

/// プロジェクトごとの集計結果の1行。
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub hours: f64,
    pub percent: f64,
}

/// タイムエントリーをプロジェクトごとに集計してレポートの行と合計時間を返す。
///
/// 各行は割合の降順、割合が等しい場合は名前の昇順で並ぶ。
/// 合計時間が0の場合は割合が定義できないため、行を返さない。
pub fn build(entries: &[TimeEntry], projects: &ProjectMap) -> (Vec<ReportRow>, f64) {
    let mut project_seconds: HashMap<i64, f64> = HashMap::new();
    let mut total_seconds = 0.0;
    for entry in entries {
        *project_seconds.entry(entry.project_id).or_insert(0.0) += entry.duration;
        total_seconds += entry.duration;
    }

    if total_seconds == 0.0 {
        return (Vec::new(), 0.0);
    }

    // 同名の行が複数あっても順序が入力だけで決まるように、ID順に並べてから安定ソートする
    let mut sums = project_seconds.into_iter().collect::<Vec<_>>();
    sums.sort_by_key(|(project_id, _)| *project_id);

    let mut rows = sums
        .into_iter()
        .map(|(project_id, seconds)| {
            let name = projects
                .get(&project_id)
                .filter(|name| !name.is_empty())
                .cloned()
                .unwrap_or_else(|| UNASSIGNED_PROJECT.to_string());
            ReportRow {
                name,
                hours: seconds / 3600.0,
                percent: seconds / total_seconds * 100.0,
            }
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| {
        b.percent
            .partial_cmp(&a.percent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    (rows, total_seconds / 3600.0)
}
