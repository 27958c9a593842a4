use std::collections::BTreeMap;

use serde::Serialize;

use crate::features::aggregate::AggregationTable;

/// 没有任何非零桶时的峰值标签
pub const NO_PEAK: &str = "N/A";

/// 峰值桶
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Peak {
    pub label: &'static str,
    pub count: u64,
}

impl Peak {
    pub fn none() -> Self {
        Self {
            label: NO_PEAK,
            count: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.count == 0
    }
}

/// 排名条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    pub count: u64,
    pub is_highest: bool,
    pub is_lowest: bool,
}

/// 某序列在所有桶上的合计
pub fn total_for(table: &AggregationTable, value: &str) -> u64 {
    table.series_counts(value).iter().sum()
}

/// 每个序列的合计（按序列顺序）
pub fn totals(table: &AggregationTable) -> Vec<(String, u64)> {
    table
        .series()
        .iter()
        .map(|s| (s.clone(), total_for(table, s)))
        .collect()
}

pub fn grand_total(table: &AggregationTable) -> u64 {
    table.bucket_totals().iter().sum()
}

/// 退货率（百分比，保留一位小数）；分母为 0 时返回 0
pub fn return_rate(delivered: u64, returned: u64) -> f64 {
    let denominator = delivered + returned;
    if denominator == 0 {
        return 0.0;
    }
    let rate = returned as f64 / denominator as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// 某序列的峰值桶
///
/// 取最大计数所在的第一个标签（按轴顺序）；最大值为 0 时返回 `N/A`。
pub fn peak_bucket(table: &AggregationTable, value: &str) -> Peak {
    peak_of(table.labels(), &table.series_counts(value))
}

/// 所有序列合计后的峰值桶
pub fn overall_peak(table: &AggregationTable) -> Peak {
    peak_of(table.labels(), &table.bucket_totals())
}

fn peak_of(labels: &'static [&'static str], counts: &[u64]) -> Peak {
    let mut best: Option<(usize, u64)> = None;
    for (i, &count) in counts.iter().enumerate() {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((i, count));
        }
    }
    match best {
        Some((i, count)) if count > 0 => Peak {
            label: labels[i],
            count,
        },
        _ => Peak::none(),
    }
}

/// 按计数降序排名
///
/// 计数相同时按键升序；等于最大值的条目标记为 highest，等于最小值的条目标记为 lowest。
/// 所有计数相同时两个标记会同时成立。
pub fn rank_desc<K: AsRef<str>>(counts: &BTreeMap<K, u64>) -> Vec<RankedEntry> {
    let max = counts.values().copied().max();
    let min = counts.values().copied().min();

    let mut entries: Vec<RankedEntry> = counts
        .iter()
        .map(|(k, &count)| RankedEntry {
            key: k.as_ref().to_string(),
            count,
            is_highest: Some(count) == max,
            is_lowest: Some(count) == min,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    entries
}

/// 前 n 名，另外保留与第 n 名并列的条目
pub fn top_n(ranked: &[RankedEntry], n: usize) -> Vec<RankedEntry> {
    if n == 0 {
        return Vec::new();
    }
    let Some(cutoff) = ranked.get(n - 1).map(|e| e.count) else {
        return ranked.to_vec();
    };
    ranked
        .iter()
        .enumerate()
        .take_while(|(i, e)| *i < n || e.count == cutoff)
        .map(|(_, e)| e.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::aggregate::{BucketMode, Dimension, aggregate};
    use crate::features::orders::OrderRecord;

    fn dated(status: &str, date: &str) -> OrderRecord {
        OrderRecord {
            sku: "X".into(),
            status: status.into(),
            delivered_date: Some(date.into()),
            ..Default::default()
        }
    }

    #[test]
    fn return_rate_rounds_to_one_decimal() {
        assert_eq!(return_rate(0, 0), 0.0);
        assert_eq!(return_rate(9, 1), 10.0);
        assert_eq!(return_rate(2, 1), 33.3);
        assert_eq!(return_rate(0, 4), 100.0);
    }

    #[test]
    fn peak_is_na_when_everything_is_zero() {
        let table = aggregate(&Vec::<OrderRecord>::new(), BucketMode::Month, Dimension::Status);
        assert_eq!(peak_bucket(&table, "Delivered"), Peak::none());
        assert_eq!(overall_peak(&table).label, NO_PEAK);
    }

    #[test]
    fn single_nonzero_bucket_is_the_peak() {
        let orders = vec![dated("Delivered", "2023-08-09")];
        let table = aggregate(&orders, BucketMode::Month, Dimension::Status);
        assert_eq!(peak_bucket(&table, "Delivered").label, "Aug");
        assert_eq!(peak_bucket(&table, "Delivered").count, 1);
    }

    #[test]
    fn ties_pick_the_first_label_in_axis_order() {
        let orders = vec![
            dated("Delivered", "2023-11-01"),
            dated("Delivered", "2023-02-01"),
            dated("Return", "2023-05-01"),
        ];
        let table = aggregate(&orders, BucketMode::Month, Dimension::Status);
        assert_eq!(peak_bucket(&table, "Delivered").label, "Feb");
        assert_eq!(overall_peak(&table).label, "Feb");
        assert_eq!(total_for(&table, "Delivered"), 2);
        assert_eq!(grand_total(&table), 3);
        assert_eq!(
            totals(&table),
            vec![("Delivered".to_string(), 2), ("Return".to_string(), 1)]
        );
    }

    #[test]
    fn rank_desc_orders_by_count_then_key() {
        let counts = BTreeMap::from([("b", 3u64), ("a", 3), ("c", 1), ("d", 7)]);
        let ranked = rank_desc(&counts);
        let keys: Vec<&str> = ranked.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["d", "a", "b", "c"]);
        assert!(ranked[0].is_highest && !ranked[0].is_lowest);
        assert!(ranked[3].is_lowest && !ranked[3].is_highest);
        assert!(!ranked[1].is_highest && !ranked[1].is_lowest);
    }

    #[test]
    fn equal_counts_are_both_highest_and_lowest() {
        let counts = BTreeMap::from([("Dubai".to_string(), 5u64), ("Sharjah".to_string(), 5)]);
        let ranked = rank_desc(&counts);
        assert!(ranked.iter().all(|e| e.is_highest && e.is_lowest));
        assert!(rank_desc(&BTreeMap::<String, u64>::new()).is_empty());
    }

    #[test]
    fn top_n_keeps_ties_with_the_last_place() {
        let counts = BTreeMap::from([("a", 5u64), ("b", 4), ("c", 4), ("d", 1)]);
        let ranked = rank_desc(&counts);
        let top: Vec<String> = top_n(&ranked, 2).into_iter().map(|e| e.key).collect();
        assert_eq!(top, vec!["a", "b", "c"]);
        assert_eq!(top_n(&ranked, 10).len(), 4);
        assert!(top_n(&ranked, 0).is_empty());
    }
}
