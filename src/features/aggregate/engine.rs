use std::collections::BTreeMap;

use chrono::Datelike;

use crate::features::orders::OrderRecord;

use super::models::{AggregationTable, BucketMode, Dimension};

/// 计数原语：时间轴聚合与无时间轴聚合共用
pub(crate) fn tally<K: Ord>(counts: &mut BTreeMap<K, u64>, key: K) {
    *counts.entry(key).or_insert(0) += 1;
}

/// 按分桶模式与维度聚合
pub fn aggregate<'a, I>(orders: I, mode: BucketMode, dimension: Dimension) -> AggregationTable
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    aggregate_by(orders, mode, |o| dimension.key_of(o))
}

/// 与 [`aggregate`] 相同，但预置若干序列（即使没有数据也以 0 出现）
pub fn aggregate_seeded<'a, I>(
    orders: I,
    mode: BucketMode,
    dimension: Dimension,
    seed_series: &[&str],
) -> AggregationTable
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let table = AggregationTable::with_series(mode, seed_series.iter().copied());
    fill(table, orders, |o| dimension.key_of(o))
}

/// 以可注入的维度提取函数聚合
///
/// 提取函数返回 None 的订单不计入本表；无法解析事件日期的订单同样跳过。
pub fn aggregate_by<'a, I, F>(orders: I, mode: BucketMode, key_fn: F) -> AggregationTable
where
    I: IntoIterator<Item = &'a OrderRecord>,
    F: Fn(&OrderRecord) -> Option<String>,
{
    fill(AggregationTable::new(mode), orders, key_fn)
}

fn fill<'a, I, F>(mut table: AggregationTable, orders: I, key_fn: F) -> AggregationTable
where
    I: IntoIterator<Item = &'a OrderRecord>,
    F: Fn(&OrderRecord) -> Option<String>,
{
    let mode = table.mode();
    let mut skipped_dateless = 0usize;
    let mut skipped_dimension = 0usize;

    for order in orders {
        let Some(date) = order.event_date() else {
            skipped_dateless += 1;
            continue;
        };
        let Some(key) = key_fn(order) else {
            skipped_dimension += 1;
            continue;
        };
        table.record(mode.bucket_index(date), key, date.year());
    }

    if skipped_dateless > 0 || skipped_dimension > 0 {
        tracing::debug!(
            "聚合跳过订单: 无日期 {}, 维度缺失 {}",
            skipped_dateless,
            skipped_dimension
        );
    }
    table
}

/// 无时间轴的单层计数（国家、城市等）
pub fn aggregate_by_key<'a, I, F, K>(orders: I, key_fn: F) -> BTreeMap<K, u64>
where
    I: IntoIterator<Item = &'a OrderRecord>,
    F: Fn(&OrderRecord) -> Option<K>,
    K: Ord,
{
    let mut counts = BTreeMap::new();
    for key in orders.into_iter().filter_map(|o| key_fn(o)) {
        tally(&mut counts, key);
    }
    counts
}
