use chrono::NaiveDate;

use crate::features::orders::OrderRecord;

use super::models::{FilterSpec, GenderFilter, SkuFilter, StatusFilter};

/// 按筛选条件过滤订单
///
/// 结果保持输入顺序，不修改任何订单；对结果再次应用同一条件不会再减少元素。
pub fn apply<'a, I>(orders: I, spec: &FilterSpec) -> Vec<&'a OrderRecord>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut total = 0usize;
    let matched: Vec<&OrderRecord> = orders
        .into_iter()
        .inspect(|_| total += 1)
        .filter(|o| matches(o, spec))
        .collect();

    tracing::debug!(
        "筛选完成: {} -> {} (sku={}, gender={}, status={}, {}..={})",
        total,
        matched.len(),
        spec.sku,
        spec.gender,
        spec.status,
        spec.start_date,
        spec.end_date
    );
    matched
}

/// 单条订单是否通过全部条件
pub fn matches(order: &OrderRecord, spec: &FilterSpec) -> bool {
    matches_date_range(order, spec.start_date, spec.end_date)
        && matches_sku(order, &spec.sku)
        && matches_gender(order, spec.gender)
        && matches_status(order, spec.status)
}

/// 事件日期存在且落在闭区间内
pub fn matches_date_range(order: &OrderRecord, start: NaiveDate, end: NaiveDate) -> bool {
    order
        .event_date()
        .is_some_and(|d| start <= d && d <= end)
}

pub fn matches_sku(order: &OrderRecord, filter: &SkuFilter) -> bool {
    match filter {
        SkuFilter::All => true,
        SkuFilter::Exact(sku) => order.sku == *sku,
    }
}

/// 缺失性别的订单不会通过非 `All` 的性别筛选
pub fn matches_gender(order: &OrderRecord, filter: GenderFilter) -> bool {
    match filter.value() {
        None => true,
        Some(wanted) => order.gender_lowercase().as_deref() == Some(wanted),
    }
}

pub fn matches_status(order: &OrderRecord, filter: StatusFilter) -> bool {
    match filter.value() {
        None => true,
        Some(wanted) => order.normalized_status() == wanted,
    }
}
