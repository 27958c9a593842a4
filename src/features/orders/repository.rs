use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{OrderRecord, non_blank};

/// 订单仓库：一次导入得到的只读快照
///
/// 每次导入都会整体替换，不做增量合并；`id` 用于区分快照（例如作为缓存键的一部分）。
#[derive(Debug, Clone)]
pub struct OrderRepository {
    id: Uuid,
    orders: Arc<[OrderRecord]>,
    loaded_at: DateTime<Utc>,
}

impl OrderRepository {
    pub fn new(orders: Vec<OrderRecord>) -> Self {
        Self {
            id: Uuid::new_v4(),
            orders: orders.into(),
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// 快照标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// 去重后的 SKU 列表（按首次出现顺序，忽略空白 SKU），用作筛选下拉选项
    pub fn distinct_skus(&self) -> Vec<String> {
        distinct_in_order(self.orders.iter().map(|o| non_blank(Some(o.sku.as_str()))))
    }

    /// 去重后的国家代码列表（按首次出现顺序）
    pub fn distinct_countries(&self) -> Vec<String> {
        distinct_in_order(
            self.orders
                .iter()
                .map(|o| non_blank(o.customer_country.as_deref())),
        )
    }

    /// 能解析出事件日期的订单数
    pub fn dated_count(&self) -> usize {
        self.orders
            .iter()
            .filter(|o| o.event_date().is_some())
            .count()
    }
}

impl Default for OrderRepository {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<OrderRecord>> for OrderRepository {
    fn from(orders: Vec<OrderRecord>) -> Self {
        Self::new(orders)
    }
}

fn distinct_in_order<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .flatten()
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(sku: &str, country: Option<&str>, delivered: Option<&str>) -> OrderRecord {
        OrderRecord {
            sku: sku.into(),
            customer_country: country.map(String::from),
            delivered_date: delivered.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn each_snapshot_gets_its_own_id() {
        let a = OrderRepository::empty();
        let b = OrderRepository::empty();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn distinct_helpers_keep_first_seen_order_and_skip_blanks() {
        let repo = OrderRepository::new(vec![
            order("B", Some("UAE"), Some("2023-01-01")),
            order("A", None, None),
            order("", Some("KSA"), Some("bad")),
            order("B", Some("UAE"), Some("2023-02-01")),
        ]);
        assert_eq!(repo.len(), 4);
        assert_eq!(repo.distinct_skus(), vec!["B", "A"]);
        assert_eq!(repo.distinct_countries(), vec!["UAE", "KSA"]);
        assert_eq!(repo.dated_count(), 2);
    }
}
