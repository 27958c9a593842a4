use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::features::orders::models::{OrderRecord, non_blank};

use super::engine::tally;

/// 月份轴标签（固定日历顺序）
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// 星期轴标签（ISO 顺序，周一开始）
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// 时间分桶模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BucketMode {
    /// 12 个日历月
    #[default]
    Month,
    /// 7 个 ISO 星期
    Weekday,
}

impl BucketMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BucketMode::Month => "month",
            BucketMode::Weekday => "weekday",
        }
    }

    /// 该模式下固定顺序的全部标签
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            BucketMode::Month => &MONTH_LABELS,
            BucketMode::Weekday => &WEEKDAY_LABELS,
        }
    }

    pub fn bucket_index(self, date: NaiveDate) -> usize {
        match self {
            BucketMode::Month => date.month0() as usize,
            BucketMode::Weekday => date.weekday().num_days_from_monday() as usize,
        }
    }

    pub fn label_for(self, date: NaiveDate) -> &'static str {
        self.labels()[self.bucket_index(date)]
    }

    /// 标签在轴上的位置
    pub fn position(self, label: &str) -> Option<usize> {
        self.labels().iter().position(|l| *l == label)
    }

    /// 图表行中标签列的键名
    pub fn axis_key(self) -> &'static str {
        match self {
            BucketMode::Month => "month",
            BucketMode::Weekday => "day",
        }
    }

    /// 峰值卡片的标题
    pub fn peak_caption(self) -> &'static str {
        match self {
            BucketMode::Month => "Peak Month",
            BucketMode::Weekday => "Peak Day",
        }
    }
}

impl fmt::Display for BucketMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" | "monthly" => Ok(BucketMode::Month),
            "weekday" | "day" => Ok(BucketMode::Weekday),
            other => Err(AppError::Validation(format!(
                "未知的分桶模式: {other}（可选 month|weekday）"
            ))),
        }
    }
}

impl TryFrom<String> for BucketMode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BucketMode> for String {
    fn from(mode: BucketMode) -> Self {
        mode.as_str().to_string()
    }
}

/// 分组维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dimension {
    /// 规范化状态
    Status,
    /// 小写性别
    Gender,
    /// 原始 SKU
    Sku,
    /// 国家代码
    Country,
    /// 城市名
    City,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Status => "status",
            Dimension::Gender => "gender",
            Dimension::Sku => "sku",
            Dimension::Country => "country",
            Dimension::City => "city",
        }
    }

    /// 取订单在该维度上的值；缺失时返回 None，该订单不计入此维度
    pub fn key_of(self, record: &OrderRecord) -> Option<String> {
        match self {
            Dimension::Status => {
                let status = record.normalized_status();
                (!status.is_empty()).then(|| status.to_string())
            }
            Dimension::Gender => record.gender_lowercase(),
            Dimension::Sku => non_blank(Some(record.sku.as_str())).map(String::from),
            Dimension::Country => non_blank(record.customer_country.as_deref()).map(String::from),
            Dimension::City => non_blank(record.customer_city.as_deref()).map(String::from),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(Dimension::Status),
            "gender" => Ok(Dimension::Gender),
            "sku" => Ok(Dimension::Sku),
            "country" => Ok(Dimension::Country),
            "city" => Ok(Dimension::City),
            other => Err(AppError::Validation(format!("未知的分组维度: {other}"))),
        }
    }
}

impl TryFrom<String> for Dimension {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dimension> for String {
    fn from(dimension: Dimension) -> Self {
        dimension.as_str().to_string()
    }
}

/// 图表中的一行：一个桶标签及各序列的计数（已补零）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRow {
    pub label: &'static str,
    pub counts: BTreeMap<String, u64>,
}

/// 聚合结果：固定标签轴 × 维度值 的计数表
///
/// 所有标签始终存在；没有数据的桶计数为 0。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationTable {
    mode: BucketMode,
    labels: &'static [&'static str],
    /// 序列（维度值），预置序列在前，其余按首次出现顺序
    series: Vec<String>,
    buckets: Vec<BTreeMap<String, u64>>,
    /// 桶 -> 序列 -> 年份 -> 计数
    #[serde(skip)]
    by_year: Vec<BTreeMap<String, BTreeMap<i32, u64>>>,
}

impl AggregationTable {
    pub fn new(mode: BucketMode) -> Self {
        let labels = mode.labels();
        Self {
            mode,
            labels,
            series: Vec::new(),
            buckets: vec![BTreeMap::new(); labels.len()],
            by_year: vec![BTreeMap::new(); labels.len()],
        }
    }

    /// 预置序列，保证它们即使没有数据也以 0 出现
    pub fn with_series<I, S>(mode: BucketMode, series: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(mode);
        for s in series {
            table.register_series(s.into());
        }
        table
    }

    fn register_series(&mut self, key: String) {
        if !self.series.contains(&key) {
            self.series.push(key);
        }
    }

    pub(crate) fn record(&mut self, bucket: usize, key: String, year: i32) {
        if !self.buckets[bucket].contains_key(&key) {
            self.register_series(key.clone());
        }
        tally(self.by_year[bucket].entry(key.clone()).or_default(), year);
        tally(&mut self.buckets[bucket], key);
    }

    pub fn mode(&self) -> BucketMode {
        self.mode
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn series(&self) -> &[String] {
        &self.series
    }

    pub fn count_at(&self, index: usize, value: &str) -> u64 {
        self.buckets
            .get(index)
            .and_then(|b| b.get(value))
            .copied()
            .unwrap_or(0)
    }

    pub fn count(&self, label: &str, value: &str) -> u64 {
        self.mode
            .position(label)
            .map(|i| self.count_at(i, value))
            .unwrap_or(0)
    }

    /// 某个桶的原始计数（只含出现过的维度值）
    pub fn bucket(&self, label: &str) -> Option<&BTreeMap<String, u64>> {
        self.mode.position(label).map(|i| &self.buckets[i])
    }

    /// 某个序列在各桶上的计数（与标签一一对应）
    pub fn series_counts(&self, value: &str) -> Vec<u64> {
        (0..self.labels.len())
            .map(|i| self.count_at(i, value))
            .collect()
    }

    /// 每个桶内所有序列的合计
    pub fn bucket_totals(&self) -> Vec<u64> {
        self.buckets.iter().map(|b| b.values().sum()).collect()
    }

    /// 数据中出现过的年份（升序）
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .by_year
            .iter()
            .flat_map(|b| b.values())
            .flat_map(|y| y.keys().copied())
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// 某桶某序列按年份拆分的计数（只含非零年份）
    pub fn year_breakdown(&self, label: &str, value: &str) -> BTreeMap<i32, u64> {
        self.mode
            .position(label)
            .and_then(|i| self.by_year[i].get(value))
            .cloned()
            .unwrap_or_default()
    }

    /// 全部序列的图表行
    pub fn rows(&self) -> Vec<ChartRow> {
        self.rows_for(&self.series)
    }

    /// 指定序列的图表行，缺失计数补零
    pub fn rows_for<S: AsRef<str>>(&self, series: &[S]) -> Vec<ChartRow> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| ChartRow {
                label: *label,
                counts: series
                    .iter()
                    .map(|s| (s.as_ref().to_string(), self.count_at(i, s.as_ref())))
                    .collect(),
            })
            .collect()
    }
}
