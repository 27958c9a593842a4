use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::features::aggregate::{BucketMode, ChartRow};
use crate::features::filter::FilterSpec;
use crate::features::summary::{CountryStat, Peak, RankedEntry};

/// 状态图：Delivered / Return 两条序列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub mode: BucketMode,
    /// 图表行中标签列的键名（`month` / `day`）
    pub axis_key: &'static str,
    pub rows: Vec<ChartRow>,
    pub delivered: u64,
    pub returned: u64,
    /// 百分比，保留一位小数
    pub return_rate: f64,
    pub delivered_peak: Peak,
    pub return_peak: Peak,
    /// 筛选结果中出现过的年份
    pub years: Vec<i32>,
}

/// 性别图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderView {
    pub mode: BucketMode,
    pub axis_key: &'static str,
    pub rows: Vec<ChartRow>,
    pub male_total: u64,
    pub female_total: u64,
    pub male_peak: Peak,
    pub female_peak: Peak,
    /// 需要绘制的序列：筛选为 All 时两者都有，否则只有选中的一个
    pub visible_series: Vec<&'static str>,
    pub peak_caption: &'static str,
}

/// 单个 SKU 的合计与峰值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuTotal {
    pub sku: String,
    pub count: u64,
    pub peak: Peak,
}

/// SKU 图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuView {
    pub mode: BucketMode,
    pub axis_key: &'static str,
    pub rows: Vec<ChartRow>,
    pub totals: Vec<SkuTotal>,
    pub overall_peak: Peak,
    pub peak_caption: &'static str,
    /// 筛选指定了某个 SKU 时的卡片
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<SkuTotal>,
}

/// 某个国家的城市明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityBreakdown {
    pub code: String,
    pub name: String,
    pub total: u64,
    pub cities: Vec<RankedEntry>,
}

/// 地区视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionView {
    pub countries: Vec<CountryStat>,
    /// 目录内有订单的国家，按目录顺序
    pub cities: Vec<CityBreakdown>,
    /// 目录之外的国家代码及订单数
    pub other_countries: BTreeMap<String, u64>,
}

/// 一次流水线运行的完整结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub snapshot_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub filter: FilterSpec,
    /// 仓库中的订单总数
    pub total_orders: usize,
    /// 通过筛选的订单数
    pub matched_orders: usize,
    /// SKU 下拉选项（来自整个仓库，而非筛选结果）
    pub skus: Vec<String>,
    pub status: StatusView,
    pub gender: GenderView,
    pub sku: SkuView,
    pub region: RegionView,
}
