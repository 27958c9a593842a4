use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::aggregate::{Dimension, aggregate_by_key};
use crate::features::orders::OrderRecord;
use crate::features::orders::models::non_blank;

use super::engine::{RankedEntry, rank_desc};

/// 城市缺失时使用的默认标签
pub const DEFAULT_UNKNOWN_CITY: &str = "Unknown";

/// 国家目录条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub code: String,
    pub name: String,
}

impl CountryInfo {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// 默认国家目录（海湾地区 8 国）
pub fn default_catalogue() -> Vec<CountryInfo> {
    [
        ("UAE", "United Arab Emirates"),
        ("KSA", "Saudi Arabia"),
        ("JOR", "Jordan"),
        ("OMN", "Oman"),
        ("YEM", "Yemen"),
        ("QAT", "Qatar"),
        ("BHR", "Bahrain"),
        ("KWT", "Kuwait"),
    ]
    .into_iter()
    .map(|(code, name)| CountryInfo::new(code, name))
    .collect()
}

/// 地区视图的配置：国家目录与缺失城市的标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSettings {
    #[serde(default = "default_catalogue")]
    pub countries: Vec<CountryInfo>,
    #[serde(default = "RegionSettings::default_unknown_city_label")]
    pub unknown_city_label: String,
}

impl RegionSettings {
    fn default_unknown_city_label() -> String {
        DEFAULT_UNKNOWN_CITY.to_string()
    }

    /// 目录中的国家名
    pub fn country_name(&self, code: &str) -> Option<&str> {
        self.countries
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            countries: default_catalogue(),
            unknown_city_label: Self::default_unknown_city_label(),
        }
    }
}

/// 单个国家的统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryStat {
    pub code: String,
    pub name: String,
    pub count: u64,
    pub is_highest: bool,
    pub is_lowest: bool,
}

/// 各国家代码的订单数（缺失国家的订单不计）
pub fn country_counts<'a, I>(orders: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    aggregate_by_key(orders, |o| Dimension::Country.key_of(o))
}

/// 按目录顺序输出每个国家的统计，无订单的国家计 0
///
/// 最大/最小值取自所有出现过的国家（包括目录外的）；lowest 还要求计数大于 0。
pub fn country_stats(
    counts: &BTreeMap<String, u64>,
    catalogue: &[CountryInfo],
) -> Vec<CountryStat> {
    let max = counts.values().copied().max();
    let min = counts.values().copied().min();

    catalogue
        .iter()
        .map(|c| {
            let count = counts.get(&c.code).copied().unwrap_or(0);
            CountryStat {
                code: c.code.clone(),
                name: c.name.clone(),
                count,
                is_highest: Some(count) == max,
                is_lowest: Some(count) == min && count > 0,
            }
        })
        .collect()
}

/// 某国家内各城市的订单数；城市缺失计入 `unknown_label`
pub fn city_totals<'a, I>(orders: I, country: &str, unknown_label: &str) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    aggregate_by_key(orders, |o| {
        (non_blank(o.customer_country.as_deref()) == Some(country)).then(|| {
            non_blank(o.customer_city.as_deref())
                .unwrap_or(unknown_label)
                .to_string()
        })
    })
}

/// 某国家内城市排名（降序，并列时两个标记可同时成立）
pub fn city_ranking<'a, I>(orders: I, country: &str, unknown_label: &str) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    rank_desc(&city_totals(orders, country, unknown_label))
}
