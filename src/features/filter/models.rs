use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::features::aggregate::BucketMode;
use crate::features::orders::{STATUS_DELIVERED, STATUS_RETURN};

/// 哨兵值：不做该项筛选
pub const FILTER_ALL: &str = "All";

/// SKU 筛选
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkuFilter {
    #[default]
    All,
    /// 精确匹配（区分大小写）
    Exact(String),
}

impl SkuFilter {
    pub fn as_str(&self) -> &str {
        match self {
            SkuFilter::All => FILTER_ALL,
            SkuFilter::Exact(sku) => sku,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SkuFilter::All)
    }
}

impl From<String> for SkuFilter {
    fn from(value: String) -> Self {
        if value.trim().is_empty() || value == FILTER_ALL {
            SkuFilter::All
        } else {
            SkuFilter::Exact(value)
        }
    }
}

impl From<&str> for SkuFilter {
    fn from(value: &str) -> Self {
        SkuFilter::from(value.to_string())
    }
}

impl From<SkuFilter> for String {
    fn from(filter: SkuFilter) -> Self {
        filter.as_str().to_string()
    }
}

impl fmt::Display for SkuFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 性别筛选（比较时统一转小写）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GenderFilter {
    #[default]
    All,
    Male,
    Female,
}

impl GenderFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            GenderFilter::All => FILTER_ALL,
            GenderFilter::Male => "male",
            GenderFilter::Female => "female",
        }
    }

    /// 该筛选对应的小写性别值；`All` 返回 None
    pub fn value(self) -> Option<&'static str> {
        match self {
            GenderFilter::All => None,
            other => Some(other.as_str()),
        }
    }
}

impl FromStr for GenderFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(GenderFilter::All),
            "male" => Ok(GenderFilter::Male),
            "female" => Ok(GenderFilter::Female),
            other => Err(AppError::Validation(format!(
                "未知的性别筛选: {other}（可选 All|male|female）"
            ))),
        }
    }
}

impl TryFrom<String> for GenderFilter {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GenderFilter> for String {
    fn from(filter: GenderFilter) -> Self {
        filter.as_str().to_string()
    }
}

impl fmt::Display for GenderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 状态筛选（`Returned` 视为 `Return`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Delivered,
    Return,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => FILTER_ALL,
            StatusFilter::Delivered => STATUS_DELIVERED,
            StatusFilter::Return => STATUS_RETURN,
        }
    }

    /// 该筛选对应的规范化状态值；`All` 返回 None
    pub fn value(self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            other => Some(other.as_str()),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "delivered" => Ok(StatusFilter::Delivered),
            "return" | "returned" => Ok(StatusFilter::Return),
            other => Err(AppError::Validation(format!(
                "未知的状态筛选: {other}（可选 All|Delivered|Return）"
            ))),
        }
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.as_str().to_string()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 筛选条件（不可变值）
///
/// 由调用方持有并在每次变更后重新传入流水线；`with_*` 返回新值而不修改自身。
/// 日期区间两端都包含；`start_date > end_date` 合法，结果为空集。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub sku: SkuFilter,
    #[serde(default)]
    pub gender: GenderFilter,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default = "FilterSpec::default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "FilterSpec::default_end_date")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub bucket_mode: BucketMode,
}

impl FilterSpec {
    fn default_start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    fn default_end_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or(NaiveDate::MAX)
    }

    pub fn with_sku(&self, sku: impl Into<SkuFilter>) -> Self {
        Self {
            sku: sku.into(),
            ..self.clone()
        }
    }

    pub fn with_gender(&self, gender: GenderFilter) -> Self {
        Self {
            gender,
            ..self.clone()
        }
    }

    pub fn with_status(&self, status: StatusFilter) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn with_date_range(&self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            ..self.clone()
        }
    }

    pub fn with_bucket_mode(&self, bucket_mode: BucketMode) -> Self {
        Self {
            bucket_mode,
            ..self.clone()
        }
    }

    /// 区间是否倒置（倒置时任何订单都不会通过）
    pub fn is_inverted(&self) -> bool {
        self.start_date > self.end_date
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            sku: SkuFilter::All,
            gender: GenderFilter::All,
            status: StatusFilter::All,
            start_date: Self::default_start_date(),
            end_date: Self::default_end_date(),
            bucket_mode: BucketMode::Month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_initial_dashboard_state() {
        let spec = FilterSpec::default();
        assert!(spec.sku.is_all());
        assert_eq!(spec.gender, GenderFilter::All);
        assert_eq!(spec.status, StatusFilter::All);
        assert_eq!(spec.start_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(spec.end_date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(spec.bucket_mode, BucketMode::Month);
        assert!(!spec.is_inverted());
    }

    #[test]
    fn textual_forms_parse_case_insensitively() {
        assert_eq!("Male".parse::<GenderFilter>().unwrap(), GenderFilter::Male);
        assert_eq!("FEMALE".parse::<GenderFilter>().unwrap(), GenderFilter::Female);
        assert_eq!("All".parse::<GenderFilter>().unwrap(), GenderFilter::All);
        assert_eq!("Returned".parse::<StatusFilter>().unwrap(), StatusFilter::Return);
        assert_eq!("delivered".parse::<StatusFilter>().unwrap(), StatusFilter::Delivered);
        assert!("other".parse::<GenderFilter>().is_err());
        assert!("Shipped".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn sku_filter_keeps_exact_text() {
        assert_eq!(SkuFilter::from("All"), SkuFilter::All);
        assert_eq!(SkuFilter::from(""), SkuFilter::All);
        assert_eq!(SkuFilter::from("sku-1"), SkuFilter::Exact("sku-1".into()));
        assert_eq!(SkuFilter::Exact("X".into()).to_string(), "X");
    }

    #[test]
    fn with_methods_leave_the_original_untouched() {
        let base = FilterSpec::default();
        let next = base
            .with_sku("X")
            .with_gender(GenderFilter::Female)
            .with_status(StatusFilter::Return)
            .with_bucket_mode(BucketMode::Weekday);
        assert_eq!(base, FilterSpec::default());
        assert_eq!(next.sku, SkuFilter::Exact("X".into()));
        assert_eq!(next.gender, GenderFilter::Female);
        assert_eq!(next.status, StatusFilter::Return);
        assert_eq!(next.bucket_mode, BucketMode::Weekday);

        let inverted = base.with_date_range(
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
        );
        assert!(inverted.is_inverted());
    }

    #[test]
    fn deserializes_from_partial_json() {
        let spec: FilterSpec = serde_json::from_str(
            r#"{"sku":"X","gender":"Male","status":"Returned","end_date":"2023-06-30"}"#,
        )
        .unwrap();
        assert_eq!(spec.sku, SkuFilter::Exact("X".into()));
        assert_eq!(spec.gender, GenderFilter::Male);
        assert_eq!(spec.status, StatusFilter::Return);
        assert_eq!(spec.start_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(spec.end_date, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["status"], "Return");
        assert_eq!(json["gender"], "male");
        assert_eq!(json["bucket_mode"], "month");
    }
}
