use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::dates::resolve_event_date;

/// 规范化后的“已送达”状态
pub const STATUS_DELIVERED: &str = "Delivered";
/// 规范化后的“退货”状态（`Returned` 会被折叠为该值）
pub const STATUS_RETURN: &str = "Return";
const STATUS_RETURNED_ALIAS: &str = "Returned";

/// 一条导入的订单记录
///
/// 字段命名与导入后端的 JSON 一致（snake_case），同时接受 camelCase 别名。
/// 所有字段都允许缺失或为 null；数值型 SKU 会被转为字符串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sku: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub gender: Option<String>,
    #[serde(
        default,
        alias = "customerName",
        deserialize_with = "lenient_opt_string"
    )]
    pub customer_name: Option<String>,
    #[serde(
        default,
        alias = "customerCountry",
        deserialize_with = "lenient_opt_string"
    )]
    pub customer_country: Option<String>,
    #[serde(
        default,
        alias = "customerCity",
        deserialize_with = "lenient_opt_string"
    )]
    pub customer_city: Option<String>,
    #[serde(
        default,
        alias = "deliveredDate",
        deserialize_with = "lenient_opt_string"
    )]
    pub delivered_date: Option<String>,
    #[serde(
        default,
        alias = "returnDate",
        deserialize_with = "lenient_opt_string"
    )]
    pub return_date: Option<String>,
    #[serde(
        default,
        alias = "shippedAt",
        deserialize_with = "lenient_opt_string"
    )]
    pub shipped_at: Option<String>,
}

impl OrderRecord {
    /// 规范化后的状态（`Returned` -> `Return`）
    pub fn normalized_status(&self) -> &str {
        normalize_status(&self.status)
    }

    /// 小写性别；缺失或空白时返回 None
    pub fn gender_lowercase(&self) -> Option<String> {
        non_blank(self.gender.as_deref()).map(str::to_lowercase)
    }

    /// 订单的规范事件日期
    pub fn event_date(&self) -> Option<NaiveDate> {
        resolve_event_date(self)
    }
}

/// 状态规范化：`Returned` 与 `Return` 视为同一退货概念，其余值原样返回
pub fn normalize_status(raw: &str) -> &str {
    if raw == STATUS_RETURNED_ALIAS {
        STATUS_RETURN
    } else {
        raw
    }
}

/// 去掉首尾空白后非空才返回
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

// 表格导出常把 SKU 写成数字，这里统一接受字符串/数字/布尔/null。
// 与 CSV 导入一致：去掉首尾空白，空白值视为缺失
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    };
    Ok(non_blank(Some(&text)).map(str::to_string))
}
