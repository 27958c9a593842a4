use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::models::{OrderRecord, non_blank};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// 解析订单的规范事件日期
///
/// 按 `delivered_date` -> `return_date` -> `shipped_at` 的固定优先级取第一个非空值。
/// 取到的值解析失败时视为“无日期”，不会再回退到后面的字段。
pub fn resolve_event_date(record: &OrderRecord) -> Option<NaiveDate> {
    let raw = [
        record.delivered_date.as_deref(),
        record.return_date.as_deref(),
        record.shipped_at.as_deref(),
    ]
    .into_iter()
    .find_map(non_blank)?;

    let parsed = parse_calendar_date(raw);
    if parsed.is_none() {
        tracing::trace!("无法解析订单日期，按无日期处理: {:?}", raw);
    }
    parsed
}

/// 将字符串解析为日历日期
///
/// 支持 `YYYY-MM-DD`、`YYYY/MM/DD`、RFC 3339 时间戳以及不带时区的日期时间。
/// 带偏移量的时间戳取其自身偏移下的日期，不做运行时时区换算。
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}
