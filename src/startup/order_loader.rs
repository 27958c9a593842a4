use std::{fmt, fs, io::Read, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::features::orders::OrderRecord;

/// 数据集文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    /// 按扩展名推断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for DatasetFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "json" => Ok(DatasetFormat::Json),
            other => Err(AppError::Validation(format!(
                "未知的数据集格式: {other}（可选 csv|json）"
            ))),
        }
    }
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DatasetFormat::Csv => "csv",
            DatasetFormat::Json => "json",
        })
    }
}

/// 导入后端返回的两种 JSON 形状：裸数组，或 `{"data": [...]}` 包装
#[derive(Deserialize)]
#[serde(untagged)]
enum OrdersPayload {
    Bare(Vec<OrderRecord>),
    Envelope { data: Vec<OrderRecord> },
}

/// 从文件加载订单
///
/// `format` 为空时按扩展名推断，无法推断时报错。
pub fn load_orders(
    file_path: &Path,
    format: Option<DatasetFormat>,
) -> Result<Vec<OrderRecord>, AppError> {
    if !file_path.exists() {
        return Err(AppError::Import(format!("未找到订单数据文件: {file_path:?}")));
    }

    let format = format
        .or_else(|| DatasetFormat::from_path(file_path))
        .ok_or_else(|| {
            AppError::Validation(format!("无法从扩展名判断数据集格式: {file_path:?}"))
        })?;

    let file = fs::File::open(file_path)?;
    let orders = match format {
        DatasetFormat::Csv => read_orders_csv(file)?,
        DatasetFormat::Json => read_orders_json(file)?,
    };

    tracing::info!(
        "已加载订单数据 {:?}: {} 条 ({})",
        file_path,
        orders.len(),
        format
    );
    Ok(orders)
}

/// 读取 JSON 订单（裸数组或 `data` 包装）
pub fn read_orders_json<R: Read>(reader: R) -> Result<Vec<OrderRecord>, AppError> {
    let payload: OrdersPayload = serde_json::from_reader(reader)
        .map_err(|e| AppError::Import(format!("解析订单 JSON 失败: {e}")))?;
    Ok(match payload {
        OrdersPayload::Bare(orders) => orders,
        OrdersPayload::Envelope { data } => data,
    })
}

/// 读取 CSV 订单
///
/// 表头不区分大小写，接受 snake_case 与 camelCase 列名；必需列为 `sku` 与 `status`。
/// 无法读取的行会被跳过并记录告警。
pub fn read_orders_csv<R: Read>(reader: R) -> Result<Vec<OrderRecord>, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| AppError::Import(format!("读取 CSV 表头失败: {e}")))?
        .clone();

    // 表头索引（不区分大小写，忽略下划线）
    let idx_of = |names: &[&str]| -> Option<usize> {
        headers.iter().position(|h| {
            let h = h.trim().replace('_', "");
            names.iter().any(|n| h.eq_ignore_ascii_case(&n.replace('_', "")))
        })
    };
    let required = |name: &str| -> Result<usize, AppError> {
        idx_of(&[name]).ok_or_else(|| AppError::Import(format!("CSV 缺少必需列: {name}")))
    };

    let sku_idx = required("sku")?;
    let status_idx = required("status")?;
    let gender_idx = idx_of(&["gender"]);
    let name_idx = idx_of(&["customer_name"]);
    let country_idx = idx_of(&["customer_country"]);
    let city_idx = idx_of(&["customer_city"]);
    let delivered_idx = idx_of(&["delivered_date"]);
    let return_idx = idx_of(&["return_date"]);
    let shipped_idx = idx_of(&["shipped_at"]);

    let mut orders = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                skipped += 1;
                tracing::warn!("跳过无法读取的 CSV 行 {}: {}", line + 2, e);
                continue;
            }
        };

        let field = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        orders.push(OrderRecord {
            sku: field(Some(sku_idx)).unwrap_or_default(),
            status: field(Some(status_idx)).unwrap_or_default(),
            gender: field(gender_idx),
            customer_name: field(name_idx),
            customer_country: field(country_idx),
            customer_city: field(city_idx),
            delivered_date: field(delivered_idx),
            return_date: field(return_idx),
            shipped_at: field(shipped_idx),
        });
    }

    if skipped > 0 {
        tracing::warn!("CSV 导入完成，共跳过 {} 行", skipped);
    }
    Ok(orders)
}
