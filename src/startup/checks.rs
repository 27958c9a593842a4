use std::collections::HashSet;
use std::path::Path;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::startup::order_loader::DatasetFormat;

/// 执行启动检查
///
/// 1. 检查数据集文件存在且格式可识别
/// 2. 检查默认筛选条件与地区目录（仅告警，不阻断启动）
pub fn run_startup_checks(config: &AppConfig, dataset: &Path) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    ensure_dataset(config, dataset)?;
    check_filters(config);
    check_regions(config);
    check_cache(config);

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

/// 确保数据集文件存在且格式可识别
fn ensure_dataset(config: &AppConfig, dataset: &Path) -> Result<(), AppError> {
    if !dataset.is_file() {
        return Err(AppError::Import(format!("未找到订单数据文件: {dataset:?}")));
    }
    if config.dataset.format.is_none() && DatasetFormat::from_path(dataset).is_none() {
        return Err(AppError::Validation(format!(
            "无法从扩展名判断数据集格式，请在配置中设置 dataset.format: {dataset:?}"
        )));
    }
    tracing::info!("✅ 订单数据文件已就绪: {:?}", dataset);
    Ok(())
}

fn check_filters(config: &AppConfig) {
    let filters = &config.filters;
    if filters.is_inverted() {
        tracing::warn!(
            "⚠️ 默认筛选区间倒置: {} > {}",
            filters.start_date,
            filters.end_date
        );
    }
}

/// 国家目录不应为空，代码不应重复
fn check_regions(config: &AppConfig) {
    let regions = &config.regions;
    if regions.countries.is_empty() {
        tracing::warn!("⚠️ 国家目录为空，地区视图将没有国家条目");
    }
    let mut seen = HashSet::new();
    for country in &regions.countries {
        if !seen.insert(country.code.as_str()) {
            tracing::warn!("⚠️ 国家目录中存在重复代码: {}", country.code);
        }
    }
}

fn check_cache(config: &AppConfig) {
    if config.cache.enabled && config.cache.max_capacity == 0 {
        tracing::warn!("⚠️ 报表缓存已开启但容量为 0，将不会命中");
    }
}
