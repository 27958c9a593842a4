use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::features::filter::FilterSpec;
use crate::features::summary::RegionSettings;
use crate::startup::order_loader::DatasetFormat;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 配置文件路径的环境变量
const CONFIG_PATH_ENV: &str = "APP_CONFIG_PATH";

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// 日志格式：full | compact
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_format() -> String {
        "full".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

/// 数据集配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatasetConfig {
    /// 订单导出文件路径（命令行 --data 优先）
    #[serde(default)]
    pub path: Option<String>,
    /// 文件格式；留空时按扩展名判断
    #[serde(default)]
    pub format: Option<DatasetFormat>,
}

/// 报表缓存配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 是否缓存报表
    #[serde(default = "CacheConfig::default_enabled")]
    pub enabled: bool,
    /// 最多缓存的报表数
    #[serde(default = "CacheConfig::default_max_capacity")]
    pub max_capacity: u64,
    /// 报表缓存过期时间（秒）
    #[serde(default = "CacheConfig::default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_max_capacity() -> u64 {
        256
    }

    fn default_ttl_secs() -> u64 {
        10 * 60
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            max_capacity: Self::default_max_capacity(),
            ttl_secs: Self::default_ttl_secs(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// 默认筛选条件
    #[serde(default)]
    pub filters: FilterSpec,
    #[serde(default)]
    pub regions: RegionSettings,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();
        tracing::info!("正在从 {:?} 加载配置文件", config_path);
        Self::load_from(&config_path)
    }

    /// 从指定路径加载；文件不存在时只使用默认值与环境变量
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            // 环境变量覆盖，例如：APP_FILTERS__START_DATE=2024-01-01
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;

        if config.filters.is_inverted() {
            tracing::warn!(
                "默认筛选区间倒置 ({} > {})，所有报表都将为空",
                config.filters.start_date,
                config.filters.end_date
            );
        }
        tracing::debug!(
            "配置加载完成: 国家目录 {} 项, 缓存 {}",
            config.regions.countries.len(),
            if config.cache.enabled { "开启" } else { "关闭" }
        );

        Ok(config)
    }

    /// 获取全局配置单例；未初始化时使用默认配置
    pub fn global() -> &'static AppConfig {
        CONFIG.get_or_init(AppConfig::default)
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        Self::install(config)
    }

    /// 安装一个已构造好的配置为全局配置
    pub fn install(config: AppConfig) -> Result<(), ConfigError> {
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// 以 TOML 输出当前生效的配置
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::aggregate::BucketMode;
    use crate::features::filter::{GenderFilter, SkuFilter};
    use chrono::NaiveDate;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("order_insight_{name}_{ts}.toml"));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("order_insight_does_not_exist.toml");
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.filters, FilterSpec::default());
        assert_eq!(cfg.regions.countries.len(), 8);
        assert!(cfg.cache.enabled);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = temp_config(
            "override",
            r#"
[logging]
level = "debug"

[dataset]
path = "orders.json"
format = "json"

[filters]
sku = "X-1"
gender = "Female"
start_date = "2024-01-01"
end_date = "2024-06-30"
bucket_mode = "weekday"

[regions]
unknown_city_label = "N/D"
countries = [{ code = "UAE", name = "Emirates" }]

[cache]
enabled = false
"#,
        );
        let cfg = AppConfig::load_from(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, "full");
        assert_eq!(cfg.dataset.path.as_deref(), Some("orders.json"));
        assert_eq!(cfg.dataset.format, Some(DatasetFormat::Json));
        assert_eq!(cfg.filters.sku, SkuFilter::Exact("X-1".into()));
        assert_eq!(cfg.filters.gender, GenderFilter::Female);
        assert_eq!(cfg.filters.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(cfg.filters.bucket_mode, BucketMode::Weekday);
        assert_eq!(cfg.regions.countries.len(), 1);
        assert_eq!(cfg.regions.unknown_city_label, "N/D");
        assert!(!cfg.cache.enabled);
        assert_eq!(cfg.cache.max_capacity, 256);
    }

    #[test]
    fn invalid_enum_text_is_a_config_error() {
        let path = temp_config("invalid", "[filters]\nbucket_mode = \"quarter\"\n");
        let result = AppConfig::load_from(&path);
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn toml_rendering_round_trips() {
        let cfg = AppConfig::default();
        let text = cfg.to_toml_string().unwrap();
        assert!(text.contains("[filters]"));
        assert!(text.contains("start_date = \"2023-01-01\""));
        let path = temp_config("roundtrip", &text);
        let back = AppConfig::load_from(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, cfg);
    }
}
