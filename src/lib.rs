/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 启动检查与数据加载模块
pub mod startup;

/// 功能聚合模块
pub mod features;

// 导出常用类型供外部使用
pub use crate::config::AppConfig;
pub use error::AppError;
pub use features::dashboard::{DashboardReport, DashboardService, build_report};
pub use features::filter::FilterSpec;
pub use features::orders::{OrderRecord, OrderRepository};
