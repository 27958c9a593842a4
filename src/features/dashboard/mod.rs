pub mod models;
/// 报表流水线与带缓存的报表服务
pub mod service;

pub use models::{
    CityBreakdown, DashboardReport, GenderView, RegionView, SkuTotal, SkuView, StatusView,
};
pub use service::{DashboardService, build_report};
