/// 聚合引擎
pub mod aggregate;
/// 仪表盘报表
pub mod dashboard;
/// 筛选条件与筛选引擎
pub mod filter;
/// 订单模型、日期解析与仓库
pub mod orders;
/// 统计汇总
pub mod summary;
