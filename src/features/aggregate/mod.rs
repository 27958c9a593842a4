/// 聚合引擎：将订单按时间桶与维度计数
pub mod engine;
pub mod models;

pub use engine::{aggregate, aggregate_by, aggregate_by_key, aggregate_seeded};
pub use models::{
    AggregationTable, BucketMode, ChartRow, Dimension, MONTH_LABELS, WEEKDAY_LABELS,
};
