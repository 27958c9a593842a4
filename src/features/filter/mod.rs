/// 筛选引擎：四个独立谓词的与运算
pub mod engine;
/// 筛选条件
pub mod models;

pub use engine::{apply, matches, matches_date_range, matches_gender, matches_sku, matches_status};
pub use models::{FILTER_ALL, FilterSpec, GenderFilter, SkuFilter, StatusFilter};
