/// 规范事件日期解析
pub mod dates;
pub mod models;
/// 只读订单快照
pub mod repository;

pub use dates::{parse_calendar_date, resolve_event_date};
pub use models::{OrderRecord, STATUS_DELIVERED, STATUS_RETURN, normalize_status};
pub use repository::OrderRepository;
