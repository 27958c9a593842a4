/// 启动检查工具模块
pub mod checks;
/// 订单数据加载器（CSV / JSON）
pub mod order_loader;

pub use checks::run_startup_checks;
pub use order_loader::{DatasetFormat, load_orders, read_orders_csv, read_orders_json};
