pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod service;

pub use db::create_pool;
pub use error::SyncError;

use tracing_subscriber::fmt::time::ChronoLocal;

/// 初始化日志 - 使用本地时间格式
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();
}
