use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// 创建数据库连接池
///
/// 批处理任务单线程顺序执行, 少量连接足够。
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut connect_options = PgConnectOptions::from_str(database_url)?;

    // 设置慢查询日志阈值为 5秒
    connect_options = connect_options.log_slow_statements(
        tracing::log::LevelFilter::Warn,
        Duration::from_secs(5),
    );

    PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await
}
