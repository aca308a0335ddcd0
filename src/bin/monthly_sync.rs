use finance_sync_rust::config::{DatabaseConfig, MonthlyConfig};
use finance_sync_rust::service::monthly::sync_monthly;
use finance_sync_rust::{create_pool, init_logging};
use tracing::info;

/// 月度融资数据同步任务入口
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let database = DatabaseConfig::from_env()?;
    let config = MonthlyConfig::from_env()?;
    info!("Starting monthly financing sync: folder {}", config.folder.display());

    let pool = create_pool(&database.url).await?;
    sync_monthly(&pool, &config).await?;

    info!("Monthly financing sync finished");
    Ok(())
}
