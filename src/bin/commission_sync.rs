use finance_sync_rust::config::{CommissionConfig, DatabaseConfig};
use finance_sync_rust::service::CommissionJob;
use finance_sync_rust::{create_pool, init_logging};
use tracing::info;

/// 佣金拆分快照任务入口 (无参数, 全部由环境变量驱动)
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let database = DatabaseConfig::from_env()?;
    let config = CommissionConfig::from_env()?;
    info!("Starting commission snapshot sync: folder {}", config.folder.display());

    let pool = create_pool(&database.url).await?;
    CommissionJob::new(pool, config).run_snapshot().await?;

    info!("Commission snapshot sync finished");
    Ok(())
}
