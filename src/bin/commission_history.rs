use finance_sync_rust::config::{CommissionConfig, DatabaseConfig};
use finance_sync_rust::service::CommissionJob;
use finance_sync_rust::{create_pool, init_logging};
use tracing::info;

/// 佣金拆分历史装载任务入口 (按年+月, 只追加)
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let database = DatabaseConfig::from_env()?;
    let config = CommissionConfig::from_env()?;
    info!("Starting commission history sync: folder {}", config.folder.display());

    let pool = create_pool(&database.url).await?;
    CommissionJob::new(pool, config).run_history().await?;

    info!("Commission history sync finished");
    Ok(())
}
