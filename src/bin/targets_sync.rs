use finance_sync_rust::config::{DatabaseConfig, TargetsConfig};
use finance_sync_rust::service::targets::sync_targets;
use finance_sync_rust::{create_pool, init_logging};
use tracing::info;

/// 销售目标同步任务入口
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let database = DatabaseConfig::from_env()?;
    let config = TargetsConfig::from_env()?;
    info!("Starting sales targets sync: folder {}", config.folder.display());

    let pool = create_pool(&database.url).await?;
    sync_targets(&pool, &config).await?;

    info!("Sales targets sync finished");
    Ok(())
}
