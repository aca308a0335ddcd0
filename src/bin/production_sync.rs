use finance_sync_rust::config::{DatabaseConfig, ProductionConfig};
use finance_sync_rust::service::production::sync_production;
use finance_sync_rust::{create_pool, init_logging};
use tracing::info;

/// 门店产能同步任务入口 (当期 + 累计两个页签)
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let database = DatabaseConfig::from_env()?;
    let config = ProductionConfig::from_env()?;
    info!("Starting store production sync: {}", config.excel_path.display());

    let pool = create_pool(&database.url).await?;
    let inserted = sync_production(&pool, &config).await?;

    info!("Store production sync finished: {} rows inserted", inserted);
    Ok(())
}
