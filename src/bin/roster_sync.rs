use finance_sync_rust::config::{DatabaseConfig, RosterConfig};
use finance_sync_rust::service::roster::sync_roster;
use finance_sync_rust::{create_pool, init_logging};
use tracing::info;

/// 员工花名册同步任务入口
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let database = DatabaseConfig::from_env()?;
    let config = RosterConfig::from_env()?;
    info!("Starting roster sync: {}", config.excel_path.display());

    let pool = create_pool(&database.url).await?;
    let summary = sync_roster(&pool, &config).await?;

    info!(
        "Roster sync finished: inserted {} / deleted {} / updated {}",
        summary.inserted, summary.deleted, summary.updated
    );
    Ok(())
}
