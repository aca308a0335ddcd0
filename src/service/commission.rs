use sqlx::PgPool;
use std::path::Path;

use crate::config::CommissionConfig;
use crate::db::queries;
use crate::error::SyncError;
use crate::ingest::{folder, read_tabular};
use crate::service::normalizer::normalize_batch;
use crate::service::reconciler::{self, PeriodState, SnapshotAction};
use crate::service::splitter::split_batch;
use crate::service::uploader::{upload_in_chunks, UploadOptions, UploadReport};
use crate::service::verifier::{check_balance, sum_amounts};

/// 当期快照表
const SNAPSHOT_TABLE: &str = "commission_split";
/// 历史表, 按年+月只追加
const HISTORY_TABLE: &str = "commission_split_history";
/// 处理完的源文件归档子目录
const ARCHIVE_SUBFOLDER: &str = "procesados";

/// 佣金拆分与对账流水线 (快照 + 历史两个入口)
pub struct CommissionJob {
    pool: PgPool,
    config: CommissionConfig,
}

impl CommissionJob {
    pub fn new(pool: PgPool, config: CommissionConfig) -> Self {
        Self { pool, config }
    }

    /// 快照入口: 拆分 → 平衡校验 → 快照对账 → 分块上传 → 归档
    pub async fn run_snapshot(&self) -> Result<(), SyncError> {
        self.run(Mode::Snapshot).await
    }

    /// 历史入口: 同样的拆分, 但按 (年, 月) 周期键只追加
    pub async fn run_history(&self) -> Result<(), SyncError> {
        self.run(Mode::History).await
    }

    async fn run(&self, mode: Mode) -> Result<(), SyncError> {
        let files = folder::discover(&self.config.folder)?;
        if files.is_empty() {
            tracing::info!("没有待处理文件");
            return Ok(());
        }

        for path in files {
            tracing::info!("处理文件: {}", path.display());
            // 单文件失败不终止整个运行, 继续处理余下文件
            if let Err(e) = self.process_file(&path, mode).await {
                tracing::error!("文件 {} 处理失败: {}", path.display(), e);
            }
        }
        Ok(())
    }

    async fn process_file(&self, path: &Path, mode: Mode) -> Result<(), SyncError> {
        let rows = read_tabular(path)?;
        let (records, stats) = normalize_batch(&rows, path)?;
        tracing::info!(
            "规范化完成: {} 行 (金额归零 {}, 联署人回填 {}, 日期空缺 {})",
            records.len(),
            stats.coerced_amounts,
            stats.defaulted_cosigners,
            stats.blank_dates
        );

        let splits = split_batch(&records, &self.config.policy.seller_share);

        let report = check_balance(&records, &splits);
        if report.ok() {
            tracing::info!(
                "平衡校验通过: 拆分合计 {} == 期望 {}",
                report.split_total,
                report.expected
            );
        } else {
            tracing::error!(
                "平衡校验失败: 拆分合计 {}, 原始合计 {}, 期望 {}",
                report.split_total,
                report.source_total,
                report.expected
            );
            if self.config.policy.strict_balance {
                return Err(SyncError::BalanceMismatch {
                    split_total: report.split_total.to_string(),
                    expected: report.expected.to_string(),
                });
            }
        }

        let upload = match mode {
            Mode::Snapshot => self.reconcile_snapshot(&splits).await?,
            Mode::History => self.reconcile_history(&splits).await?,
        };

        if let Some(upload) = upload {
            for failed in &upload.failed {
                tracing::warn!("未插入的行: {} ({})", failed.row, failed.error);
            }
        }

        let destination = folder::archive(path, ARCHIVE_SUBFOLDER)?;
        tracing::info!("文件已归档至: {}", destination.display());
        Ok(())
    }

    /// 快照对账: 空表插入 / 一致跳过 / 不一致擦除重载
    async fn reconcile_snapshot(
        &self,
        splits: &[crate::models::SplitCommission],
    ) -> Result<Option<UploadReport>, SyncError> {
        let state = queries::snapshot_state(&self.pool, SNAPSHOT_TABLE).await?;
        let local_sum = sum_amounts(splits.iter().map(|s| &s.amount));
        tracing::info!(
            "数据库: {} 行 / {}; 本地: {} 行 / {}",
            state.rows,
            state.amount_sum,
            splits.len(),
            local_sum
        );

        match reconciler::classify_snapshot(&state, splits.len(), &local_sum) {
            SnapshotAction::Skip => {
                tracing::info!("数据已正确装载, 无需上传");
                return Ok(None);
            }
            SnapshotAction::WipeAndReload => {
                tracing::warn!("检测到不一致, 擦除目标表后重载...");
                let wiped = queries::wipe_table(&self.pool, SNAPSHOT_TABLE).await?;
                tracing::warn!("已删除 {} 行", wiped);
            }
            SnapshotAction::InsertAll => {
                tracing::info!("目标表为空, 开始上传新记录...");
            }
        }

        let options = UploadOptions {
            chunk_size: self.config.policy.snapshot_chunk_size,
            pause: self.config.policy.snapshot_pause,
        };
        let report = upload_in_chunks(&self.pool, SNAPSHOT_TABLE, splits, &options).await?;
        Ok(Some(report))
    }

    /// 历史对账: 本批的 (年, 月) 已存在则跳过并告警, 绝不重写
    async fn reconcile_history(
        &self,
        splits: &[crate::models::SplitCommission],
    ) -> Result<Option<UploadReport>, SyncError> {
        if splits.is_empty() {
            tracing::info!("批次为空, 没有可上传的数据");
            return Ok(None);
        }

        let Some((year, month)) = reconciler::period_key(splits) else {
            tracing::warn!("批次没有任何有效日期, 无法确定周期, 跳过上传");
            return Ok(None);
        };

        let state = if queries::period_exists(&self.pool, HISTORY_TABLE, year, month).await? {
            PeriodState::Present
        } else {
            PeriodState::Absent
        };

        match state {
            PeriodState::Present => {
                tracing::warn!("{}/{} 的数据已存在, 不再上传", month, year);
                Ok(None)
            }
            PeriodState::Absent => {
                tracing::info!(
                    "{}/{} 尚无数据, 开始装载 {} 行...",
                    month,
                    year,
                    splits.len()
                );
                let options = UploadOptions {
                    chunk_size: self.config.policy.history_chunk_size,
                    pause: self.config.policy.history_pause,
                };
                let report = upload_in_chunks(&self.pool, HISTORY_TABLE, splits, &options).await?;
                Ok(Some(report))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Snapshot,
    History,
}
