use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{Acquire, PgPool, Postgres};
use std::time::Duration;

/// 一行一条 INSERT 的持久化契约; 表名由任务注入, 值全部位置绑定
pub trait InsertRow: std::fmt::Debug {
    fn insert_sql(table: &str) -> String;
    fn bind<'q>(&'q self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments>;
}

/// 分块上传参数
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub chunk_size: usize,
    /// 块间暂停, 用于限流共享数据库; 零则不停
    pub pause: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            pause: Duration::ZERO,
        }
    }
}

/// 插入失败的行, 作为运行后报告的一部分返回
#[derive(Debug, Clone)]
pub struct FailedRow {
    pub row: String,
    pub error: String,
}

/// 上传结果汇总
#[derive(Debug, Default)]
pub struct UploadReport {
    pub inserted: usize,
    pub failed: Vec<FailedRow>,
}

/// 分块插入: 每块一个事务一次提交, 行级失败用 savepoint 隔离,
/// 跳过该行继续, 不中断块。中断只会丢掉最后一个未提交的块
/// (块粒度的 at-least-once)。
pub async fn upload_in_chunks<R: InsertRow>(
    pool: &PgPool,
    table: &str,
    rows: &[R],
    options: &UploadOptions,
) -> Result<UploadReport, sqlx::Error> {
    let mut report = UploadReport::default();
    if rows.is_empty() {
        return Ok(report);
    }

    let sql = R::insert_sql(table);
    let total = rows.len();

    for (chunk_idx, chunk) in rows.chunks(options.chunk_size).enumerate() {
        let span = chunk_span(chunk_idx, chunk.len(), options.chunk_size, total);
        tracing::info!("插入记录 {} 至 {} (共 {})...", span.first, span.last, total);

        let mut tx = pool.begin().await?;
        for row in chunk {
            // savepoint: 单行失败不污染整块事务
            let mut savepoint = tx.begin().await?;
            match row.bind(sqlx::query(&sql)).execute(&mut *savepoint).await {
                Ok(_) => {
                    savepoint.commit().await?;
                    report.inserted += 1;
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    tracing::error!("行插入失败: {} ({:?})", e, row);
                    report.failed.push(FailedRow {
                        row: format!("{row:?}"),
                        error: e.to_string(),
                    });
                }
            }
        }
        tx.commit().await?;

        if !options.pause.is_zero() && !span.is_last {
            tracing::info!("块已提交, 暂停 {:?} 后继续...", options.pause);
            tokio::time::sleep(options.pause).await;
        }
    }

    tracing::info!(
        "上传完成: 插入 {} 行, 失败 {} 行",
        report.inserted,
        report.failed.len()
    );
    Ok(report)
}

/// 一块覆盖的行号区间 (1 起)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkSpan {
    first: usize,
    last: usize,
    /// 最后一块提交后不再暂停
    is_last: bool,
}

fn chunk_span(chunk_idx: usize, chunk_len: usize, chunk_size: usize, total: usize) -> ChunkSpan {
    let first = chunk_idx * chunk_size + 1;
    let last = first + chunk_len - 1;
    ChunkSpan {
        first,
        last,
        is_last: last == total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(total: usize, chunk_size: usize) -> Vec<ChunkSpan> {
        let rows = vec![(); total];
        rows.chunks(chunk_size)
            .enumerate()
            .map(|(idx, chunk)| chunk_span(idx, chunk.len(), chunk_size, total))
            .collect()
    }

    #[test]
    fn exact_multiple_covers_all_rows() {
        let spans = spans(1000, 500);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].first, spans[0].last), (1, 500));
        assert_eq!((spans[1].first, spans[1].last), (501, 1000));
        assert!(!spans[0].is_last);
        assert!(spans[1].is_last);
    }

    #[test]
    fn ragged_tail_chunk_is_short_and_last() {
        let spans = spans(7, 3);
        assert_eq!(spans.len(), 3);
        assert_eq!((spans[2].first, spans[2].last), (7, 7));
        assert!(spans[2].is_last);
        assert!(spans.iter().take(2).all(|s| !s.is_last));
    }

    #[test]
    fn single_partial_chunk_skips_pause() {
        let spans = spans(2, 500);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].first, spans[0].last), (1, 2));
        assert!(spans[0].is_last);
    }

    #[test]
    fn spans_are_contiguous_and_complete() {
        for (total, size) in [(1, 1), (10, 4), (499, 500), (501, 500), (1500, 1000)] {
            let spans = spans(total, size);
            assert_eq!(spans[0].first, 1, "total {total} size {size}");
            assert_eq!(spans.last().map(|s| s.last), Some(total));
            for pair in spans.windows(2) {
                assert_eq!(pair[1].first, pair[0].last + 1);
            }
            assert_eq!(spans.iter().filter(|s| s.is_last).count(), 1);
        }
    }
}
