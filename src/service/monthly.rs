use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::config::MonthlyConfig;
use crate::db::queries;
use crate::error::SyncError;
use crate::ingest::reader::{require_columns, RawRow};
use crate::ingest::{folder, read_tabular};
use crate::models::MonthlyFinancing;
use crate::service::normalizer::scale2;
use crate::service::uploader::{upload_in_chunks, UploadOptions};

const MONTHLY_TABLE: &str = "monthly_financing";
const ARCHIVE_SUBFOLDER: &str = "mes_procesado";

/// 月度文件的列 (规范化后)
const REQUIRED_COLUMNS: &[&str] = &[
    "year",
    "month",
    "sap_code",
    "salesperson_no",
    "operations",
    "amount",
];

/// 必填字段校验的丢弃计数; 丢行是显式决策, 不悄悄归零
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MonthlyStats {
    pub invalid_sap: usize,
    pub invalid_amount: usize,
    pub invalid_year: usize,
    pub invalid_month: usize,
    pub invalid_operations: usize,
    pub dropped: usize,
    pub parsed: usize,
}

/// 月度融资同步: 严格字段校验 → 数据库键去重 → 分块插入 (带暂停)
pub async fn sync_monthly(pool: &PgPool, config: &MonthlyConfig) -> Result<(), SyncError> {
    let files = folder::discover(&config.folder)?;
    if files.is_empty() {
        tracing::info!("共享文件夹中没有待处理文件");
        return Ok(());
    }

    for path in files {
        tracing::info!("处理文件: {}", path.display());
        if let Err(e) = process_file(pool, &path).await {
            tracing::error!("文件 {} 处理失败: {}", path.display(), e);
        }
    }
    Ok(())
}

async fn process_file(pool: &PgPool, path: &Path) -> Result<(), SyncError> {
    let rows = read_tabular(path)?;
    require_columns(&rows, REQUIRED_COLUMNS, path)?;

    let (records, stats) = parse_rows(&rows);
    if stats.dropped > 0 {
        tracing::warn!(
            "{} 行因必填字段无效被丢弃 (sap {}, 金额 {}, 年 {}, 月 {}, 笔数 {})",
            stats.dropped,
            stats.invalid_sap,
            stats.invalid_amount,
            stats.invalid_year,
            stats.invalid_month,
            stats.invalid_operations
        );
    }

    tracing::info!("获取数据库已有键...");
    let existing = queries::monthly_existing_keys(pool, MONTHLY_TABLE).await?;
    let new_records = filter_new(records, &existing);
    tracing::info!("发现 {} 条新记录", new_records.len());

    if !new_records.is_empty() {
        let options = UploadOptions {
            chunk_size: 1000,
            pause: Duration::from_secs(5),
        };
        let report = upload_in_chunks(pool, MONTHLY_TABLE, &new_records, &options).await?;
        for failed in &report.failed {
            tracing::warn!("未插入的行: {} ({})", failed.row, failed.error);
        }
    } else {
        tracing::info!("没有需要插入的新记录");
    }

    let destination = folder::archive(path, ARCHIVE_SUBFOLDER)?;
    tracing::info!("文件已归档至: {}", destination.display());
    Ok(())
}

/// 逐行严格解析; 任一必填字段不可解析则整行丢弃并计数
pub fn parse_rows(rows: &[RawRow]) -> (Vec<MonthlyFinancing>, MonthlyStats) {
    let mut stats = MonthlyStats::default();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        match parse_row(row, &mut stats) {
            Some(record) => {
                stats.parsed += 1;
                records.push(record);
            }
            None => stats.dropped += 1,
        }
    }
    (records, stats)
}

fn parse_row(row: &RawRow, stats: &mut MonthlyStats) -> Option<MonthlyFinancing> {
    let field = |name: &str| row.get(name).map(|v| v.trim().to_string()).unwrap_or_default();

    let sap_code = field("sap_code");
    if sap_code.is_empty() {
        stats.invalid_sap += 1;
        return None;
    }

    let Some(financed_amount) = parse_amount(&field("amount")) else {
        stats.invalid_amount += 1;
        return None;
    };
    let Some(year) = parse_strict_int(&field("year")) else {
        stats.invalid_year += 1;
        return None;
    };
    let Some(month) = parse_strict_int(&field("month")) else {
        stats.invalid_month += 1;
        return None;
    };
    let Some(operations) = parse_strict_int(&field("operations")) else {
        stats.invalid_operations += 1;
        return None;
    };

    Some(MonthlyFinancing {
        // 源不带日期, 固定占位值
        entry_date: placeholder_date(),
        sap_code,
        salesperson_no: parse_salesperson(&field("salesperson_no")),
        financed_amount: scale2(&financed_amount),
        year,
        month,
        operations,
    })
}

/// 月度导出的金额一律 `1.234,56` 格式: 点永远是千分位, 无条件去掉,
/// 逗号转小数点。没有逗号的 "1.234" 因此是 1234, 不是 1.234。
fn parse_amount(text: &str) -> Option<BigDecimal> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    BigDecimal::from_str(&cleaned.replace('.', "").replace(',', ".")).ok()
}

/// 卖方编号是可选字段: N/A 与空串按策略归零, 不丢行
fn parse_salesperson(text: &str) -> i64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        return 0;
    }
    trimmed.parse().unwrap_or(0)
}

fn parse_strict_int(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

fn placeholder_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("constant date")
}

fn filter_new(
    records: Vec<MonthlyFinancing>,
    existing: &HashSet<crate::models::MonthlyKey>,
) -> Vec<MonthlyFinancing> {
    records
        .into_iter()
        .filter(|r| !existing.contains(&r.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn row(sap: &str, amount: &str, year: &str, month: &str, ops: &str, seller: &str) -> RawRow {
        [
            ("sap_code", sap),
            ("amount", amount),
            ("year", year),
            ("month", month),
            ("operations", ops),
            ("salesperson_no", seller),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn valid_row_parses_with_comma_decimal() {
        let rows = vec![row("T01", "1.234,56", "2024", "6", "3", "40123")];
        let (records, stats) = parse_rows(&rows);
        assert_eq!(stats.parsed, 1);
        assert_eq!(stats.dropped, 0);
        let r = &records[0];
        assert_eq!(r.financed_amount, BigDecimal::from_str("1234.56").unwrap());
        assert_eq!(r.salesperson_no, 40123);
        assert_eq!((r.year, r.month, r.operations), (2024, 6, 3));
        assert_eq!(r.entry_date, NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
    }

    #[test]
    fn dot_grouped_amount_is_thousands_not_decimal() {
        let rows = vec![row("T01", "1.234", "2024", "6", "1", "1")];
        let (records, stats) = parse_rows(&rows);
        assert_eq!(stats.dropped, 0);
        assert_eq!(records[0].financed_amount, BigDecimal::from_str("1234.00").unwrap());
    }

    #[test]
    fn mandatory_field_failures_drop_and_count() {
        let rows = vec![
            row("", "10,00", "2024", "6", "1", "1"),      // sap 缺失
            row("T01", "sin dato", "2024", "6", "1", "1"), // 金额无效
            row("T01", "10,00", "año", "6", "1", "1"),     // 年无效
            row("T01", "10,00", "2024", "6", "x", "1"),    // 笔数无效
            row("T02", "10,00", "2024", "6", "1", "1"),    // 有效
        ];
        let (records, stats) = parse_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(stats.dropped, 4);
        assert_eq!(stats.invalid_sap, 1);
        assert_eq!(stats.invalid_amount, 1);
        assert_eq!(stats.invalid_year, 1);
        assert_eq!(stats.invalid_operations, 1);
    }

    #[test]
    fn salesperson_na_coerces_to_zero_without_dropping() {
        for raw in ["N/A", "n/a", "", "   "] {
            let rows = vec![row("T01", "10,00", "2024", "6", "1", raw)];
            let (records, stats) = parse_rows(&rows);
            assert_eq!(stats.dropped, 0, "raw {raw:?}");
            assert_eq!(records[0].salesperson_no, 0);
        }
    }

    #[test]
    fn existing_keys_filter_out_duplicates() {
        let rows = vec![
            row("T01", "10,00", "2024", "6", "1", "1"),
            row("T02", "20,00", "2024", "6", "1", "1"),
        ];
        let (records, _) = parse_rows(&rows);
        let existing: HashSet<_> = [records[0].key()].into_iter().collect();
        let fresh = filter_new(records, &existing);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].sap_code, "T02");
    }
}
