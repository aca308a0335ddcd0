use bigdecimal::BigDecimal;
use sqlx::PgPool;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::config::TargetsConfig;
use crate::error::SyncError;
use crate::ingest::reader::{require_columns, RawRow};
use crate::ingest::{folder, read_sheet};
use crate::models::SalesTarget;
use crate::service::uploader::{upload_in_chunks, UploadOptions};

const TARGETS_TABLE: &str = "sales_target";
/// 目标数据必须放在名为 Hoja1 的工作表
const TARGETS_SHEET: &str = "hoja1";
const ARCHIVE_SUBFOLDER: &str = "completos";

const REQUIRED_COLUMNS: &[&str] = &["sap", "mes", "trc_objetivo"];

/// 销售目标同步: 固定工作表 → 百分比解析 → 重复键校验 → upsert
pub async fn sync_targets(pool: &PgPool, config: &TargetsConfig) -> Result<(), SyncError> {
    let files = folder::discover_spreadsheets(&config.folder)?;
    if files.is_empty() {
        tracing::info!("没有待处理的 .xlsx/.xls 文件");
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
    let rows = read_sheet(path, TARGETS_SHEET)?;
    require_columns(&rows, REQUIRED_COLUMNS, path)?;

    let targets = parse_targets(&rows, path)?;
    tracing::info!("上传 {} 条目标到 '{}'...", targets.len(), TARGETS_TABLE);

    // 与其余任务一致走分块通道, 每 500 行一次提交
    let options = UploadOptions {
        chunk_size: 500,
        pause: Duration::ZERO,
    };
    let report = upload_in_chunks(pool, TARGETS_TABLE, &targets, &options).await?;
    for failed in &report.failed {
        tracing::warn!("未插入的行: {} ({})", failed.row, failed.error);
    }

    let destination = folder::archive(path, ARCHIVE_SUBFOLDER)?;
    tracing::info!("文件已归档至: {}", destination.display());
    Ok(())
}

/// 解析并校验一个文件的目标; (sap, mes) 重复是文件级错误
pub fn parse_targets(rows: &[RawRow], file: &Path) -> Result<Vec<SalesTarget>, SyncError> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut targets = Vec::with_capacity(rows.len());

    for row in rows {
        let field = |name: &str| row.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
        let sap_code = field("sap");
        let month = field("mes");
        if sap_code.is_empty() && month.is_empty() {
            continue;
        }
        if !seen.insert((sap_code.clone(), month.clone())) {
            return Err(SyncError::DuplicateTargetKeys(file.to_path_buf()));
        }

        targets.push(SalesTarget {
            sap_code,
            month,
            target_ratio: parse_percent(&field("trc_objetivo")),
        });
    }
    Ok(targets)
}

/// 目标值文本: 去掉 %, 逗号转小数点, 定点 4 位; 数值保持原样
/// ("12,5%" → 12.5000, 不除以 100)。无法解析按零处理。
pub fn parse_percent(text: &str) -> BigDecimal {
    let cleaned = text.trim().replace('%', "").replace(',', ".");
    let value = BigDecimal::from_str(cleaned.trim()).unwrap_or_default();
    value.round(4).with_scale(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ratio(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    #[test]
    fn percent_with_comma_decimal() {
        assert_eq!(parse_percent("12,5%"), ratio("12.5000"));
        assert_eq!(parse_percent(" 100% "), ratio("100.0000"));
        assert_eq!(parse_percent("0,33"), ratio("0.3300"));
    }

    #[test]
    fn percent_rounds_half_up_at_four_decimals() {
        assert_eq!(parse_percent("12,34565%"), ratio("12.3457"));
        assert_eq!(parse_percent("12,34564%"), ratio("12.3456"));
    }

    #[test]
    fn invalid_percent_coerces_to_zero() {
        assert_eq!(parse_percent("n/d"), ratio("0.0000"));
        assert_eq!(parse_percent(""), ratio("0.0000"));
    }

    fn row(sap: &str, mes: &str, objetivo: &str) -> RawRow {
        [("sap", sap), ("mes", mes), ("trc_objetivo", objetivo)]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn duplicate_sap_month_is_a_file_error() {
        let rows = vec![row("T01", "6", "10%"), row("T01", "6", "12%")];
        let err = parse_targets(&rows, &PathBuf::from("obj.xlsx")).unwrap_err();
        assert!(matches!(err, SyncError::DuplicateTargetKeys(_)));
    }

    #[test]
    fn distinct_keys_parse() {
        let rows = vec![row("T01", "6", "10%"), row("T01", "7", "12,5%")];
        let targets = parse_targets(&rows, &PathBuf::from("obj.xlsx")).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].target_ratio, ratio("12.5000"));
    }
}
