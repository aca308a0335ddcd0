use bigdecimal::{BigDecimal, Zero};
use sqlx::PgPool;

use crate::config::ProductionConfig;
use crate::db::queries;
use crate::error::SyncError;
use crate::ingest::read_sheet;
use crate::ingest::reader::{require_columns, RawRow};
use crate::models::StoreProduction;
use crate::service::normalizer::{parse_date, parse_decimal, scale2};
use crate::service::uploader::{upload_in_chunks, UploadOptions};

/// 工作簿的两个页签 → 两张目标表
const SHEETS: &[(&str, &str)] = &[
    ("mes en curso", "store_production"),
    ("acumulado", "store_production_history"),
];

const REQUIRED_COLUMNS: &[&str] = &[
    "fecha",
    "codigo_tienda",
    "producción_rentable",
    "ventas_venta_gross",
];

/// 门店产能同步: 同一工作簿的当期/累计两个页签, 按日期去重后插入
pub async fn sync_production(pool: &PgPool, config: &ProductionConfig) -> Result<usize, SyncError> {
    let mut total_inserted = 0;
    for (sheet, table) in SHEETS {
        tracing::info!("处理页签: {} → 表: {}", sheet, table);
        total_inserted += process_sheet(pool, config, sheet, table).await?;
    }
    tracing::info!("汇总: 共插入 {} 行", total_inserted);
    Ok(total_inserted)
}

async fn process_sheet(
    pool: &PgPool,
    config: &ProductionConfig,
    sheet: &str,
    table: &str,
) -> Result<usize, SyncError> {
    let rows = read_sheet(&config.excel_path, sheet)?;
    require_columns(&rows, REQUIRED_COLUMNS, &config.excel_path)?;

    let records = parse_rows(&rows);

    let existing = queries::production_dates(pool, table).await?;
    let new_records: Vec<StoreProduction> = records
        .into_iter()
        .filter(|r| !existing.contains(&r.production_date))
        .collect();

    if new_records.is_empty() {
        tracing::info!("'{}' 没有新日期需要插入", table);
        return Ok(0);
    }

    let report = upload_in_chunks(pool, table, &new_records, &UploadOptions::default()).await?;
    tracing::info!("已插入 {} 行到 '{}'", report.inserted, table);
    Ok(report.inserted)
}

/// 没有有效日期的行丢弃; 数值字段按归零策略解析
pub fn parse_rows(rows: &[RawRow]) -> Vec<StoreProduction> {
    rows.iter().filter_map(parse_row).collect()
}

fn parse_row(row: &RawRow) -> Option<StoreProduction> {
    let field = |name: &str| row.get(name).map(|v| v.trim().to_string()).unwrap_or_default();

    let production_date = parse_date(&field("fecha"))?;
    Some(StoreProduction {
        production_date,
        store_code: field("codigo_tienda"),
        profitable_production: soft_amount(&field("producción_rentable")),
        gross_sales: soft_amount(&field("ventas_venta_gross")),
    })
}

fn soft_amount(text: &str) -> BigDecimal {
    parse_decimal(text)
        .map(|v| scale2(&v))
        .unwrap_or_else(BigDecimal::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn row(fecha: &str, tienda: &str, rentable: &str, gross: &str) -> RawRow {
        [
            ("fecha", fecha),
            ("codigo_tienda", tienda),
            ("producción_rentable", rentable),
            ("ventas_venta_gross", gross),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn rows_without_valid_dates_are_dropped() {
        let rows = vec![
            row("2024-06-03", "T01", "1.234,56", "2.000,00"),
            row("", "T02", "1", "1"),
            row("no es fecha", "T03", "1", "1"),
        ];
        let records = parse_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].production_date,
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
        );
        assert_eq!(
            records[0].profitable_production,
            BigDecimal::from_str("1234.56").unwrap()
        );
    }

    #[test]
    fn blank_numerics_coerce_to_zero() {
        let rows = vec![row("2024-06-03", "T01", "", "x")];
        let records = parse_rows(&rows);
        assert!(records[0].profitable_production.is_zero());
        assert!(records[0].gross_sales.is_zero());
    }
}
