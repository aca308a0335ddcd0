use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::HashSet;

use crate::models::{EmployeeRecord, MonthlyKey};
use crate::service::reconciler::SnapshotState;

/// 读取快照表装载状态 (行数 + 金额和); 表本身是唯一事实来源
pub async fn snapshot_state(pool: &PgPool, table: &str) -> Result<SnapshotState, sqlx::Error> {
    let (rows, amount_sum): (i64, Option<BigDecimal>) = sqlx::query_as(&format!(
        "SELECT COUNT(*), SUM(amount) FROM {table}"
    ))
    .fetch_one(pool)
    .await?;

    Ok(SnapshotState {
        rows,
        amount_sum: amount_sum.unwrap_or_else(BigDecimal::zero),
    })
}

/// 擦除快照表全部行 (wipe-and-reload 的前半)
pub async fn wipe_table(pool: &PgPool, table: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&format!("DELETE FROM {table}"))
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// 历史表是否已存在该 (年, 月) 的数据
pub async fn period_exists(
    pool: &PgPool,
    table: &str,
    year: i32,
    month: u32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT EXISTS(
            SELECT 1 FROM {table}
            WHERE EXTRACT(YEAR FROM entry_date)::int = $1
              AND EXTRACT(MONTH FROM entry_date)::int = $2
        )"
    ))
    .bind(year)
    .bind(month as i32)
    .fetch_one(pool)
    .await
}

/// 花名册当前全量
pub async fn fetch_roster(pool: &PgPool, table: &str) -> Result<Vec<EmployeeRecord>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeRecord>(&format!(
        "SELECT sap_code, masked_nif, store_code, full_name FROM {table}"
    ))
    .fetch_all(pool)
    .await
}

pub async fn insert_employee(
    pool: &PgPool,
    table: &str,
    record: &EmployeeRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO {table} (sap_code, masked_nif, store_code, full_name)
         VALUES ($1, $2, $3, $4)"
    ))
    .bind(&record.sap_code)
    .bind(&record.masked_nif)
    .bind(&record.store_code)
    .bind(&record.full_name)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_employee(pool: &PgPool, table: &str, sap_code: &str) -> Result<(), sqlx::Error> {
    sqlx::query(&format!("DELETE FROM {table} WHERE sap_code = $1"))
        .bind(sap_code)
        .execute(pool)
        .await?;
    Ok(())
}

/// NIF 或门店任一变化都会触发更新, 两列一起写
pub async fn update_employee(
    pool: &PgPool,
    table: &str,
    record: &EmployeeRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE {table} SET masked_nif = $1, store_code = $2 WHERE sap_code = $3"
    ))
    .bind(&record.masked_nif)
    .bind(&record.store_code)
    .bind(&record.sap_code)
    .execute(pool)
    .await?;
    Ok(())
}

/// 月度融资表已有的去重键集合
pub async fn monthly_existing_keys(
    pool: &PgPool,
    table: &str,
) -> Result<HashSet<MonthlyKey>, sqlx::Error> {
    let rows: Vec<MonthlyKey> = sqlx::query_as(&format!(
        "SELECT entry_date, sap_code, salesperson_no, year, month FROM {table}"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

/// 产能表已装载的日期集合
pub async fn production_dates(
    pool: &PgPool,
    table: &str,
) -> Result<HashSet<NaiveDate>, sqlx::Error> {
    let dates: Vec<NaiveDate> =
        sqlx::query_scalar(&format!("SELECT production_date FROM {table}"))
            .fetch_all(pool)
            .await?;
    Ok(dates.into_iter().collect())
}

