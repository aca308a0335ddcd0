use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use crate::service::uploader::InsertRow;

/// 月度融资记录 (monthly_financing)
///
/// 源文件只带年/月, entry_date 固定为 1900-01-01。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyFinancing {
    pub entry_date: NaiveDate,
    pub sap_code: String,
    pub salesperson_no: i64,
    pub financed_amount: BigDecimal,
    pub year: i32,
    pub month: i32,
    pub operations: i32,
}

/// 去重键: 目标表中已存在该组合的行不再插入
pub type MonthlyKey = (NaiveDate, String, i64, i32, i32);

impl MonthlyFinancing {
    pub fn key(&self) -> MonthlyKey {
        (
            self.entry_date,
            self.sap_code.clone(),
            self.salesperson_no,
            self.year,
            self.month,
        )
    }
}

impl InsertRow for MonthlyFinancing {
    fn insert_sql(table: &str) -> String {
        format!(
            "INSERT INTO {table} (
                entry_date, sap_code, salesperson_no, financed_amount,
                year, month, operations
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        )
    }

    fn bind<'q>(&'q self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.entry_date)
            .bind(&self.sap_code)
            .bind(self.salesperson_no)
            .bind(&self.financed_amount)
            .bind(self.year)
            .bind(self.month)
            .bind(self.operations)
    }
}
