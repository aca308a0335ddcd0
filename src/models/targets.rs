use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use crate::service::uploader::InsertRow;

/// 销售目标 (sales_target), 按 (sap_code, month) 唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesTarget {
    pub sap_code: String,
    pub month: String,
    /// 目标比率, 已从百分比文本转换, 定点 4 位小数
    pub target_ratio: BigDecimal,
}

/// 目标的"插入"是 upsert: 同键再来一次就覆盖比率
impl InsertRow for SalesTarget {
    fn insert_sql(table: &str) -> String {
        format!(
            "INSERT INTO {table} (sap_code, month, target_ratio)
             VALUES ($1, $2, $3)
             ON CONFLICT (sap_code, month)
             DO UPDATE SET target_ratio = EXCLUDED.target_ratio"
        )
    }

    fn bind<'q>(&'q self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(&self.sap_code)
            .bind(&self.month)
            .bind(&self.target_ratio)
    }
}
