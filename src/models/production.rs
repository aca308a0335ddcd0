use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use crate::service::uploader::InsertRow;

/// 门店产能记录 (store_production / store_production_history)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreProduction {
    pub production_date: NaiveDate,
    pub store_code: String,
    pub profitable_production: BigDecimal,
    pub gross_sales: BigDecimal,
}

impl InsertRow for StoreProduction {
    fn insert_sql(table: &str) -> String {
        format!(
            "INSERT INTO {table} (
                production_date, store_code, profitable_production, gross_sales
            ) VALUES ($1, $2, $3, $4)"
        )
    }

    fn bind<'q>(&'q self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.production_date)
            .bind(&self.store_code)
            .bind(&self.profitable_production)
            .bind(&self.gross_sales)
    }
}
