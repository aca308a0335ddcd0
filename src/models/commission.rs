use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use crate::service::uploader::InsertRow;

/// 规范化后的佣金记录 (一行源数据)
///
/// 金额已定点到 2 位小数, 代码字段已去空白, 联署人代码为空/为 "0" 时
/// 已回填为卖方代码。correlation_id 在规范化时生成, 之后不再变化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedCommission {
    pub entry_date: Option<NaiveDate>,
    pub sap_code: String,
    pub first_use_flag: i32,
    pub campaign: String,
    pub operations: i32,
    pub seller_code: String,
    pub cosigner_code: String,
    pub amount: BigDecimal,
    pub correlation_id: String,
}

/// 拆分角色: 每条源记录恰好派生出一条卖方 + 一条联署人
///
/// 枚举声明顺序即持久化/比较时的确定性排序 (卖方在前)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Seller,
    Cosigner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seller => "seller",
            Role::Cosigner => "cosigner",
        }
    }
}

/// 佣金拆分记录 (SplitCommission)
///
/// source_amount 保留拆分前金额用于审计; amount 只携带本角色份额。
/// 创建后不可变, 终态为目标表中的一行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitCommission {
    pub entry_date: Option<NaiveDate>,
    pub sap_code: String,
    pub first_use_flag: i32,
    pub campaign: String,
    pub operations: i32,
    pub source_amount: BigDecimal,
    pub beneficiary: String,
    pub amount: BigDecimal,
    pub role: Role,
    /// 复合查找索引: 门店代码 + 受益人代码
    pub lookup_index: String,
    pub personnel_no: String,
    pub correlation_id: String,
}

impl InsertRow for SplitCommission {
    fn insert_sql(table: &str) -> String {
        format!(
            "INSERT INTO {table} (
                entry_date, sap_code, first_use_flag, campaign, operations,
                source_amount, beneficiary, amount, role, lookup_index,
                personnel_no, correlation_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        )
    }

    fn bind<'q>(&'q self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.entry_date)
            .bind(&self.sap_code)
            .bind(self.first_use_flag)
            .bind(&self.campaign)
            .bind(self.operations)
            .bind(&self.source_amount)
            .bind(&self.beneficiary)
            .bind(&self.amount)
            .bind(self.role.as_str())
            .bind(&self.lookup_index)
            .bind(&self.personnel_no)
            .bind(&self.correlation_id)
    }
}
