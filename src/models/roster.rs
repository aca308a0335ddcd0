use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 员工花名册记录 (employee_roster)
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// SAP 人事编号, 已去掉前导零
    pub sap_code: String,
    pub masked_nif: String,
    pub store_code: String,
    pub full_name: String,
}
