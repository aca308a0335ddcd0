use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SyncError;
use crate::ingest::reader::{require_columns, RawRow};
use crate::models::NormalizedCommission;

/// 佣金源文件的必需列 (规范化后的列名)
const REQUIRED_COLUMNS: &[&str] = &["fecha_alta", "sap", "importe", "cod_vend", "vend_firma"];

/// 规范化诊断计数: 只记录, 不抛错
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeStats {
    /// 金额无法解析, 按 coerce-invalid-to-zero 策略归零的行数
    pub coerced_amounts: usize,
    /// 联署人代码为空/为 "0", 回填为卖方代码的行数
    pub defaulted_cosigners: usize,
    /// 日期字段无法解析的行数
    pub blank_dates: usize,
}

/// 把一批原始行规范化为类型化佣金记录
///
/// 纯转换: 每行生成一个 12 位 hex 的关联标识, 对 10^5 以内的批次
/// 碰撞概率可以忽略。金额解析失败不终止批次, 只计数。
pub fn normalize_batch(
    rows: &[RawRow],
    file: &Path,
) -> Result<(Vec<NormalizedCommission>, NormalizeStats), SyncError> {
    require_columns(rows, REQUIRED_COLUMNS, file)?;

    let mut stats = NormalizeStats::default();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        records.push(normalize_row(row, &mut stats));
    }
    Ok((records, stats))
}

fn normalize_row(row: &RawRow, stats: &mut NormalizeStats) -> NormalizedCommission {
    let seller_code = field(row, "cod_vend");
    let raw_cosigner = field(row, "vend_firma");
    let cosigner_code = default_cosigner(&raw_cosigner, &seller_code, stats);

    let amount = match parse_decimal(&field(row, "importe")) {
        Some(v) => scale2(&v),
        None => {
            stats.coerced_amounts += 1;
            BigDecimal::zero()
        }
    };

    let entry_date = parse_date(&field(row, "fecha_alta"));
    if entry_date.is_none() {
        stats.blank_dates += 1;
    }

    NormalizedCommission {
        entry_date,
        sap_code: field(row, "sap"),
        first_use_flag: parse_int_soft(&field(row, "ind_primera_util_interna")),
        campaign: field(row, "ftci"),
        operations: parse_int_soft(&field(row, "num_operaciones")),
        seller_code,
        cosigner_code,
        amount,
        correlation_id: correlation_id(),
    }
}

/// 空或字面 "0" 的联署人代码回填为卖方代码
fn default_cosigner(raw: &str, seller_code: &str, stats: &mut NormalizeStats) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "0" {
        stats.defaulted_cosigners += 1;
        seller_code.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 12 位 hex 关联标识, 同一源记录的两条拆分共享
pub fn correlation_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

fn field(row: &RawRow, name: &str) -> String {
    row.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// 金额文本解析: 含逗号时按 `1.234,56` 处理 (点为千分位, 逗号为小数点)
pub(crate) fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    BigDecimal::from_str(&normalized).ok()
}

/// 可选整数字段: 解析失败归零; 小数部分直接截断
pub(crate) fn parse_int_soft(text: &str) -> i32 {
    parse_decimal(text)
        .map(|v| v.with_scale(0))
        .and_then(|v| i32::from_str(&v.to_string()).ok())
        .unwrap_or(0)
}

/// 日期解析, 逐个尝试源文件里出现过的格式
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(d);
        }
    }
    None
}

/// 定点到 2 位小数, 四舍五入 (round 半数进位, with_scale 补齐尾零)
pub(crate) fn scale2(value: &BigDecimal) -> BigDecimal {
    value.round(2).with_scale(2)
}
