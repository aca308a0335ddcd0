use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::models::SplitCommission;

/// 快照表行数/金额和容差
const SNAPSHOT_TOLERANCE: &str = "0.10";

/// 快照表 (可变 "当期" 表) 的装载状态, 上传前先读取
#[derive(Debug, Clone)]
pub struct SnapshotState {
    pub rows: i64,
    pub amount_sum: BigDecimal,
}

/// 快照表对账决策
///
/// 源文件始终是完整快照, 不做行级 upsert: 不一致时整表擦除重载,
/// 以正确性换效率。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotAction {
    /// 目标表为空, 整批插入
    InsertAll,
    /// 行数与金额和都对得上, 无事可做
    Skip,
    /// 行数或金额和不一致 (残留的部分装载), 擦除后重载
    WipeAndReload,
}

/// 纯分类: 数据库状态 vs 本地批次 (行数 + 金额和)
pub fn classify_snapshot(
    state: &SnapshotState,
    local_rows: usize,
    local_sum: &BigDecimal,
) -> SnapshotAction {
    if state.rows == 0 {
        return SnapshotAction::InsertAll;
    }

    let tolerance = BigDecimal::from_str(SNAPSHOT_TOLERANCE).unwrap_or_default();
    let sums_close = (&state.amount_sum - local_sum).abs() <= tolerance;

    if state.rows == local_rows as i64 && sums_close {
        SnapshotAction::Skip
    } else {
        SnapshotAction::WipeAndReload
    }
}

/// 历史表 (按年+月分区, 只追加) 的周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodState {
    /// 该年月尚无数据, 可以插入
    Absent,
    /// 已装载过, 跳过并告警; 历史数据不重写
    Present,
}

/// 批次的周期键: 取第一条带有效日期的拆分记录的 (年, 月)
pub fn period_key(splits: &[SplitCommission]) -> Option<(i32, u32)> {
    use chrono::Datelike;
    splits
        .iter()
        .find_map(|s| s.entry_date)
        .map(|d| (d.year(), d.month()))
}
