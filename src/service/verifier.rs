use bigdecimal::{BigDecimal, Zero};
use std::str::FromStr;

use crate::models::{NormalizedCommission, SplitCommission};

/// 平衡校验容差
const BALANCE_TOLERANCE: &str = "0.01";

/// 平衡校验结果
///
/// 拆分记录各自携带一份审计用原始金额, 所以 source_total 把每条
/// 原始金额计了两次; 期望值因此是 source_total / 2。
#[derive(Debug, Clone)]
pub struct BalanceReport {
    pub split_total: BigDecimal,
    pub source_total: BigDecimal,
    pub expected: BigDecimal,
    /// 每条规范化记录恰好两条拆分
    pub pair_count_ok: bool,
    pub balanced: bool,
}

impl BalanceReport {
    pub fn ok(&self) -> bool {
        self.balanced && self.pair_count_ok
    }
}

/// 诊断性校验, 默认不阻断上传; strict 策略由调用方决定
pub fn check_balance(
    records: &[NormalizedCommission],
    splits: &[SplitCommission],
) -> BalanceReport {
    let split_total = sum_amounts(splits.iter().map(|s| &s.amount));
    let source_total = sum_amounts(splits.iter().map(|s| &s.source_amount));
    let expected = &source_total / BigDecimal::from(2);

    let tolerance = BigDecimal::from_str(BALANCE_TOLERANCE).unwrap_or_else(|_| BigDecimal::zero());
    let balanced = (&split_total - &expected).abs() < tolerance;

    BalanceReport {
        split_total,
        source_total,
        expected,
        pair_count_ok: splits.len() == records.len() * 2,
        balanced,
    }
}

/// 金额求和 (BigDecimal 不是 Copy, 借用累加)
pub fn sum_amounts<'a, I>(amounts: I) -> BigDecimal
where
    I: Iterator<Item = &'a BigDecimal>,
{
    amounts.fold(BigDecimal::zero(), |acc, v| acc + v)
}
