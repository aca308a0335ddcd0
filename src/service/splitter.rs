use bigdecimal::BigDecimal;

use crate::models::{NormalizedCommission, Role, SplitCommission};
use crate::service::normalizer::scale2;

/// 把一条规范化记录拆成 (卖方, 联署人) 两条受益记录
///
/// 卖方份额 = round(amount × seller_share, 2); 联署人份额取补数
/// (rounded amount − 卖方份额), 不独立舍入, 保证两份之和恰好等于
/// 舍入后的原始金额, 没有舍入泄漏。
pub fn split(
    record: &NormalizedCommission,
    seller_share: &BigDecimal,
) -> (SplitCommission, SplitCommission) {
    let total = scale2(&record.amount);
    let seller_amount = scale2(&(&record.amount * seller_share));
    let cosigner_amount = &total - &seller_amount;

    let seller = derived(record, Role::Seller, &record.seller_code, seller_amount);
    let cosigner = derived(record, Role::Cosigner, &record.cosigner_code, cosigner_amount);
    (seller, cosigner)
}

/// 整批拆分: N 条输入产出恰好 2N 条, 按 (关联标识, 角色) 排序
pub fn split_batch(
    records: &[NormalizedCommission],
    seller_share: &BigDecimal,
) -> Vec<SplitCommission> {
    let mut splits = Vec::with_capacity(records.len() * 2);
    for record in records {
        let (seller, cosigner) = split(record, seller_share);
        splits.push(seller);
        splits.push(cosigner);
    }
    splits.sort_by(|a, b| {
        a.correlation_id
            .cmp(&b.correlation_id)
            .then(a.role.cmp(&b.role))
    });
    splits
}

fn derived(
    record: &NormalizedCommission,
    role: Role,
    beneficiary: &str,
    amount: BigDecimal,
) -> SplitCommission {
    SplitCommission {
        entry_date: record.entry_date,
        sap_code: record.sap_code.clone(),
        first_use_flag: record.first_use_flag,
        campaign: record.campaign.clone(),
        operations: record.operations,
        source_amount: record.amount.clone(),
        beneficiary: beneficiary.to_string(),
        amount,
        role,
        lookup_index: format!("{}{}", record.sap_code, beneficiary),
        personnel_no: beneficiary.to_string(),
        correlation_id: record.correlation_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::normalizer::correlation_id;
    use bigdecimal::Zero;
    use std::str::FromStr;

    fn record(amount: &str) -> NormalizedCommission {
        NormalizedCommission {
            entry_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 3),
            sap_code: "T012".to_string(),
            first_use_flag: 1,
            campaign: "CAMP1".to_string(),
            operations: 2,
            seller_code: "V100".to_string(),
            cosigner_code: "V205".to_string(),
            amount: BigDecimal::from_str(amount).unwrap(),
            correlation_id: correlation_id(),
        }
    }

    fn share() -> BigDecimal {
        BigDecimal::from_str("0.20").unwrap()
    }

    #[test]
    fn example_amount_splits_without_rounding_gap() {
        let (seller, cosigner) = split(&record("1234.56"), &share());
        assert_eq!(seller.amount, BigDecimal::from_str("246.91").unwrap());
        assert_eq!(cosigner.amount, BigDecimal::from_str("987.65").unwrap());
        assert_eq!(
            &seller.amount + &cosigner.amount,
            BigDecimal::from_str("1234.56").unwrap()
        );
    }

    #[test]
    fn shares_always_sum_to_rounded_original() {
        for amount in ["0", "0.01", "0.03", "0.05", "10.99", "333.33", "999999.99"] {
            let rec = record(amount);
            let (seller, cosigner) = split(&rec, &share());
            let total = &seller.amount + &cosigner.amount;
            assert_eq!(total, scale2(&rec.amount), "amount {amount}");
        }
    }

    #[test]
    fn zero_amount_splits_to_two_zeros() {
        let (seller, cosigner) = split(&record("0"), &share());
        assert!(seller.amount.is_zero());
        assert!(cosigner.amount.is_zero());
    }

    #[test]
    fn split_carries_roles_beneficiaries_and_audit_fields() {
        let rec = record("100.00");
        let (seller, cosigner) = split(&rec, &share());

        assert_eq!(seller.role, Role::Seller);
        assert_eq!(seller.beneficiary, "V100");
        assert_eq!(cosigner.role, Role::Cosigner);
        assert_eq!(cosigner.beneficiary, "V205");

        for half in [&seller, &cosigner] {
            assert_eq!(half.correlation_id, rec.correlation_id);
            assert_eq!(half.source_amount, rec.amount);
            assert_eq!(half.personnel_no, half.beneficiary);
            assert_eq!(half.lookup_index, format!("T012{}", half.beneficiary));
        }
    }

    #[test]
    fn batch_produces_two_ordered_rows_per_record() {
        let records: Vec<_> = (0..25).map(|_| record("50.00")).collect();
        let splits = split_batch(&records, &share());
        assert_eq!(splits.len(), 50);

        for pair in splits.chunks(2) {
            assert_eq!(pair[0].correlation_id, pair[1].correlation_id);
            assert_eq!(pair[0].role, Role::Seller);
            assert_eq!(pair[1].role, Role::Cosigner);
        }
        let mut ids: Vec<_> = splits.iter().map(|s| s.correlation_id.clone()).collect();
        let sorted = {
            let mut v = ids.clone();
            v.sort();
            v
        };
        assert_eq!(ids, sorted);
        ids.dedup();
        assert_eq!(ids.len(), 25);
    }
}
