use indexmap::IndexMap;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::config::RosterConfig;
use crate::db::queries;
use crate::error::SyncError;
use crate::ingest::reader::{require_columns, RawRow};
use crate::ingest::{marker, read_tabular};
use crate::models::EmployeeRecord;

const ROSTER_TABLE: &str = "employee_roster";

/// 源 Excel 的列 (规范化后的列名) → 花名册字段
const COL_SAP: &str = "número_de_personal_(p)";
const COL_NIF: &str = "id_capado";
const COL_STORE: &str = "división_de_personal";
const COL_NAME: &str = "nombre_editado_del_empleado_o_candidato";

/// 花名册同步汇总
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RosterSummary {
    pub inserted: usize,
    pub deleted: usize,
    pub updated: usize,
    /// 源文件自上次同步未变, 整个任务短路
    pub unchanged: bool,
}

/// 集合差同步: 文件是全量快照, 数据库向它看齐
///
/// 标记文件保存上次成功同步时源文件的修改时间; 相同则直接返回。
pub async fn sync_roster(pool: &PgPool, config: &RosterConfig) -> Result<RosterSummary, SyncError> {
    let stamp = marker::file_stamp(&config.excel_path)?;
    if marker::read(&config.marker_path)?.as_deref() == Some(stamp.as_str()) {
        tracing::info!("源文件自上次执行未变化, 不更新");
        return Ok(RosterSummary {
            unchanged: true,
            ..RosterSummary::default()
        });
    }

    tracing::info!("从 Excel 加载花名册...");
    let file_records = read_roster_file(config)?;

    tracing::info!("从数据库加载当前花名册...");
    let db_records = queries::fetch_roster(pool, ROSTER_TABLE).await?;

    let diff = diff_roster(&file_records, &db_records);

    if !diff.deletes.is_empty() {
        tracing::info!("删除 {} 条已不在文件中的记录...", diff.deletes.len());
        for sap_code in &diff.deletes {
            queries::delete_employee(pool, ROSTER_TABLE, sap_code).await?;
        }
    }

    if !diff.updates.is_empty() {
        tracing::info!("更新 {} 条 NIF 或门店变化的记录...", diff.updates.len());
        for record in &diff.updates {
            queries::update_employee(pool, ROSTER_TABLE, record).await?;
        }
    }

    if !diff.inserts.is_empty() {
        tracing::info!("插入 {} 条新记录...", diff.inserts.len());
        for record in &diff.inserts {
            queries::insert_employee(pool, ROSTER_TABLE, record).await?;
        }
    }

    marker::write(&config.marker_path, &stamp)?;

    let summary = RosterSummary {
        inserted: diff.inserts.len(),
        deleted: diff.deletes.len(),
        updated: diff.updates.len(),
        unchanged: false,
    };
    tracing::info!(
        "同步完成: 插入 {} / 删除 {} / 更新 {}",
        summary.inserted,
        summary.deleted,
        summary.updated
    );
    Ok(summary)
}

/// 文件与数据库的集合差
#[derive(Debug, Default)]
pub struct RosterDiff {
    pub inserts: Vec<EmployeeRecord>,
    pub deletes: Vec<String>,
    pub updates: Vec<EmployeeRecord>,
}

/// 纯对比: 文件有而库没有 → 插入; 库有而文件没有 → 删除;
/// 两边都有但 masked_nif 或 store_code 不同 → 更新 (调店也要同步)。
/// 保持文件中的出现顺序。
pub fn diff_roster(
    file_records: &IndexMap<String, EmployeeRecord>,
    db_records: &[EmployeeRecord],
) -> RosterDiff {
    let db_by_sap: HashMap<&str, &EmployeeRecord> = db_records
        .iter()
        .map(|r| (r.sap_code.as_str(), r))
        .collect();

    let mut diff = RosterDiff::default();
    for (sap_code, record) in file_records {
        match db_by_sap.get(sap_code.as_str()) {
            None => diff.inserts.push(record.clone()),
            Some(existing)
                if existing.masked_nif != record.masked_nif
                    || existing.store_code != record.store_code =>
            {
                diff.updates.push(record.clone())
            }
            Some(_) => {}
        }
    }
    for record in db_records {
        if !file_records.contains_key(&record.sap_code) {
            diff.deletes.push(record.sap_code.clone());
        }
    }
    diff
}

fn read_roster_file(config: &RosterConfig) -> Result<IndexMap<String, EmployeeRecord>, SyncError> {
    let rows = read_tabular(&config.excel_path)?;
    require_columns(
        &rows,
        &[COL_SAP, COL_NIF, COL_STORE, COL_NAME],
        &config.excel_path,
    )?;

    let mut records = IndexMap::with_capacity(rows.len());
    for row in &rows {
        let record = roster_record(row);
        if record.sap_code.is_empty() {
            continue;
        }
        // 同一 SAP 重复出现时保留最后一行
        records.insert(record.sap_code.clone(), record);
    }
    Ok(records)
}

fn roster_record(row: &RawRow) -> EmployeeRecord {
    let field = |name: &str| row.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
    EmployeeRecord {
        // SAP 编号去掉前导零, 与数据库侧保持一致
        sap_code: field(COL_SAP).trim_start_matches('0').to_string(),
        masked_nif: field(COL_NIF),
        store_code: field(COL_STORE),
        full_name: field(COL_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(sap: &str, nif: &str) -> EmployeeRecord {
        EmployeeRecord {
            sap_code: sap.to_string(),
            masked_nif: nif.to_string(),
            store_code: "S1".to_string(),
            full_name: "X".to_string(),
        }
    }

    fn file_map(records: Vec<EmployeeRecord>) -> IndexMap<String, EmployeeRecord> {
        records.into_iter().map(|r| (r.sap_code.clone(), r)).collect()
    }

    #[test]
    fn empty_database_inserts_everything() {
        let file = file_map(vec![employee("1", "A"), employee("2", "B")]);
        let diff = diff_roster(&file, &[]);
        assert_eq!(diff.inserts.len(), 2);
        assert!(diff.deletes.is_empty());
        assert!(diff.updates.is_empty());
    }

    #[test]
    fn diff_classifies_insert_delete_update() {
        let file = file_map(vec![
            employee("1", "A"),  // 未变
            employee("2", "B2"), // NIF 变了
            employee("4", "D"),  // 新增
        ]);
        let db = vec![employee("1", "A"), employee("2", "B"), employee("3", "C")];

        let diff = diff_roster(&file, &db);
        assert_eq!(
            diff.inserts.iter().map(|r| r.sap_code.as_str()).collect::<Vec<_>>(),
            vec!["4"]
        );
        assert_eq!(diff.deletes, vec!["3"]);
        assert_eq!(
            diff.updates.iter().map(|r| r.sap_code.as_str()).collect::<Vec<_>>(),
            vec!["2"]
        );
    }

    #[test]
    fn store_transfer_with_same_nif_is_an_update() {
        let mut moved = employee("1", "A");
        moved.store_code = "S9".to_string();
        let diff = diff_roster(&file_map(vec![moved]), &[employee("1", "A")]);
        assert!(diff.inserts.is_empty());
        assert!(diff.deletes.is_empty());
        assert_eq!(diff.updates.len(), 1);
        assert_eq!(diff.updates[0].store_code, "S9");
    }

    #[test]
    fn identical_sets_produce_no_work() {
        let records = vec![employee("1", "A"), employee("2", "B")];
        let diff = diff_roster(&file_map(records.clone()), &records);
        assert!(diff.inserts.is_empty());
        assert!(diff.deletes.is_empty());
        assert!(diff.updates.is_empty());
    }

    #[test]
    fn roster_record_strips_leading_zeros() {
        let mut row = RawRow::new();
        row.insert(COL_SAP.to_string(), "0004211".to_string());
        row.insert(COL_NIF.to_string(), "XX123".to_string());
        row.insert(COL_STORE.to_string(), "T01".to_string());
        row.insert(COL_NAME.to_string(), "GARCIA, ANA".to_string());
        let record = roster_record(&row);
        assert_eq!(record.sap_code, "4211");
        assert_eq!(record.masked_nif, "XX123");
    }
}
