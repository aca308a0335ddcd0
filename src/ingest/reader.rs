use calamine::{open_workbook_auto, Data, Reader};
use indexmap::IndexMap;
use std::path::Path;

use crate::error::SyncError;

/// 原始行: 规范化列名 -> 原始文本值, 保留文件中的列顺序
pub type RawRow = IndexMap<String, String>;

/// 按扩展名自动识别格式读取表格文件
///
/// CSV 以 `;` 分隔; Excel 取第一个工作表。所有值以文本形式返回,
/// 类型转换留给各任务的规范化边界。
pub fn read_tabular(path: &Path) -> Result<Vec<RawRow>, SyncError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => read_csv(path),
        "xls" | "xlsx" => read_first_sheet(path),
        other => Err(SyncError::UnsupportedExtension(other.to_string())),
    }
}

/// 读取指定名称的工作表 (按名称去空白、不区分大小写匹配)
pub fn read_sheet(path: &Path, sheet: &str) -> Result<Vec<RawRow>, SyncError> {
    let mut workbook = open_workbook_auto(path)?;
    let wanted = sheet.trim().to_lowercase();
    let name = workbook
        .sheet_names()
        .iter()
        .find(|n| n.trim().to_lowercase() == wanted)
        .cloned()
        .ok_or_else(|| SyncError::MissingSheet {
            file: path.to_path_buf(),
            sheet: sheet.to_string(),
        })?;

    let range = workbook.worksheet_range(&name)?;
    Ok(rows_from_range(&range))
}

fn read_csv(path: &Path) -> Result<Vec<RawRow>, SyncError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = record.get(idx).unwrap_or("").to_string();
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn read_first_sheet(path: &Path) -> Result<Vec<RawRow>, SyncError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();
    let Some(name) = sheet_names.first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook.worksheet_range(&name)?;
    Ok(rows_from_range(&range))
}

fn rows_from_range(range: &calamine::Range<Data>) -> Vec<RawRow> {
    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return Vec::new();
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| normalize_header(&cell_to_string(cell)))
        .collect();

    let mut rows = Vec::new();
    for data_row in rows_iter {
        let mut row = RawRow::new();
        for (idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = data_row.get(idx).map(cell_to_string).unwrap_or_default();
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }
    rows
}

/// 单元格统一转文本; 日期单元格落到 `YYYY-MM-DD HH:MM:SS`
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Excel 把整数也存成浮点, 避免 "123.0" 污染代码字段
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => format!("{other}"),
    }
}

/// 列名规范化: 去空白、小写、空格转下划线
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// 校验首行包含全部必需列; 空文件 (零行) 直接通过
pub fn require_columns(rows: &[RawRow], required: &[&str], file: &Path) -> Result<(), SyncError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !first.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SyncError::MissingColumns {
            file: file.to_path_buf(),
            columns: missing,
        })
    }
}
