use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;

use crate::error::SyncError;

/// 标记文件里的时间戳格式
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 源文件的修改时间, 格式化成标记文件用的文本
pub fn file_stamp(path: &Path) -> Result<String, SyncError> {
    let modified = fs::metadata(path)?.modified()?;
    let local: DateTime<Local> = modified.into();
    Ok(local.format(STAMP_FORMAT).to_string())
}

/// 读上次成功同步的标记; 文件不存在表示从未同步过
pub fn read(path: &Path) -> Result<Option<String>, SyncError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(content.trim().to_string()))
}

/// 仅在任务成功结束后写入
pub fn write(path: &Path, stamp: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, stamp)?;
    Ok(())
}
