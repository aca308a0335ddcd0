use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// 可处理的文件扩展名
pub const VALID_EXTENSIONS: &[&str] = &["csv", "xls", "xlsx"];

/// 列出文件夹中可处理的文件, 按文件名排序保证运行顺序稳定
pub fn discover(folder: &Path) -> Result<Vec<PathBuf>, SyncError> {
    discover_with_extensions(folder, VALID_EXTENSIONS)
}

/// 仅 Excel 文件 (目标任务的源只接受工作簿)
pub fn discover_spreadsheets(folder: &Path) -> Result<Vec<PathBuf>, SyncError> {
    discover_with_extensions(folder, &["xls", "xlsx"])
}

fn discover_with_extensions(folder: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, SyncError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if extensions.contains(&ext.as_str()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// 把处理完的文件移动到同级子文件夹; 重跑时覆盖同名旧档
pub fn archive(path: &Path, subfolder: &str) -> Result<PathBuf, SyncError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let archive_dir = parent.join(subfolder);
    fs::create_dir_all(&archive_dir)?;

    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let destination = archive_dir.join(file_name);

    if destination.exists() {
        fs::remove_file(&destination)?;
    }
    fs::rename(path, &destination)?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("finance-sync-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn discover_filters_and_sorts() {
        let dir = temp_dir("discover");
        for name in ["b.csv", "a.xlsx", "notes.txt", "c.XLS"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        let files = discover(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.xlsx", "b.csv", "c.XLS"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn archive_overwrites_previous_copy() {
        let dir = temp_dir("archive");
        let source = dir.join("batch.csv");
        fs::write(&source, b"new").unwrap();
        let old = dir.join("procesados").join("batch.csv");
        fs::create_dir_all(old.parent().unwrap()).unwrap();
        fs::write(&old, b"old").unwrap();

        let moved = archive(&source, "procesados").unwrap();
        assert_eq!(moved, old);
        assert_eq!(fs::read(&moved).unwrap(), b"new");
        assert!(!source.exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
