use std::path::PathBuf;
use thiserror::Error;

/// 同步任务错误分类
///
/// 仅文件级/任务级失败会走到这里; 单行问题 (无法解析的可选字段、
/// 单条 INSERT 失败) 由各组件计数上报, 不中断批次。
#[derive(Debug, Error)]
pub enum SyncError {
    /// 缺少必需的环境变量, 任务启动前即失败
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    /// 文件扩展名不受支持
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// 文件缺少必需的列
    #[error("file {file} is missing required column(s): {columns:?}")]
    MissingColumns { file: PathBuf, columns: Vec<String> },

    /// 工作簿中找不到指定工作表
    #[error("sheet '{sheet}' not found in {file}")]
    MissingSheet { file: PathBuf, sheet: String },

    /// 目标文件中存在重复的 (sap, month) 组合
    #[error("duplicate (sap, month) combinations in targets file {0}")]
    DuplicateTargetKeys(PathBuf),

    /// 拆分金额与原始金额不平衡 (仅在 strict_balance 开启时致命)
    #[error("split balance mismatch: split total {split_total} != expected {expected}")]
    BalanceMismatch { split_total: String, expected: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),
}
