use crate::error::SyncError;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    /// 从环境变量加载; DATABASE_URL 缺失则任务在触碰任何文件/连接之前终止
    pub fn from_env() -> Result<Self, SyncError> {
        Ok(Self {
            url: required("DATABASE_URL")?,
        })
    }
}

/// 佣金拆分业务参数
#[derive(Debug, Clone)]
pub struct CommissionPolicy {
    /// 卖方分成比例 (待审批改为 0.40)
    pub seller_share: BigDecimal,
    /// 平衡校验失败是否视为致命
    pub strict_balance: bool,
    /// 快照装载: 块大小与块间暂停
    pub snapshot_chunk_size: usize,
    pub snapshot_pause: Duration,
    /// 历史装载: 块更大, 带暂停限流共享库
    pub history_chunk_size: usize,
    pub history_pause: Duration,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            seller_share: BigDecimal::from_str("0.20").unwrap(),
            strict_balance: false,
            snapshot_chunk_size: 500,
            snapshot_pause: Duration::ZERO,
            history_chunk_size: 1000,
            history_pause: Duration::from_secs(5),
        }
    }
}

impl CommissionPolicy {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            seller_share: std::env::var("SELLER_SHARE_FRACTION")
                .ok()
                .and_then(|v| BigDecimal::from_str(v.trim()).ok())
                .unwrap_or(default.seller_share),
            strict_balance: std::env::var("BALANCE_STRICT")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(default.strict_balance),
            snapshot_chunk_size: env_usize("SNAPSHOT_CHUNK_SIZE", default.snapshot_chunk_size),
            snapshot_pause: env_pause_secs("SNAPSHOT_PAUSE_SECS", default.snapshot_pause),
            history_chunk_size: env_usize("HISTORY_CHUNK_SIZE", default.history_chunk_size),
            history_pause: env_pause_secs("HISTORY_PAUSE_SECS", default.history_pause),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

fn env_pause_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// 佣金任务配置 (当期快照 + 历史两个入口共用)
#[derive(Debug, Clone)]
pub struct CommissionConfig {
    pub folder: PathBuf,
    pub policy: CommissionPolicy,
}

impl CommissionConfig {
    pub fn from_env() -> Result<Self, SyncError> {
        Ok(Self {
            folder: required_path("COMMISSION_FOLDER")?,
            policy: CommissionPolicy::from_env(),
        })
    }
}

/// 花名册同步配置
#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub excel_path: PathBuf,
    /// 记录上次成功同步时源文件修改时间的标记文件
    pub marker_path: PathBuf,
}

impl RosterConfig {
    pub fn from_env() -> Result<Self, SyncError> {
        Ok(Self {
            excel_path: required_path("ROSTER_XLSX_PATH")?,
            marker_path: std::env::var("ROSTER_MARKER_PATH")
                .map(|v| PathBuf::from(strip_quotes(&v)))
                .unwrap_or_else(|_| PathBuf::from("logs/roster_sync.log")),
        })
    }
}

/// 月度融资数据同步配置
#[derive(Debug, Clone)]
pub struct MonthlyConfig {
    pub folder: PathBuf,
}

impl MonthlyConfig {
    pub fn from_env() -> Result<Self, SyncError> {
        Ok(Self {
            folder: required_path("MONTHLY_FOLDER")?,
        })
    }
}

/// 销售目标同步配置
#[derive(Debug, Clone)]
pub struct TargetsConfig {
    pub folder: PathBuf,
}

impl TargetsConfig {
    pub fn from_env() -> Result<Self, SyncError> {
        Ok(Self {
            folder: required_path("TARGETS_FOLDER")?,
        })
    }
}

/// 门店产能同步配置
#[derive(Debug, Clone)]
pub struct ProductionConfig {
    pub excel_path: PathBuf,
}

impl ProductionConfig {
    pub fn from_env() -> Result<Self, SyncError> {
        Ok(Self {
            excel_path: required_path("PRODUCTION_XLSX_PATH")?,
        })
    }
}

fn required(name: &'static str) -> Result<String, SyncError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(strip_quotes(&v)),
        _ => Err(SyncError::MissingEnv(name)),
    }
}

fn required_path(name: &'static str) -> Result<PathBuf, SyncError> {
    required(name).map(PathBuf::from)
}

/// .env 里的路径常被双引号包裹
fn strip_quotes(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}
