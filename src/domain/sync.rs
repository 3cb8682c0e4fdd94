// ==========================================
// 生产日志看板 - 同步相关领域模型
// ==========================================
// SyncState: 进程内同步状态（不持久化，仅由 Reconciler 修改）
// RemoteDocument: 云端单文档形态
// Snapshot: 备份文件形态
// ==========================================

use super::dataset::Dataset;
use super::types::SyncStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 当前备份文件格式版本
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

// ==========================================
// SyncState - 同步状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub local_status: SyncStatus,
    pub cloud_status: SyncStatus,
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    pub cloud_enabled: bool,
    pub first_snapshot_seen: bool, // 本次订阅是否已收到首个云端通知
}

impl SyncState {
    /// 启动时的初始状态
    pub fn initial(cloud_enabled: bool) -> Self {
        Self {
            local_status: SyncStatus::Success,
            cloud_status: if cloud_enabled {
                SyncStatus::Syncing
            } else {
                SyncStatus::Disabled
            },
            last_sync_timestamp: None,
            cloud_enabled,
            first_snapshot_seen: false,
        }
    }
}

// ==========================================
// RemoteDocument - 云端文档
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    #[serde(default)]
    pub entries: Dataset,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

impl RemoteDocument {
    pub fn new(entries: Dataset, last_sync: DateTime<Utc>) -> Self {
        Self {
            entries,
            last_sync: Some(last_sync),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// Snapshot - 备份文件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub entries: Dataset,
}

impl Snapshot {
    pub fn new(entries: Dataset) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: Utc::now(),
            entries,
        }
    }
}

// ==========================================
// SyncTrigger - 同步触发来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncTrigger {
    LocalSave,      // 本地保存
    RemoteSnapshot, // 云端通知
    ManualResync,   // 手动重试
    Import,         // 导入备份
    Toggle,         // 开关云同步
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::LocalSave => "LOCAL_SAVE",
            SyncTrigger::RemoteSnapshot => "REMOTE_SNAPSHOT",
            SyncTrigger::ManualResync => "MANUAL_RESYNC",
            SyncTrigger::Import => "IMPORT",
            SyncTrigger::Toggle => "TOGGLE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LOCAL_SAVE" => Some(SyncTrigger::LocalSave),
            "REMOTE_SNAPSHOT" => Some(SyncTrigger::RemoteSnapshot),
            "MANUAL_RESYNC" => Some(SyncTrigger::ManualResync),
            "IMPORT" => Some(SyncTrigger::Import),
            "TOGGLE" => Some(SyncTrigger::Toggle),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// SyncLogEntry - 同步审计日志
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub log_id: String,
    pub trigger: SyncTrigger,
    pub outcome: String,        // 分支/结果，如 LOCAL_WON_FIRST_LOAD
    pub local_status: SyncStatus,
    pub cloud_status: SyncStatus,
    pub entry_count: usize,     // 涉及的数据集条目数
    pub detail: Option<String>, // 失败原因等
    pub logged_at: DateTime<Utc>,
}

impl SyncLogEntry {
    pub fn new(trigger: SyncTrigger, outcome: impl Into<String>, state: &SyncState, entry_count: usize) -> Self {
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            trigger,
            outcome: outcome.into(),
            local_status: state.local_status,
            cloud_status: state.cloud_status,
            entry_count,
            detail: None,
            logged_at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
