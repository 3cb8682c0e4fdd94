// ==========================================
// 生产日志看板 - 领域类型定义
// ==========================================
// 班次、机型、同步状态等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 班次 (Shift)
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shift {
    #[default]
    Day,   // 白班
    Night, // 夜班
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Day => "Day",
            Shift::Night => "Night",
        }
    }

    /// 宽松解析（大小写不敏感）
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Shift::Day),
            "night" => Some(Shift::Night),
            _ => None,
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 机型 (Machine Type)
// ==========================================
// IM: 注塑  BM: 吹塑
// 作为日记录键的后缀: "<YYYY-MM-DD>_<IM|BM>"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineType {
    IM,
    BM,
}

impl MachineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineType::IM => "IM",
            MachineType::BM => "BM",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "IM" => Some(MachineType::IM),
            "BM" => Some(MachineType::BM),
            _ => None,
        }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 同步状态 (Sync Status)
// ==========================================
// 本地缓存与云端各持有一个
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Syncing,  // 同步中
    Success,  // 已同步
    Error,    // 失败
    Disabled, // 云同步关闭
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Syncing => "syncing",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
            SyncStatus::Disabled => "disabled",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "syncing" => Some(SyncStatus::Syncing),
            "success" => Some(SyncStatus::Success),
            "error" => Some(SyncStatus::Error),
            "disabled" => Some(SyncStatus::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_type_codes() {
        assert_eq!(MachineType::from_code("im"), Some(MachineType::IM));
        assert_eq!(MachineType::from_code(" BM "), Some(MachineType::BM));
        assert_eq!(MachineType::from_code("XM"), None);
        assert_eq!(MachineType::BM.to_string(), "BM");
    }

    #[test]
    fn test_sync_status_serde() {
        let json = serde_json::to_string(&SyncStatus::Disabled).unwrap();
        assert_eq!(json, "\"disabled\"");
        let parsed: SyncStatus = serde_json::from_str("\"syncing\"").unwrap();
        assert_eq!(parsed, SyncStatus::Syncing);
    }

    #[test]
    fn test_shift_from_code() {
        assert_eq!(Shift::from_code("NIGHT"), Some(Shift::Night));
        assert_eq!(Shift::from_code(""), None);
    }
}
