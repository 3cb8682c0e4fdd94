// ==========================================
// 生产日志看板 - 配置管理器
// ==========================================
// 职责: 应用配置加载、查询、覆写
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 配置键
pub mod config_keys {
    pub const CLOUD_SYNC_ENABLED: &str = "cloud_sync_enabled";
    pub const REMOTE_DOCUMENT_KEY: &str = "remote_document_key";
    pub const LOCAL_STORAGE_KEY: &str = "local_storage_key";
    pub const LOCALE: &str = "locale";
    pub const SYNC_LOG_RETENTION: &str = "sync_log_retention";

    /// 允许通过 CLI 修改的键
    pub const ALL: [&str; 5] = [
        CLOUD_SYNC_ENABLED,
        REMOTE_DOCUMENT_KEY,
        LOCAL_STORAGE_KEY,
        LOCALE,
        SYNC_LOG_RETENTION,
    ];
}

/// 默认值
pub mod defaults {
    pub const CLOUD_SYNC_ENABLED: bool = false;
    pub const REMOTE_DOCUMENT_KEY: &str = "production_logbook";
    pub const LOCAL_STORAGE_KEY: &str = "production_logbook_data";
    pub const LOCALE: &str = "zh-CN";
    pub const SYNC_LOG_RETENTION: usize = 5000;
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        if !config_keys::ALL.contains(&key) {
            return Err(RepositoryError::FieldValueError {
                field: key.to_string(),
                message: "未知配置项".to_string(),
            });
        }
        if key == config_keys::CLOUD_SYNC_ENABLED && parse_bool(value).is_none() {
            return Err(RepositoryError::FieldValueError {
                field: key.to_string(),
                message: format!("应为 true/false，实际为 {}", value),
            });
        }
        if key == config_keys::SYNC_LOG_RETENTION && parse_retention(value).is_none() {
            return Err(RepositoryError::FieldValueError {
                field: key.to_string(),
                message: format!("应为正整数，实际为 {}", value),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(key, value, "配置已更新");
        Ok(())
    }

    fn get_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    // ==========================================
    // 类型化读取
    // ==========================================

    /// 云同步是否开启（非法值按默认处理）
    pub fn is_cloud_sync_enabled(&self) -> RepositoryResult<bool> {
        let raw = self.get_config_value(config_keys::CLOUD_SYNC_ENABLED)?;
        Ok(raw
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(defaults::CLOUD_SYNC_ENABLED))
    }

    pub fn set_cloud_sync_enabled(&self, enabled: bool) -> RepositoryResult<()> {
        self.set_config_value(config_keys::CLOUD_SYNC_ENABLED, if enabled { "true" } else { "false" })
    }

    /// 云端文档键
    pub fn remote_document_key(&self) -> RepositoryResult<String> {
        self.get_or_default(config_keys::REMOTE_DOCUMENT_KEY, defaults::REMOTE_DOCUMENT_KEY)
    }

    /// 本地缓存键
    pub fn local_storage_key(&self) -> RepositoryResult<String> {
        self.get_or_default(config_keys::LOCAL_STORAGE_KEY, defaults::LOCAL_STORAGE_KEY)
    }

    pub fn locale(&self) -> RepositoryResult<String> {
        self.get_or_default(config_keys::LOCALE, defaults::LOCALE)
    }

    /// 同步日志保留条数（非法值按默认处理）
    pub fn sync_log_retention(&self) -> RepositoryResult<usize> {
        let raw = self.get_config_value(config_keys::SYNC_LOG_RETENTION)?;
        Ok(raw
            .as_deref()
            .and_then(parse_retention)
            .unwrap_or(defaults::SYNC_LOG_RETENTION))
    }

    /// 生效配置快照（含默认值，JSON）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let mut effective: BTreeMap<&str, String> = BTreeMap::new();
        effective.insert(
            config_keys::CLOUD_SYNC_ENABLED,
            self.is_cloud_sync_enabled()?.to_string(),
        );
        effective.insert(config_keys::REMOTE_DOCUMENT_KEY, self.remote_document_key()?);
        effective.insert(config_keys::LOCAL_STORAGE_KEY, self.local_storage_key()?);
        effective.insert(config_keys::LOCALE, self.locale()?);
        effective.insert(
            config_keys::SYNC_LOG_RETENTION,
            self.sync_log_retention()?.to_string(),
        );

        Ok(serde_json::to_string(&json!(effective))?)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_retention(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = manager();
        assert!(!config.is_cloud_sync_enabled().unwrap());
        assert_eq!(config.remote_document_key().unwrap(), defaults::REMOTE_DOCUMENT_KEY);
        assert_eq!(config.locale().unwrap(), "zh-CN");
    }

    #[test]
    fn test_set_and_override() {
        let config = manager();
        config.set_cloud_sync_enabled(true).unwrap();
        assert!(config.is_cloud_sync_enabled().unwrap());

        config.set_config_value(config_keys::LOCALE, "en").unwrap();
        config.set_config_value(config_keys::LOCALE, "zh-CN").unwrap();
        assert_eq!(config.locale().unwrap(), "zh-CN");
    }

    #[test]
    fn test_rejects_unknown_key_and_bad_bool() {
        let config = manager();
        assert!(config.set_config_value("theme", "dark").is_err());
        assert!(config
            .set_config_value(config_keys::CLOUD_SYNC_ENABLED, "maybe")
            .is_err());
    }

    #[test]
    fn test_snapshot_contains_effective_values() {
        let config = manager();
        let snapshot: serde_json::Value =
            serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot["cloud_sync_enabled"], "false");
        assert_eq!(snapshot["local_storage_key"], defaults::LOCAL_STORAGE_KEY);
    }
}
