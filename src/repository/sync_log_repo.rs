// ==========================================
// 生产日志看板 - 同步审计日志仓储
// ==========================================
// 记录每次同步判定的分支与结果
// 写入失败由调用方降级为告警，不影响同步状态
// ==========================================

use crate::domain::sync::{SyncLogEntry, SyncTrigger};
use crate::domain::types::SyncStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SyncLogRepository - 同步日志仓储
// ==========================================
pub struct SyncLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SyncLogRepository {
    /// 创建新的同步日志仓储（调用方负责建表）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入一条日志，返回 log_id
    pub fn insert(&self, entry: &SyncLogEntry) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sync_log (
                log_id, trigger_kind, outcome, local_status, cloud_status,
                entry_count, detail, logged_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                entry.log_id,
                entry.trigger.as_str(),
                entry.outcome,
                entry.local_status.as_str(),
                entry.cloud_status.as_str(),
                entry.entry_count as i64,
                entry.detail,
                entry.logged_at.to_rfc3339(),
            ],
        )?;
        Ok(entry.log_id.clone())
    }

    /// 最近的日志（新到旧）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<SyncLogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, trigger_kind, outcome, local_status, cloud_status,
                   entry_count, detail, logged_at
            FROM sync_log
            ORDER BY logged_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], map_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 按触发来源统计条数
    pub fn count_by_trigger(&self, trigger: SyncTrigger) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sync_log WHERE trigger_kind = ?1",
            params![trigger.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 保留最近 keep 条，删除其余
    pub fn prune(&self, keep: usize) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let removed = conn.execute(
            r#"
            DELETE FROM sync_log WHERE log_id NOT IN (
                SELECT log_id FROM sync_log ORDER BY logged_at DESC, rowid DESC LIMIT ?1
            )
            "#,
            params![keep as i64],
        )?;
        Ok(removed)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<SyncLogEntry> {
    let trigger: String = row.get(1)?;
    let local_status: String = row.get(3)?;
    let cloud_status: String = row.get(4)?;
    let entry_count: i64 = row.get(5)?;
    let logged_at: String = row.get(7)?;

    Ok(SyncLogEntry {
        log_id: row.get(0)?,
        trigger: SyncTrigger::from_code(&trigger).unwrap_or(SyncTrigger::RemoteSnapshot),
        outcome: row.get(2)?,
        local_status: SyncStatus::from_code(&local_status).unwrap_or(SyncStatus::Error),
        cloud_status: SyncStatus::from_code(&cloud_status).unwrap_or(SyncStatus::Error),
        entry_count: entry_count.max(0) as usize,
        detail: row.get(6)?,
        logged_at: DateTime::parse_from_rfc3339(&logged_at)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
