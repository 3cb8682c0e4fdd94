// ==========================================
// 生产日志看板 - 本地缓存
// ==========================================
// 单一存储键下保存整个数据集的 JSON 文本
// 同步读写；只由 Reconciler 修改
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::dataset::{Dataset, EMPTY_SENTINEL};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// LocalCache trait
// ==========================================
pub trait LocalCache: Send + Sync {
    /// 读取原始 JSON 文本；从未写入时返回 None
    fn read_raw(&self) -> RepositoryResult<Option<String>>;

    /// 覆盖写入
    fn write_raw(&self, value: &str) -> RepositoryResult<()>;

    /// 清空（恢复为未写入）
    fn clear(&self) -> RepositoryResult<()>;
}

/// 本地缓存内容的解读结果
#[derive(Debug, Clone, PartialEq)]
pub enum CachedDataset {
    /// 从未写入或为空对象
    Empty,
    /// 内容无法解析
    Malformed(String),
    /// 有数据
    Present(Dataset),
}

impl CachedDataset {
    /// "有数据": 存在、非空对象且可解析
    pub fn has_data(&self) -> bool {
        matches!(self, CachedDataset::Present(_))
    }

    /// 取出数据集，非 Present 时为空数据集
    pub fn into_dataset(self) -> Dataset {
        match self {
            CachedDataset::Present(dataset) => dataset,
            CachedDataset::Empty | CachedDataset::Malformed(_) => Dataset::new(),
        }
    }
}

/// 解读原始缓存文本
pub fn interpret_raw(raw: Option<&str>) -> CachedDataset {
    let text = match raw.map(str::trim) {
        None => return CachedDataset::Empty,
        Some(t) if t.is_empty() || t == EMPTY_SENTINEL || t == "null" => {
            return CachedDataset::Empty
        }
        Some(t) => t,
    };

    match serde_json::from_str::<Dataset>(text) {
        Ok(dataset) if dataset.is_empty() => CachedDataset::Empty,
        Ok(dataset) => CachedDataset::Present(dataset),
        Err(e) => CachedDataset::Malformed(e.to_string()),
    }
}

/// 读取并解读本地缓存
pub fn load_cached(cache: &dyn LocalCache) -> RepositoryResult<CachedDataset> {
    let raw = cache.read_raw()?;
    let cached = interpret_raw(raw.as_deref());
    if let CachedDataset::Malformed(reason) = &cached {
        tracing::warn!(reason = %reason, "本地缓存内容无法解析，按空数据处理");
    }
    Ok(cached)
}

/// 序列化并写入整个数据集
pub fn store_dataset(cache: &dyn LocalCache, dataset: &Dataset) -> RepositoryResult<()> {
    let raw = serde_json::to_string(dataset)?;
    cache.write_raw(&raw)
}

// ==========================================
// SqliteLocalCache - SQLite 实现
// ==========================================
// 存储: local_store 表，一行对应一个 storage_key
pub struct SqliteLocalCache {
    conn: Arc<Mutex<Connection>>,
    storage_key: String,
}

impl SqliteLocalCache {
    /// 创建本地缓存实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - storage_key: 存储键
    pub fn new(db_path: &str, storage_key: impl Into<String>) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            storage_key: storage_key.into(),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        storage_key: impl Into<String>,
    ) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self {
            conn,
            storage_key: storage_key.into(),
        })
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl LocalCache for SqliteLocalCache {
    fn read_raw(&self) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_store WHERE storage_key = ?1",
                params![self.storage_key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_raw(&self, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO local_store (storage_key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(storage_key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![self.storage_key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn clear(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM local_store WHERE storage_key = ?1",
            params![self.storage_key],
        )?;
        Ok(())
    }
}

// ==========================================
// InMemoryLocalCache - 内存实现
// ==========================================
// 用于测试与无盘运行；可注入写失败
#[derive(Default)]
pub struct InMemoryLocalCache {
    value: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    write_count: AtomicUsize,
}

impl InMemoryLocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定内容初始化（不计入写次数）
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(raw.into())),
            ..Default::default()
        }
    }

    /// 后续写入模拟存储已满
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 成功写入的次数
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    fn slot(&self) -> RepositoryResult<MutexGuard<'_, Option<String>>> {
        self.value
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl LocalCache for InMemoryLocalCache {
    fn read_raw(&self) -> RepositoryResult<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn write_raw(&self, value: &str) -> RepositoryResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::StorageFull("本地存储配额已满".to_string()));
        }
        *self.slot()? = Some(value.to_string());
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> RepositoryResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}
