// ==========================================
// 生产日志看板 - 仓储层错误类型
// ==========================================
// 覆盖本地缓存（SQLite）与远端文档存储
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 本地仓储错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with key={key}")]
    NotFound { entity: String, key: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("存储空间不足: {0}")]
    StorageFull(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // ===== 数据质量错误 =====
    #[error("序列化失败: {0}")]
    SerializationError(String),

    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref msg)
                if failure.code == rusqlite::ErrorCode::DiskFull =>
            {
                RepositoryError::StorageFull(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                key: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// 远端文档存储错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteStoreError {
    #[error("远端不可达: {0}")]
    Unavailable(String),

    #[error("远端拒绝访问: {0}")]
    PermissionDenied(String),

    #[error("远端文档格式错误: {0}")]
    MalformedDocument(String),

    #[error("订阅已关闭: {0}")]
    SubscriptionClosed(String),
}

/// 远端 Result 类型别名
pub type RemoteResult<T> = Result<T, RemoteStoreError>;
