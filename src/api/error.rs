// ==========================================
// 生产日志看板 - API层错误类型
// ==========================================
// 职责: 将仓储/同步层错误转换为面向操作员的错误消息
// ==========================================

use crate::domain::dataset::DatasetViolation;
use crate::repository::error::{RemoteStoreError, RepositoryError};
use crate::sync::error::SyncError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 数据集校验失败（带逐键原因）
    #[error("数据集校验失败: {reason}")]
    DatasetValidationError {
        reason: String,
        violations: Vec<DatasetViolation>,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("本地存储空间不足: {0}")]
    StorageFull(String),

    #[error("云端同步失败: {0}")]
    RemoteError(String),

    #[error("文件读写失败: {0}")]
    IoError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, key } => {
                ApiError::NotFound(format!("{}(key={})不存在", entity, key))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::StorageFull(msg) => ApiError::StorageFull(msg),
            RepositoryError::SerializationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("{}: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

impl From<RemoteStoreError> for ApiError {
    fn from(err: RemoteStoreError) -> Self {
        ApiError::RemoteError(err.to_string())
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Validation { violations } => ApiError::DatasetValidationError {
                reason: format!("{} 个条目与键不一致", violations.len()),
                violations,
            },
            SyncError::UnsupportedFormat { found, supported } => ApiError::ValidationError(
                format!("不支持的备份格式版本: {} (当前支持 {})", found, supported),
            ),
            SyncError::Serialization(msg) => ApiError::ValidationError(msg),
            SyncError::Local(e) => e.into(),
            SyncError::Remote(e) => e.into(),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::IoError(err.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::IoError(err.to_string())
    }
}

/// API Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_full_is_preserved() {
        let err: ApiError = RepositoryError::StorageFull("quota".to_string()).into();
        assert!(matches!(err, ApiError::StorageFull(_)));
    }

    #[test]
    fn test_sync_validation_keeps_violations() {
        let err: ApiError = SyncError::Validation {
            violations: vec![DatasetViolation {
                key: "x".to_string(),
                reason: "bad".to_string(),
            }],
        }
        .into();
        match err {
            ApiError::DatasetValidationError { violations, .. } => assert_eq!(violations.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
