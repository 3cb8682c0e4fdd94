// ==========================================
// 生产日志看板 - 同步层错误类型
// ==========================================

use crate::domain::dataset::DatasetViolation;
use crate::repository::error::{RemoteStoreError, RepositoryError};
use thiserror::Error;

/// 同步层错误类型
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("数据集校验失败: {}", format_violations(.violations))]
    Validation { violations: Vec<DatasetViolation> },

    #[error("不支持的备份格式版本: {found} (当前支持 {supported})")]
    UnsupportedFormat { found: u32, supported: u32 },

    #[error("序列化失败: {0}")]
    Serialization(String),

    #[error(transparent)]
    Local(#[from] RepositoryError),

    #[error(transparent)]
    Remote(#[from] RemoteStoreError),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

fn format_violations(violations: &[DatasetViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result 类型别名
pub type SyncResult<T> = Result<T, SyncError>;
