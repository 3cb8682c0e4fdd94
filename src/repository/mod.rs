// ==========================================
// 生产日志看板 - 数据仓储层
// ==========================================
// 职责: 本地缓存、远端文档存储、同步审计日志
// 约束: 不含同步判定逻辑，所有查询使用参数化
// ==========================================

pub mod error;
pub mod local_cache;
pub mod remote_store;
pub mod sync_log_repo;

// 重导出核心仓储
pub use error::{RemoteResult, RemoteStoreError, RepositoryError, RepositoryResult};
pub use local_cache::{CachedDataset, InMemoryLocalCache, LocalCache, SqliteLocalCache};
pub use remote_store::{DocumentStream, InMemoryDocumentStore, RemoteStore};
pub use sync_log_repo::SyncLogRepository;
