// ==========================================
// 生产日志看板 - 同步层
// ==========================================
// 职责: 本地缓存与云端文档之间的离线优先同步
// 约束: 本地缓存的所有修改都经由 Reconciler
// ==========================================

pub mod error;
pub mod reconciler;
pub mod status;

pub use error::{SyncError, SyncResult};
pub use reconciler::{Reconciler, ReconcilerOptions, RemoteOutcome};
pub use status::StatusPublisher;
