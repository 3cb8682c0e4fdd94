// ==========================================
// 生产日志看板 - 核心库
// ==========================================
// 技术栈: Rust + SQLite（本地缓存）+ 可插拔远端文档存储
// 系统定位: 车间班次产量记录、指标计算与离线优先同步
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与类型
pub mod domain;

// 引擎层 - 指标计算
pub mod engine;

// 数据仓储层 - 本地缓存/远端文档/同步日志
pub mod repository;

// 同步层 - 离线优先同步器
pub mod sync;

// 配置层 - 应用配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 报表导出
pub mod report;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{MachineType, Shift, SyncStatus};

// 领域实体
pub use domain::{
    BreakdownEvent, ConfigRecord, Dataset, DayRecord, Entry, MetricsResult, ProductItem,
    ProductionRecord, Snapshot, SyncState, TimeWindow,
};

// 引擎
pub use engine::{compute_metrics, DaySummary, DaySummaryEngine, MetricsEngine};

// 同步
pub use sync::{Reconciler, ReconcilerOptions, RemoteOutcome};

// API
pub use api::{ApiError, ApiResult, ProductionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产日志看板";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
