// ==========================================
// 生产日志看板 - 引擎层
// ==========================================
// 职责: 产量指标与日汇总计算
// 约束: 纯计算，不访问存储，不触发同步
// ==========================================

pub mod day_summary;
pub mod metrics;

// 重导出核心引擎
pub use day_summary::{CategoryLoss, DaySummary, DaySummaryEngine, ShiftTotals};
pub use metrics::{compute_metrics, MetricsEngine};
