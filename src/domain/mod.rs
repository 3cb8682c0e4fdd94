// ==========================================
// 生产日志看板 - 领域模型层
// ==========================================
// 职责: 定义值类型、记录、数据集与同步状态
// 约束: 不含数据访问逻辑，不含计算逻辑
// ==========================================

pub mod config_record;
pub mod dataset;
pub mod lenient;
pub mod metrics;
pub mod production;
pub mod sync;
pub mod time_window;
pub mod types;

// 重导出核心类型
pub use config_record::{ConfigRecord, ProductItem};
pub use dataset::{day_key, parse_day_key, Dataset, DatasetViolation, Entry, CONFIG_KEY};
pub use metrics::MetricsResult;
pub use production::{BreakdownEvent, DayRecord, ProductionRecord};
pub use sync::{
    RemoteDocument, Snapshot, SyncLogEntry, SyncState, SyncTrigger, SNAPSHOT_FORMAT_VERSION,
};
pub use time_window::{ClockTime, TimeWindow};
pub use types::{MachineType, Shift, SyncStatus};
