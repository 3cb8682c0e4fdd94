// ==========================================
// 生产日志看板 - 配置层
// ==========================================
// 职责: 应用配置管理（云同步开关、存储键、语言）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager};
