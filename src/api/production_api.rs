// ==========================================
// 生产日志看板 - 生产记录 API
// ==========================================
// 职责: 面向界面/CLI 的日记录维护、指标查询、备份与恢复
// 架构: API 层 → Reconciler（写入）/ Engine（计算）
// 约束: 所有写入都经由 Reconciler.save，本地写完即返回
// ==========================================

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::config_record::ConfigRecord;
use crate::domain::dataset::{Dataset, Entry, CONFIG_KEY};
use crate::domain::metrics::MetricsResult;
use crate::domain::production::{DayRecord, ProductionRecord};
use crate::domain::sync::{Snapshot, SyncState};
use crate::domain::types::MachineType;
use crate::engine::day_summary::{DaySummary, DaySummaryEngine};
use crate::engine::metrics::MetricsEngine;
use crate::sync::reconciler::Reconciler;

// ==========================================
// ProductionApi - 生产记录 API
// ==========================================
pub struct ProductionApi {
    reconciler: Reconciler,
    metrics_engine: MetricsEngine,
    summary_engine: DaySummaryEngine,
}

impl ProductionApi {
    /// 创建新的 ProductionApi 实例
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler,
            metrics_engine: MetricsEngine::new(),
            summary_engine: DaySummaryEngine::new(),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn sync_status(&self) -> SyncState {
        self.reconciler.status()
    }

    // ==========================================
    // 日记录查询
    // ==========================================

    /// 读取日记录；不存在时返回空记录（首次保存时才落盘）
    pub fn day_record(&self, date: NaiveDate, machine_type: MachineType) -> DayRecord {
        self.reconciler
            .dataset()
            .day_record(date, machine_type)
            .cloned()
            .unwrap_or_else(|| DayRecord::new(date, machine_type))
    }

    /// 已有日记录的键（升序）
    pub fn list_day_keys(&self) -> Vec<String> {
        self.reconciler
            .dataset()
            .day_records()
            .map(DayRecord::key)
            .collect()
    }

    // ==========================================
    // 日记录维护
    // ==========================================

    /// 追加一行，返回行下标
    pub fn append_row(
        &self,
        date: NaiveDate,
        machine_type: MachineType,
        row: ProductionRecord,
    ) -> ApiResult<usize> {
        warn_if_inconsistent(&row);
        let mut record = self.day_record(date, machine_type);
        let index = record.push_row(row);
        self.persist_day(record)?;
        Ok(index)
    }

    /// 替换指定行
    pub fn update_row(
        &self,
        date: NaiveDate,
        machine_type: MachineType,
        index: usize,
        row: ProductionRecord,
    ) -> ApiResult<()> {
        warn_if_inconsistent(&row);
        let mut record = self.day_record(date, machine_type);
        if !record.update_row(index, row) {
            return Err(row_not_found(&record, index));
        }
        self.persist_day(record)
    }

    /// 删除指定行，返回被删除的行
    pub fn remove_row(
        &self,
        date: NaiveDate,
        machine_type: MachineType,
        index: usize,
    ) -> ApiResult<ProductionRecord> {
        let mut record = self.day_record(date, machine_type);
        let removed = record
            .remove_row(index)
            .ok_or_else(|| row_not_found(&record, index))?;
        self.persist_day(record)?;
        Ok(removed)
    }

    /// 设置白班/夜班班长
    pub fn set_supervisors(
        &self,
        date: NaiveDate,
        machine_type: MachineType,
        day_supervisor: &str,
        night_supervisor: &str,
    ) -> ApiResult<()> {
        let mut record = self.day_record(date, machine_type);
        record.day_supervisor = day_supervisor.trim().to_string();
        record.night_supervisor = night_supervisor.trim().to_string();
        self.persist_day(record)
    }

    fn persist_day(&self, record: DayRecord) -> ApiResult<()> {
        let key = record.key();
        // 云端写入在后台完成，结果体现在同步状态中
        self.reconciler.save(&key, Entry::Day(record))?;
        Ok(())
    }

    // ==========================================
    // 指标
    // ==========================================

    /// 日记录逐行指标（与行顺序一致）
    pub fn row_metrics(&self, date: NaiveDate, machine_type: MachineType) -> Vec<MetricsResult> {
        let record = self.day_record(date, machine_type);
        self.metrics_engine.compute_batch(&record.rows)
    }

    pub fn day_summary(&self, date: NaiveDate, machine_type: MachineType) -> DaySummary {
        let record = self.day_record(date, machine_type);
        self.summary_engine.summarize(&record)
    }

    // ==========================================
    // 配置记录
    // ==========================================

    pub fn config_record(&self) -> ConfigRecord {
        self.reconciler
            .dataset()
            .config()
            .cloned()
            .unwrap_or_default()
    }

    pub fn save_config(&self, config: ConfigRecord) -> ApiResult<()> {
        if let Some(dup) = first_duplicate(config.products.iter().map(|p| p.name.trim())) {
            return Err(ApiError::InvalidInput(format!("产品名称重复: {}", dup)));
        }
        self.reconciler.save(CONFIG_KEY, Entry::Config(config))?;
        Ok(())
    }

    /// 按产品名带出产品参数
    pub fn fill_from_product(&self, row: &mut ProductionRecord, product_name: &str) -> ApiResult<()> {
        let config = self.config_record();
        let product = config
            .find_product(product_name)
            .ok_or_else(|| ApiError::NotFound(format!("产品 {} 不在配置中", product_name)))?;
        row.apply_product(product);
        Ok(())
    }

    // ==========================================
    // 备份与恢复
    // ==========================================

    pub fn export_snapshot(&self) -> Snapshot {
        self.reconciler.export_snapshot()
    }

    /// 导出为 JSON 文件，返回条目数
    pub fn export_to_file(&self, path: &Path) -> ApiResult<usize> {
        let snapshot = self.export_snapshot();
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| ApiError::InternalError(format!("备份序列化失败: {}", e)))?;
        fs::write(path, json)?;
        info!(path = %path.display(), entries = snapshot.entries.len(), "备份已导出");
        Ok(snapshot.entries.len())
    }

    /// 从 JSON 文本导入（接受备份格式或裸键值映射）
    pub async fn import_from_str(&self, json: &str) -> ApiResult<usize> {
        let snapshot = parse_backup(json)?;
        Ok(self.reconciler.import_snapshot(snapshot).await?)
    }

    /// 从 JSON 文件导入，返回条目数
    pub async fn import_from_file(&self, path: &Path) -> ApiResult<usize> {
        if !path.exists() {
            return Err(ApiError::ImportError(format!("文件不存在: {}", path.display())));
        }
        let json = fs::read_to_string(path)?;
        let count = self.import_from_str(&json).await?;
        info!(path = %path.display(), entries = count, "备份已导入");
        Ok(count)
    }
}

/// 解析备份文本；格式错误在任何修改之前报告
pub fn parse_backup(json: &str) -> ApiResult<Snapshot> {
    match serde_json::from_str::<Snapshot>(json) {
        Ok(snapshot) => Ok(snapshot),
        Err(snapshot_err) => match serde_json::from_str::<Dataset>(json) {
            Ok(entries) => Ok(Snapshot::new(entries)),
            Err(_) => Err(ApiError::ValidationError(format!(
                "备份文件格式错误: {}",
                snapshot_err
            ))),
        },
    }
}

fn warn_if_inconsistent(row: &ProductionRecord) {
    if row.has_inconsistent_counts() {
        warn!(
            achieved = row.achieved_qty,
            rejection = row.rejection_qty,
            startup = row.startup_qty,
            "不良与开机料之和超过实绩，合格数为负"
        );
    }
}

fn row_not_found(record: &DayRecord, index: usize) -> ApiError {
    ApiError::NotFound(format!(
        "{} 第 {} 行不存在（共 {} 行）",
        record.key(),
        index,
        record.rows.len()
    ))
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = std::collections::HashSet::new();
    names.filter(|n| !n.is_empty()).find(|n| !seen.insert(*n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backup_accepts_bare_map() {
        let snapshot = parse_backup(r#"{"config":{"kind":"config"}}"#).unwrap();
        assert_eq!(snapshot.entries.len(), 1);
    }

    #[test]
    fn test_parse_backup_rejects_garbage() {
        let err = parse_backup("not json").unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err = parse_backup(r#"{"config":{"kind":"unknown"}}"#).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_first_duplicate() {
        assert_eq!(first_duplicate(["a", "b", "a"].into_iter()), Some("a"));
        assert_eq!(first_duplicate(["", ""].into_iter()), None);
    }
}
