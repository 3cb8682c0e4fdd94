// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成、同步器组装等功能
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use production_logbook::db::open_and_migrate;
use production_logbook::domain::{
    BreakdownEvent, Dataset, DayRecord, MachineType, ProductionRecord, Shift, TimeWindow,
};
use production_logbook::repository::{
    InMemoryDocumentStore, InMemoryLocalCache, SyncLogRepository,
};
use production_logbook::sync::{Reconciler, ReconcilerOptions};
use rusqlite::Connection;
use tempfile::NamedTempFile;

/// 测试用云端文档键
pub const TEST_DOC: &str = "test_logbook";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();
    open_and_migrate(&db_path)?;
    Ok((temp_file, db_path))
}

/// 打开测试连接（共享）
pub fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_and_migrate(db_path)?)))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 标准测试行: 每小时 100 × 2 模腔，单重 10 g
pub fn sample_row(shift: Shift, start: &str, end: &str, achieved: i64) -> ProductionRecord {
    let mut row = ProductionRecord::new(shift, TimeWindow::parse(start, end));
    row.machine = "IM-01".to_string();
    row.product = "Cap 28mm".to_string();
    row.rate_per_hour = 100.0;
    row.cavities = 2;
    row.unit_weight_grams = 10.0;
    row.achieved_qty = achieved;
    row
}

/// 白班 12 小时，停机 30 分钟，实绩 2200，不良 50，开机料 20
pub fn scenario_row() -> ProductionRecord {
    let mut row = sample_row(Shift::Day, "08:00", "20:00", 2200);
    row.rejection_qty = 50;
    row.startup_qty = 20;
    row.breakdowns.push(BreakdownEvent::new(
        "Mould",
        TimeWindow::parse("10:00", "10:30"),
    ));
    row
}

/// 带一行数据的日记录
pub fn sample_day(day: u32, machine_type: MachineType, supervisor: &str) -> DayRecord {
    let mut record = DayRecord::new(date(2024, 3, day), machine_type);
    record.day_supervisor = supervisor.to_string();
    record.push_row(sample_row(Shift::Day, "08:00", "20:00", 2000));
    record
}

/// 由若干日记录组成的数据集
pub fn dataset_of(records: Vec<DayRecord>) -> Dataset {
    let mut dataset = Dataset::new();
    for record in records {
        dataset.upsert(record.into());
    }
    dataset
}

/// 本地缓存预置为给定数据集
pub fn cache_with(dataset: &Dataset) -> Arc<InMemoryLocalCache> {
    Arc::new(InMemoryLocalCache::with_raw(
        serde_json::to_string(dataset).unwrap(),
    ))
}

/// 组装同步器（不建立订阅）
pub fn build_reconciler(
    local: Arc<InMemoryLocalCache>,
    remote: &InMemoryDocumentStore,
    cloud_enabled: bool,
) -> Reconciler {
    build_reconciler_with_log(local, remote, cloud_enabled, None)
}

pub fn build_reconciler_with_log(
    local: Arc<InMemoryLocalCache>,
    remote: &InMemoryDocumentStore,
    cloud_enabled: bool,
    sync_log: Option<Arc<SyncLogRepository>>,
) -> Reconciler {
    Reconciler::new(
        local,
        Arc::new(remote.clone()),
        ReconcilerOptions {
            document_key: TEST_DOC.to_string(),
            cloud_enabled,
            sync_log,
        },
    )
}

/// 反序列化本地缓存当前内容
pub fn cached_dataset(local: &InMemoryLocalCache) -> Dataset {
    use production_logbook::repository::LocalCache;
    match local.read_raw().unwrap() {
        Some(raw) => serde_json::from_str(&raw).unwrap(),
        None => Dataset::new(),
    }
}

/// 轮询直到条件成立或超时（2 秒）
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// 给后台任务留出运行时间
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// 带超时执行
pub async fn with_timeout<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("测试超时")
}
