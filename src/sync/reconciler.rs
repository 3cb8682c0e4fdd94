// ==========================================
// 生产日志看板 - 离线优先同步器
// ==========================================
// 职责: 每次本地保存与每次云端通知时，判定本地缓存与云端文档
//       谁是权威，并把胜出方传播到另一侧
// ==========================================
// 触发 A (本地保存):
//   1. 更新内存数据集并同步写本地缓存
//   2. 云同步关闭 → 结束
//   3. 否则异步合并写入云端
// 触发 B (云端通知):
//   - 云端非空 + 首个通知 + 本地有数据 → 本地上推（首次加载本地优先）
//   - 云端非空 + 其他情况             → 云端覆盖本地
//   - 云端为空 + 本地有数据           → 本地上推
//   - 两侧皆空                        → 不写任何一侧
// ==========================================

use crate::config::defaults;
use crate::domain::dataset::{check_key, Dataset, DatasetViolation, Entry};
use crate::domain::sync::{
    RemoteDocument, Snapshot, SyncLogEntry, SyncState, SyncTrigger, SNAPSHOT_FORMAT_VERSION,
};
use crate::domain::types::SyncStatus;
use crate::repository::local_cache::{load_cached, store_dataset, CachedDataset, LocalCache};
use crate::repository::remote_store::RemoteStore;
use crate::repository::sync_log_repo::SyncLogRepository;
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::status::StatusPublisher;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

// ==========================================
// RemoteOutcome - 云端通知的判定结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    LocalWonFirstLoad,      // 首次加载，本地上推
    RemoteApplied,          // 云端覆盖本地
    LocalRepopulatedRemote, // 云端为空，本地上推
    BothEmpty,              // 两侧皆空
    Ignored,                // 云同步已关闭
}

impl RemoteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteOutcome::LocalWonFirstLoad => "LOCAL_WON_FIRST_LOAD",
            RemoteOutcome::RemoteApplied => "REMOTE_APPLIED",
            RemoteOutcome::LocalRepopulatedRemote => "LOCAL_REPOPULATED_REMOTE",
            RemoteOutcome::BothEmpty => "BOTH_EMPTY",
            RemoteOutcome::Ignored => "IGNORED",
        }
    }
}

impl fmt::Display for RemoteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// ReconcilerOptions - 构造参数
// ==========================================
#[derive(Clone)]
pub struct ReconcilerOptions {
    pub document_key: String,
    pub cloud_enabled: bool,
    pub sync_log: Option<Arc<SyncLogRepository>>,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            document_key: defaults::REMOTE_DOCUMENT_KEY.to_string(),
            cloud_enabled: defaults::CLOUD_SYNC_ENABLED,
            sync_log: None,
        }
    }
}

// ==========================================
// Reconciler - 同步器
// ==========================================
// 克隆开销低，所有克隆共享同一状态
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<ReconcilerInner>,
}

struct ReconcilerInner {
    local: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteStore>,
    document_key: String,
    status: StatusPublisher,
    core: Mutex<CoreState>,
    sync_log: Option<Arc<SyncLogRepository>>,
}

struct CoreState {
    dataset: Dataset,
    first_snapshot_seen: bool,
    subscription: Option<JoinHandle<()>>,
}

impl Reconciler {
    /// 创建同步器并从本地缓存加载数据集
    ///
    /// 本地缓存内容无法解析时以空数据集启动。
    /// 不会自动订阅云端，需调用 `start`。
    pub fn new(
        local: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteStore>,
        options: ReconcilerOptions,
    ) -> Self {
        let (dataset, local_status) = match load_cached(local.as_ref()) {
            Ok(cached) => (cached.into_dataset(), SyncStatus::Success),
            Err(e) => {
                warn!(error = %e, "本地缓存读取失败，以空数据集启动");
                (Dataset::new(), SyncStatus::Error)
            }
        };

        let mut initial = SyncState::initial(options.cloud_enabled);
        initial.local_status = local_status;

        info!(
            entries = dataset.len(),
            cloud_enabled = options.cloud_enabled,
            document_key = %options.document_key,
            "同步器已初始化"
        );

        Self {
            inner: Arc::new(ReconcilerInner {
                local,
                remote,
                document_key: options.document_key,
                status: StatusPublisher::new(initial),
                core: Mutex::new(CoreState {
                    dataset,
                    first_snapshot_seen: false,
                    subscription: None,
                }),
                sync_log: options.sync_log,
            }),
        }
    }

    /// 云同步开启时建立订阅
    pub async fn start(&self) {
        if self.is_cloud_enabled() {
            self.attach_subscription().await;
        }
    }

    /// 断开订阅（进程退出前调用）
    pub fn shutdown(&self) {
        self.detach_subscription();
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn status(&self) -> SyncState {
        self.inner.status.snapshot()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncState> {
        self.inner.status.subscribe()
    }

    pub fn is_cloud_enabled(&self) -> bool {
        self.inner.status.snapshot().cloud_enabled
    }

    pub fn document_key(&self) -> &str {
        &self.inner.document_key
    }

    /// 内存数据集副本
    pub fn dataset(&self) -> Dataset {
        self.core().dataset.clone()
    }

    pub fn entry(&self, key: &str) -> Option<Entry> {
        self.core().dataset.get(key).cloned()
    }

    fn core(&self) -> MutexGuard<'_, CoreState> {
        self.inner
            .core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ==========================================
    // 触发 A: 本地保存
    // ==========================================

    /// 保存一个条目
    ///
    /// 本地写入同步完成后立即返回；云端写入在后台进行。
    /// 返回的句柄仅供需要等待云端结果的调用方使用。
    pub fn save(&self, key: &str, entry: Entry) -> SyncResult<Option<JoinHandle<()>>> {
        if let Some(reason) = check_key(key, &entry) {
            return Err(SyncError::Validation {
                violations: vec![DatasetViolation {
                    key: key.to_string(),
                    reason,
                }],
            });
        }

        let dataset = self.write_local(key, entry);
        Ok(self.spawn_push(dataset, SyncTrigger::LocalSave))
    }

    /// 保存并等待云端写入结束
    pub async fn save_and_sync(&self, key: &str, entry: Entry) -> SyncResult<()> {
        if let Some(handle) = self.save(key, entry)? {
            if let Err(e) = handle.await {
                warn!(error = %e, "云端写入任务异常结束");
            }
        }
        Ok(())
    }

    /// 手动重试: 将内存数据集再次推送到云端
    pub async fn resync(&self) -> SyncResult<()> {
        if !self.is_cloud_enabled() {
            self.inner
                .status
                .update(|s| s.cloud_status = SyncStatus::Disabled);
            return Ok(());
        }
        self.inner
            .status
            .update(|s| s.cloud_status = SyncStatus::Syncing);
        self.run_push(self.dataset(), SyncTrigger::ManualResync).await
    }

    /// 更新内存并写本地缓存；写失败只影响 local_status
    fn write_local(&self, key: &str, entry: Entry) -> Dataset {
        let dataset = {
            let mut core = self.core();
            core.dataset.insert(key, entry);
            core.dataset.clone()
        };

        let local_status = match store_dataset(self.inner.local.as_ref(), &dataset) {
            Ok(()) => SyncStatus::Success,
            Err(e) => {
                warn!(key, error = %e, "本地缓存写入失败，仅保留内存数据");
                SyncStatus::Error
            }
        };
        self.inner.status.update(|s| s.local_status = local_status);
        dataset
    }

    fn spawn_push(&self, dataset: Dataset, trigger: SyncTrigger) -> Option<JoinHandle<()>> {
        if !self.is_cloud_enabled() {
            self.inner
                .status
                .update(|s| s.cloud_status = SyncStatus::Disabled);
            return None;
        }

        self.inner
            .status
            .update(|s| s.cloud_status = SyncStatus::Syncing);
        let this = self.clone();
        Some(tokio::spawn(async move {
            let _ = this.run_push(dataset, trigger).await;
        }))
    }

    /// 合并写入云端并结算状态（无自动重试）
    async fn run_push(&self, dataset: Dataset, trigger: SyncTrigger) -> SyncResult<()> {
        match self.upload(&dataset).await {
            Ok(synced_at) => {
                self.settle_cloud_success(Some(synced_at));
                debug!(trigger = %trigger, entries = dataset.len(), "云端写入完成");
                self.record(trigger, "PUSHED", dataset.len(), None);
                Ok(())
            }
            Err(e) => {
                self.mark_cloud_error();
                warn!(trigger = %trigger, error = %e, "云端写入失败");
                self.record(trigger, "PUSH_FAILED", dataset.len(), Some(e.to_string()));
                Err(e)
            }
        }
    }

    async fn upload(&self, dataset: &Dataset) -> SyncResult<DateTime<Utc>> {
        let now = Utc::now();
        self.inner
            .remote
            .merge_upsert(&self.inner.document_key, dataset, now)
            .await?;
        Ok(now)
    }

    // ==========================================
    // 触发 B: 云端通知
    // ==========================================

    /// 处理一次云端文档通知
    #[instrument(skip(self, remote), fields(remote_entries = remote.as_ref().map(|d| d.entries.len()).unwrap_or(0)))]
    pub async fn handle_remote_snapshot(
        &self,
        remote: Option<RemoteDocument>,
    ) -> SyncResult<RemoteOutcome> {
        if !self.is_cloud_enabled() {
            debug!("云同步已关闭，忽略云端通知");
            return Ok(RemoteOutcome::Ignored);
        }

        self.inner
            .status
            .update(|s| s.cloud_status = SyncStatus::Syncing);
        let first_load = !self.core().first_snapshot_seen;

        let result = self.reconcile_remote(remote, first_load).await;

        self.core().first_snapshot_seen = true;
        self.inner.status.update(|s| s.first_snapshot_seen = true);

        match &result {
            Ok(outcome) => {
                info!(outcome = %outcome, first_load, "云端通知处理完成");
                self.record(SyncTrigger::RemoteSnapshot, outcome.as_str(), self.core().dataset.len(), None);
            }
            Err(e) => {
                self.mark_cloud_error();
                warn!(error = %e, first_load, "云端通知处理失败");
                self.record(
                    SyncTrigger::RemoteSnapshot,
                    "FAILED",
                    0,
                    Some(e.to_string()),
                );
            }
        }
        result
    }

    async fn reconcile_remote(
        &self,
        remote: Option<RemoteDocument>,
        first_load: bool,
    ) -> SyncResult<RemoteOutcome> {
        let cached = load_cached(self.inner.local.as_ref())?;
        let remote = remote.filter(|doc| !doc.is_empty());

        match (remote, cached) {
            // 首次加载且本地有数据: 本地优先，丢弃云端内容
            (Some(_), CachedDataset::Present(local)) if first_load => {
                let synced_at = self.upload(&local).await?;
                self.settle_cloud_success(Some(synced_at));
                Ok(RemoteOutcome::LocalWonFirstLoad)
            }
            // 稳态: 云端覆盖本地
            (Some(document), _) => {
                document
                    .entries
                    .validate()
                    .map_err(|violations| SyncError::Validation { violations })?;
                self.replace_local(&document.entries)?;
                self.inner.status.update(|s| {
                    s.local_status = SyncStatus::Success;
                    s.cloud_status = SyncStatus::Success;
                    s.last_sync_timestamp = document.last_sync.or(s.last_sync_timestamp);
                });
                Ok(RemoteOutcome::RemoteApplied)
            }
            // 云端为空: 用本地数据重建
            (None, CachedDataset::Present(local)) => {
                let synced_at = self.upload(&local).await?;
                self.settle_cloud_success(Some(synced_at));
                Ok(RemoteOutcome::LocalRepopulatedRemote)
            }
            (None, CachedDataset::Empty | CachedDataset::Malformed(_)) => {
                self.settle_cloud_success(None);
                Ok(RemoteOutcome::BothEmpty)
            }
        }
    }

    /// 整体替换本地缓存与内存数据集；写失败时两者都不变
    fn replace_local(&self, dataset: &Dataset) -> SyncResult<()> {
        if let Err(e) = store_dataset(self.inner.local.as_ref(), dataset) {
            self.inner
                .status
                .update(|s| s.local_status = SyncStatus::Error);
            return Err(e.into());
        }
        self.core().dataset = dataset.clone();
        Ok(())
    }

    fn settle_cloud_success(&self, synced_at: Option<DateTime<Utc>>) {
        self.inner.status.update(|s| {
            if s.cloud_enabled {
                s.cloud_status = SyncStatus::Success;
                if synced_at.is_some() {
                    s.last_sync_timestamp = synced_at;
                }
            }
        });
    }

    fn mark_cloud_error(&self) {
        self.inner.status.update(|s| {
            if s.cloud_enabled {
                s.cloud_status = SyncStatus::Error;
            }
        });
    }

    // ==========================================
    // 云同步开关与订阅
    // ==========================================

    /// 开启/关闭云同步
    ///
    /// 关闭: 断开订阅，cloud_status = disabled
    /// 开启: 重置首次通知标记并重新订阅，订阅后立即收到当前文档
    pub async fn set_cloud_enabled(&self, enabled: bool) {
        self.detach_subscription();

        if !enabled {
            self.inner.status.update(|s| {
                s.cloud_enabled = false;
                s.cloud_status = SyncStatus::Disabled;
            });
            info!("云同步已关闭");
            self.record(SyncTrigger::Toggle, "CLOUD_DISABLED", 0, None);
            return;
        }

        self.core().first_snapshot_seen = false;
        self.inner.status.update(|s| {
            s.cloud_enabled = true;
            s.first_snapshot_seen = false;
            s.cloud_status = SyncStatus::Syncing;
        });
        info!("云同步已开启");
        self.record(SyncTrigger::Toggle, "CLOUD_ENABLED", 0, None);
        self.attach_subscription().await;
    }

    async fn attach_subscription(&self) {
        match self.inner.remote.subscribe(&self.inner.document_key).await {
            Ok(mut stream) => {
                let this = self.clone();
                let handle = tokio::spawn(async move {
                    while let Some(item) = stream.next().await {
                        match item {
                            Ok(document) => {
                                let _ = this.handle_remote_snapshot(document).await;
                            }
                            Err(e) => {
                                this.mark_cloud_error();
                                warn!(error = %e, "云端订阅推送错误");
                            }
                        }
                    }
                    debug!("云端订阅已结束");
                });
                let previous = self.core().subscription.replace(handle);
                if let Some(previous) = previous {
                    previous.abort();
                }
                debug!(document_key = %self.inner.document_key, "云端订阅已建立");
            }
            Err(e) => {
                self.mark_cloud_error();
                warn!(error = %e, "云端订阅失败");
                self.record(SyncTrigger::Toggle, "SUBSCRIBE_FAILED", 0, Some(e.to_string()));
            }
        }
    }

    fn detach_subscription(&self) {
        let previous = self.core().subscription.take();
        if let Some(handle) = previous {
            handle.abort();
        }
    }

    // ==========================================
    // 备份与恢复
    // ==========================================

    /// 导出当前内存数据集
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::new(self.dataset())
    }

    /// 导入备份，完全替换本地缓存、内存数据集与（开启时）云端文档
    ///
    /// 校验失败时不做任何修改。返回导入的条目数。
    pub async fn import_snapshot(&self, snapshot: Snapshot) -> SyncResult<usize> {
        if snapshot.format_version == 0 || snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(SyncError::UnsupportedFormat {
                found: snapshot.format_version,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        snapshot
            .entries
            .validate()
            .map_err(|violations| SyncError::Validation { violations })?;

        let entries = snapshot.entries;
        let count = entries.len();
        self.replace_local(&entries)?;
        self.inner
            .status
            .update(|s| s.local_status = SyncStatus::Success);

        if self.is_cloud_enabled() {
            self.inner
                .status
                .update(|s| s.cloud_status = SyncStatus::Syncing);
            let now = Utc::now();
            let document = RemoteDocument::new(entries, now);
            match self
                .inner
                .remote
                .replace_document(&self.inner.document_key, document)
                .await
            {
                Ok(()) => self.settle_cloud_success(Some(now)),
                Err(e) => {
                    self.mark_cloud_error();
                    warn!(error = %e, "导入后云端替换失败");
                    self.record(SyncTrigger::Import, "REMOTE_REPLACE_FAILED", count, Some(e.to_string()));
                    return Ok(count);
                }
            }
        }

        info!(entries = count, "备份已导入");
        self.record(SyncTrigger::Import, "IMPORTED", count, None);
        Ok(count)
    }

    // ==========================================
    // 审计日志
    // ==========================================

    fn record(&self, trigger: SyncTrigger, outcome: &str, entry_count: usize, detail: Option<String>) {
        let Some(repo) = &self.inner.sync_log else {
            return;
        };
        let mut entry = SyncLogEntry::new(trigger, outcome, &self.status(), entry_count);
        if let Some(detail) = detail {
            entry = entry.with_detail(detail);
        }
        if let Err(e) = repo.insert(&entry) {
            warn!(error = %e, "同步日志写入失败");
        }
    }
}
