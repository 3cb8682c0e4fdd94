// ==========================================
// 生产日志看板 - 远端文档存储
// ==========================================
// 固定文档键下的单一文档 {entries, last_sync}
// - merge_upsert: 键级合并 entries，保留未涉及的键
// - replace_document: 整体替换（仅用于导入）
// - subscribe: 先推送当前文档，之后每次变化推送一次
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::sync::RemoteDocument;
use crate::repository::error::{RemoteResult, RemoteStoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// 文档通知流
pub type DocumentStream = BoxStream<'static, RemoteResult<Option<RemoteDocument>>>;

// ==========================================
// RemoteStore trait
// ==========================================
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 读取当前文档；不存在时返回 None
    async fn fetch_document(&self, document_key: &str) -> RemoteResult<Option<RemoteDocument>>;

    /// 合并写入: entries 中的键覆盖远端同名键，并更新 last_sync
    async fn merge_upsert(
        &self,
        document_key: &str,
        entries: &Dataset,
        last_sync: DateTime<Utc>,
    ) -> RemoteResult<()>;

    /// 整体替换文档
    async fn replace_document(&self, document_key: &str, document: RemoteDocument) -> RemoteResult<()>;

    /// 订阅文档变化；流的第一项为订阅时的当前文档
    async fn subscribe(&self, document_key: &str) -> RemoteResult<DocumentStream>;

    /// 进程退出后文档是否仍然保留
    fn is_durable(&self) -> bool {
        true
    }
}

// ==========================================
// InMemoryDocumentStore - 进程内文档存储
// ==========================================
// 克隆后共享同一份数据，可模拟多个客户端连接同一后端
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    documents: Mutex<HashMap<String, watch::Sender<Option<RemoteDocument>>>>,
    fail_writes: AtomicBool,
    fail_subscribe: AtomicBool,
    write_count: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> RemoteResult<MutexGuard<'_, HashMap<String, watch::Sender<Option<RemoteDocument>>>>> {
        self.inner
            .documents
            .lock()
            .map_err(|e| RemoteStoreError::Unavailable(e.to_string()))
    }

    /// 获取（必要时创建）文档通道
    fn channel(&self, document_key: &str) -> RemoteResult<watch::Sender<Option<RemoteDocument>>> {
        let mut documents = self.documents()?;
        let sender = documents
            .entry(document_key.to_string())
            .or_insert_with(|| watch::channel(None).0);
        Ok(sender.clone())
    }

    fn check_writable(&self) -> RemoteResult<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            Err(RemoteStoreError::Unavailable("网络不可用".to_string()))
        } else {
            Ok(())
        }
    }

    /// 后续写入失败
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 后续订阅失败
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.inner.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// 成功写入次数（merge_upsert + replace_document）
    pub fn write_count(&self) -> usize {
        self.inner.write_count.load(Ordering::SeqCst)
    }

    /// 直接读取当前文档（不经过网络语义）
    pub fn peek(&self, document_key: &str) -> Option<RemoteDocument> {
        self.documents()
            .ok()
            .and_then(|docs| docs.get(document_key).and_then(|tx| tx.borrow().clone()))
    }

    /// 预置文档（不计入写次数），同样通知订阅者
    pub fn seed(&self, document_key: &str, document: Option<RemoteDocument>) -> RemoteResult<()> {
        self.channel(document_key)?.send_replace(document);
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryDocumentStore {
    async fn fetch_document(&self, document_key: &str) -> RemoteResult<Option<RemoteDocument>> {
        Ok(self.peek(document_key))
    }

    async fn merge_upsert(
        &self,
        document_key: &str,
        entries: &Dataset,
        last_sync: DateTime<Utc>,
    ) -> RemoteResult<()> {
        self.check_writable()?;
        let sender = self.channel(document_key)?;
        sender.send_modify(|current| {
            let document = current.get_or_insert_with(RemoteDocument::default);
            document.entries.merge_from(entries);
            document.last_sync = Some(last_sync);
        });
        self.inner.write_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(document_key, entries = entries.len(), "远端文档已合并写入");
        Ok(())
    }

    async fn replace_document(&self, document_key: &str, document: RemoteDocument) -> RemoteResult<()> {
        self.check_writable()?;
        let entries = document.entries.len();
        self.channel(document_key)?.send_replace(Some(document));
        self.inner.write_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(document_key, entries, "远端文档已整体替换");
        Ok(())
    }

    async fn subscribe(&self, document_key: &str) -> RemoteResult<DocumentStream> {
        if self.inner.fail_subscribe.load(Ordering::SeqCst) {
            return Err(RemoteStoreError::PermissionDenied("订阅被拒绝".to_string()));
        }
        let receiver = self.channel(document_key)?.subscribe();

        let stream = stream::unfold((receiver, true), |(mut receiver, first)| async move {
            if !first && receiver.changed().await.is_err() {
                return None;
            }
            let document = receiver.borrow_and_update().clone();
            Some((Ok(document), (receiver, false)))
        });
        Ok(stream.boxed())
    }

    fn is_durable(&self) -> bool {
        false
    }
}
