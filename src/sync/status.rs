// ==========================================
// 生产日志看板 - 同步状态发布
// ==========================================
// 状态只由 Reconciler 修改；界面/CLI 通过 watch 通道订阅
// ==========================================

use crate::domain::sync::SyncState;
use tokio::sync::watch;

pub struct StatusPublisher {
    sender: watch::Sender<SyncState>,
}

impl StatusPublisher {
    pub fn new(initial: SyncState) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self { sender }
    }

    /// 当前状态副本
    pub fn snapshot(&self) -> SyncState {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.sender.subscribe()
    }

    /// 原地修改并通知订阅者，返回修改后的状态
    pub fn update(&self, modify: impl FnOnce(&mut SyncState)) -> SyncState {
        self.sender.send_modify(modify);
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SyncStatus;

    #[tokio::test]
    async fn test_update_notifies_subscribers() {
        let publisher = StatusPublisher::new(SyncState::initial(true));
        let mut receiver = publisher.subscribe();

        let state = publisher.update(|s| s.cloud_status = SyncStatus::Error);
        assert_eq!(state.cloud_status, SyncStatus::Error);

        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow().cloud_status, SyncStatus::Error);
    }
}
