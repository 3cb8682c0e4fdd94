// ==========================================
// 生产日志看板 - 应用状态
// ==========================================
// 职责: 组装本地缓存、远端存储、同步器与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::ProductionApi;
use crate::config::config_manager::ConfigManager;
use crate::db::open_and_migrate;
use crate::i18n;
use crate::repository::{
    local_cache::{LocalCache, SqliteLocalCache},
    remote_store::{InMemoryDocumentStore, RemoteStore},
    sync_log_repo::SyncLogRepository,
};
use crate::sync::reconciler::{Reconciler, ReconcilerOptions};

/// 应用状态
///
/// 持有共享连接上的各仓储、同步器与 API 实例
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 同步审计日志
    pub sync_log_repo: Arc<SyncLogRepository>,

    /// 远端文档存储
    pub remote_store: Arc<dyn RemoteStore>,

    /// 同步器
    pub reconciler: Reconciler,

    /// 生产记录 API
    pub production_api: Arc<ProductionApi>,
}

impl AppState {
    /// 使用进程内文档存储创建应用状态
    pub async fn new(db_path: String) -> Result<Self, String> {
        Self::with_remote_store(db_path, Arc::new(InMemoryDocumentStore::new())).await
    }

    /// 使用指定远端存储创建应用状态
    ///
    /// # 说明
    /// 1. 打开数据库并建表
    /// 2. 读取配置（云同步开关、存储键、语言）
    /// 3. 从本地缓存加载数据集，云同步开启时建立订阅
    pub async fn with_remote_store(
        db_path: String,
        remote_store: Arc<dyn RemoteStore>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 共享连接
        let conn = open_and_migrate(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let cloud_enabled = config_manager
            .is_cloud_sync_enabled()
            .map_err(|e| format!("读取云同步配置失败: {}", e))?;
        let document_key = config_manager
            .remote_document_key()
            .map_err(|e| format!("读取云端文档键失败: {}", e))?;
        let storage_key = config_manager
            .local_storage_key()
            .map_err(|e| format!("读取本地缓存键失败: {}", e))?;
        match config_manager.locale() {
            Ok(locale) => i18n::set_locale(&locale),
            Err(e) => tracing::warn!("读取语言配置失败(使用默认语言): {}", e),
        }

        // ==========================================
        // 仓储
        // ==========================================
        let local_cache: Arc<dyn LocalCache> = Arc::new(
            SqliteLocalCache::from_connection(conn.clone(), storage_key)
                .map_err(|e| format!("无法创建SqliteLocalCache: {}", e))?,
        );
        let sync_log_repo = Arc::new(SyncLogRepository::new(conn.clone()));
        match config_manager
            .sync_log_retention()
            .and_then(|keep| sync_log_repo.prune(keep))
        {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "已清理过期同步日志"),
            Err(e) => tracing::warn!("清理同步日志失败: {}", e),
        }

        // ==========================================
        // 同步器与 API
        // ==========================================
        let reconciler = Reconciler::new(
            local_cache,
            remote_store.clone(),
            ReconcilerOptions {
                document_key,
                cloud_enabled,
                sync_log: Some(sync_log_repo.clone()),
            },
        );
        if cloud_enabled && !remote_store.is_durable() {
            tracing::warn!("云同步已开启，但远端为进程内存储，退出后云端数据不保留");
        }
        reconciler.start().await;

        let production_api = Arc::new(ProductionApi::new(reconciler.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config_manager,
            sync_log_repo,
            remote_store,
            reconciler,
            production_api,
        })
    }

    /// 开关云同步并持久化设置
    pub async fn set_cloud_enabled(&self, enabled: bool) -> Result<(), String> {
        self.config_manager
            .set_cloud_sync_enabled(enabled)
            .map_err(|e| format!("保存云同步配置失败: {}", e))?;
        self.reconciler.set_cloud_enabled(enabled).await;
        Ok(())
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 PRODUCTION_LOGBOOK_DB_PATH，否则使用用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PRODUCTION_LOGBOOK_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./production_logbook.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("production-logbook-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("production-logbook");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("production_logbook.db");
        }
    }

    path.to_string_lossy().to_string()
}
