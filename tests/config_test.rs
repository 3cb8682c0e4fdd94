// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 配置持久化、默认值与存储键对本地缓存的影响
// ==========================================

mod test_helpers;

use production_logbook::app::AppState;
use production_logbook::config::{config_keys, defaults, ConfigManager};
use production_logbook::domain::{MachineType, SyncLogEntry, SyncState, SyncTrigger};
use production_logbook::repository::{RepositoryError, SyncLogRepository};
use test_helpers::{create_test_db, date, open_shared_connection, scenario_row};

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_values_persist_across_instances() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    {
        let config = ConfigManager::new(&db_path).unwrap();
        config.set_config_value(config_keys::LOCALE, "en").unwrap();
        config.set_cloud_sync_enabled(true).unwrap();
    }

    let config = ConfigManager::new(&db_path).unwrap();
    assert_eq!(config.locale().unwrap(), "en");
    assert!(config.is_cloud_sync_enabled().unwrap());
    assert_eq!(
        config.local_storage_key().unwrap(),
        defaults::LOCAL_STORAGE_KEY
    );
}

#[tokio::test]
async fn test_rejects_unknown_key_and_bad_bool() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).unwrap();

    let err = config.set_config_value("no_such_key", "1").unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));

    let err = config
        .set_config_value(config_keys::CLOUD_SYNC_ENABLED, "maybe")
        .unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));

    let err = config
        .set_config_value(config_keys::SYNC_LOG_RETENTION, "0")
        .unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));
}

#[tokio::test]
async fn test_snapshot_contains_effective_values() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).unwrap();
    config
        .set_config_value(config_keys::REMOTE_DOCUMENT_KEY, "line_b")
        .unwrap();

    let snapshot: serde_json::Value =
        serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
    assert_eq!(snapshot[config_keys::REMOTE_DOCUMENT_KEY], "line_b");
    assert_eq!(snapshot[config_keys::CLOUD_SYNC_ENABLED], "false");
    assert_eq!(snapshot[config_keys::LOCALE], defaults::LOCALE);
    assert_eq!(
        snapshot[config_keys::SYNC_LOG_RETENTION],
        defaults::SYNC_LOG_RETENTION.to_string()
    );
}

#[tokio::test]
async fn test_storage_key_selects_local_dataset() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let day = date(2024, 4, 1);

    {
        let state = AppState::new(db_path.clone()).await.unwrap();
        state
            .production_api
            .append_row(day, MachineType::IM, scenario_row())
            .unwrap();
        state
            .config_manager
            .set_config_value(config_keys::LOCAL_STORAGE_KEY, "line_b_data")
            .unwrap();
    }

    // 新存储键下为空数据集
    let state = AppState::new(db_path.clone()).await.unwrap();
    assert!(state.production_api.list_day_keys().is_empty());

    state
        .config_manager
        .set_config_value(config_keys::LOCAL_STORAGE_KEY, defaults::LOCAL_STORAGE_KEY)
        .unwrap();
    drop(state);

    let state = AppState::new(db_path).await.unwrap();
    assert_eq!(state.production_api.list_day_keys(), vec!["2024-04-01_IM".to_string()]);
}

#[tokio::test]
async fn test_sync_log_pruned_to_retention_on_startup() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    {
        let repo = SyncLogRepository::new(open_shared_connection(&db_path).unwrap());
        let state = SyncState::initial(true);
        for _ in 0..6 {
            repo.insert(&SyncLogEntry::new(SyncTrigger::RemoteSnapshot, "REMOTE_APPLIED", &state, 1))
                .unwrap();
        }
        let config = ConfigManager::new(&db_path).unwrap();
        config
            .set_config_value(config_keys::SYNC_LOG_RETENTION, "2")
            .unwrap();
    }

    let state = AppState::new(db_path).await.unwrap();
    assert_eq!(state.config_manager.sync_log_retention().unwrap(), 2);
    assert_eq!(
        state
            .sync_log_repo
            .count_by_trigger(SyncTrigger::RemoteSnapshot)
            .unwrap(),
        2
    );
}
