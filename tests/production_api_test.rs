// ==========================================
// ProductionApi 集成测试
// ==========================================
// 测试目标: 通过 AppState 组装的完整链路（SQLite 本地缓存）
// ==========================================

mod test_helpers;

use production_logbook::api::ApiError;
use production_logbook::app::AppState;
use production_logbook::domain::{ConfigRecord, MachineType, ProductItem, Shift, SyncTrigger};
use production_logbook::report::write_day_report_file;
use production_logbook::SyncStatus;
use tempfile::TempDir;
use test_helpers::{create_test_db, date, sample_row, scenario_row};

async fn new_state(db_path: &str) -> AppState {
    AppState::new(db_path.to_string())
        .await
        .expect("Failed to create AppState")
}

#[tokio::test]
async fn test_row_lifecycle() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = new_state(&db_path).await;
    let api = &state.production_api;
    let day = date(2024, 3, 1);

    let first = api.append_row(day, MachineType::IM, scenario_row()).unwrap();
    let second = api
        .append_row(day, MachineType::IM, sample_row(Shift::Night, "20:00", "08:00", 2000))
        .unwrap();
    assert_eq!((first, second), (0, 1));
    assert_eq!(api.list_day_keys(), vec!["2024-03-01_IM".to_string()]);

    let mut edited = scenario_row();
    edited.achieved_qty = 2400;
    api.update_row(day, MachineType::IM, 0, edited).unwrap();
    assert_eq!(api.row_metrics(day, MachineType::IM)[0].lost_qty, 0);

    let removed = api.remove_row(day, MachineType::IM, 1).unwrap();
    assert_eq!(removed.shift, Shift::Night);
    assert_eq!(api.day_record(day, MachineType::IM).rows.len(), 1);

    let err = api.remove_row(day, MachineType::IM, 5).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    assert_eq!(api.sync_status().local_status, SyncStatus::Success);
    assert_eq!(api.sync_status().cloud_status, SyncStatus::Disabled);
}

#[tokio::test]
async fn test_missing_day_is_empty_until_saved() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = new_state(&db_path).await;
    let api = &state.production_api;

    let record = api.day_record(date(2024, 5, 5), MachineType::BM);
    assert!(record.rows.is_empty());
    assert!(api.list_day_keys().is_empty());
    assert!(api.row_metrics(date(2024, 5, 5), MachineType::BM).is_empty());
}

#[tokio::test]
async fn test_data_survives_restart() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let day = date(2024, 3, 2);
    {
        let state = new_state(&db_path).await;
        state
            .production_api
            .append_row(day, MachineType::BM, scenario_row())
            .unwrap();
        state
            .production_api
            .set_supervisors(day, MachineType::BM, "  Chen ", "Li")
            .unwrap();
        state.reconciler.shutdown();
    }

    let state = new_state(&db_path).await;
    let record = state.production_api.day_record(day, MachineType::BM);
    assert_eq!(record.rows.len(), 1);
    assert_eq!(record.day_supervisor, "Chen");
    assert_eq!(record.supervisor(Shift::Night), "Li");

    let summary = state.production_api.day_summary(day, MachineType::BM);
    assert_eq!(summary.total.accepted_qty, 2130);
}

#[tokio::test]
async fn test_config_record_and_product_fill() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = new_state(&db_path).await;
    let api = &state.production_api;

    let product = ProductItem {
        name: "Bottle 500ml".to_string(),
        unit_weight_grams: 22.5,
        rate_per_hour: 90.0,
        cavities: 4,
        cycle_time_seconds: 12.0,
    };
    let mut config = ConfigRecord::default();
    config.products = vec![product.clone(), product.clone()];
    let err = api.save_config(config.clone()).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    config.products.pop();
    api.save_config(config).unwrap();
    assert_eq!(api.config_record().products.len(), 1);

    let mut row = sample_row(Shift::Day, "08:00", "09:00", 0);
    api.fill_from_product(&mut row, " Bottle 500ml ").unwrap();
    assert_eq!(row.cavities, 4);
    assert_eq!(row.unit_weight_grams, 22.5);

    let err = api.fill_from_product(&mut row, "Unknown").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_export_and_import_files() {
    let (_source_file, source_db) = create_test_db().unwrap();
    let (_target_file, target_db) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let backup = dir.path().join("backup.json");

    let source = new_state(&source_db).await;
    source
        .production_api
        .append_row(date(2024, 3, 3), MachineType::IM, scenario_row())
        .unwrap();
    source.production_api.save_config(ConfigRecord::default()).unwrap();
    assert_eq!(source.production_api.export_to_file(&backup).unwrap(), 2);

    let target = new_state(&target_db).await;
    target
        .production_api
        .append_row(date(2024, 9, 9), MachineType::BM, scenario_row())
        .unwrap();
    let count = target.production_api.import_from_file(&backup).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        target.reconciler.dataset(),
        source.reconciler.dataset(),
        "导入完全替换目标数据"
    );
    assert_eq!(target.sync_log_repo.count_by_trigger(SyncTrigger::Import).unwrap(), 1);

    let err = target
        .production_api
        .import_from_file(&dir.path().join("missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ImportError(_)));
}

#[tokio::test]
async fn test_cloud_toggle_persists_setting() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    {
        let state = new_state(&db_path).await;
        assert!(!state.remote_store.is_durable(), "默认云端为进程内存储");
        state.set_cloud_enabled(true).await.unwrap();
        assert!(state.reconciler.is_cloud_enabled());
        state.reconciler.shutdown();
    }

    let state = new_state(&db_path).await;
    assert!(state.config_manager.is_cloud_sync_enabled().unwrap());
    assert!(state.reconciler.is_cloud_enabled());

    state.set_cloud_enabled(false).await.unwrap();
    assert_eq!(state.production_api.sync_status().cloud_status, SyncStatus::Disabled);
}

#[tokio::test]
async fn test_day_report_file() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("report.csv");

    let state = new_state(&db_path).await;
    let api = &state.production_api;
    let day = date(2024, 3, 4);
    api.append_row(day, MachineType::IM, scenario_row()).unwrap();

    let record = api.day_record(day, MachineType::IM);
    let summary = api.day_summary(day, MachineType::IM);
    write_day_report_file(&out, &record, &summary).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.contains("91.7"));
}
