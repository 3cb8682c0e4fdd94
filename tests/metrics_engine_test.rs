// ==========================================
// 产量指标引擎 集成测试
// ==========================================
// 测试目标: 计划量/损失/合格数/效率的计算与日汇总
// ==========================================

mod test_helpers;

use production_logbook::domain::{
    BreakdownEvent, DayRecord, MachineType, ProductionRecord, Shift, TimeWindow,
};
use production_logbook::engine::{compute_metrics, DaySummaryEngine, MetricsEngine};
use test_helpers::{date, sample_row, scenario_row};

#[test]
fn test_full_day_window_plan() {
    let row = sample_row(Shift::Day, "08:00", "20:00", 2400);
    let m = compute_metrics(&row);

    assert_eq!(m.duration_minutes, 720);
    assert_eq!(m.plan_qty, 2400);
    assert_eq!(m.lost_qty, 0);
    assert_eq!(m.efficiency_pct, 100.0);
}

#[test]
fn test_night_shift_wraps_midnight() {
    let row = sample_row(Shift::Night, "20:00", "08:00", 2400);
    let m = compute_metrics(&row);

    assert_eq!(m.duration_minutes, 720);
    assert_eq!(m.plan_qty, 2400);
}

#[test]
fn test_documented_scenario() {
    let m = compute_metrics(&scenario_row());

    assert_eq!(m.plan_qty, 2400);
    assert_eq!(m.breakdown_minutes, 30);
    assert_eq!(m.breakdown_lost_qty, 100);
    assert_eq!(m.lost_qty, 200);
    assert_eq!(m.efficiency_loss_qty, 100);
    assert_eq!(m.accepted_qty, 2130);

    assert_eq!(m.plan_kg, 24.0);
    assert_eq!(m.achieved_kg, 22.0);
    assert_eq!(m.lost_kg, 2.0);
    assert_eq!(m.accepted_kg, 21.3);
    assert_eq!(m.efficiency_pct, 91.7);
}

#[test]
fn test_overproduction_yields_negative_loss() {
    let row = sample_row(Shift::Day, "08:00", "20:00", 2500);
    let m = compute_metrics(&row);

    assert_eq!(m.lost_qty, -100);
    assert_eq!(m.lost_kg, -1.0);
    assert!(m.efficiency_pct > 100.0);
}

#[test]
fn test_missing_times_give_zero_plan() {
    let mut row = ProductionRecord::new(Shift::Day, TimeWindow::parse("", "20:00"));
    row.rate_per_hour = 100.0;
    row.cavities = 2;
    row.achieved_qty = 10;
    let m = compute_metrics(&row);

    assert_eq!(m.duration_minutes, 0);
    assert_eq!(m.plan_qty, 0);
    assert_eq!(m.efficiency_pct, 0.0);
    assert_eq!(m.lost_qty, -10);
}

#[test]
fn test_lenient_json_row() {
    let json = r#"{
        "shift": "Day",
        "window": {"start": "08:00", "end": "09:00"},
        "ratePerHour": "60",
        "cavities": null,
        "achievedQty": "abc"
    }"#;
    let row: ProductionRecord = serde_json::from_str(json).unwrap();
    let m = compute_metrics(&row);

    assert_eq!(row.cavities, 0);
    assert_eq!(row.achieved_qty, 0);
    assert_eq!(m.plan_qty, 0);
}

#[test]
fn test_batch_is_deterministic() {
    let rows = vec![scenario_row(), sample_row(Shift::Night, "20:00", "08:00", 2000)];
    let engine = MetricsEngine::new();

    let first = engine.compute_batch(&rows);
    let second = engine.compute_batch(&rows);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0], engine.compute(&rows[0]));
}

#[test]
fn test_day_summary_totals_and_categories() {
    let mut record = DayRecord::new(date(2024, 3, 1), MachineType::IM);
    record.push_row(scenario_row());

    let mut night = sample_row(Shift::Night, "20:00", "08:00", 2000);
    night.breakdowns.push(BreakdownEvent::new("Power", TimeWindow::parse("23:50", "00:50")));
    night.breakdowns.push(BreakdownEvent::new("", TimeWindow::parse("02:00", "02:15")));
    record.push_row(night);

    let summary = DaySummaryEngine::new().summarize(&record);

    assert_eq!(summary.day_shift.plan_qty, 2400);
    assert_eq!(summary.night_shift.plan_qty, 2400);
    assert_eq!(summary.total.plan_qty, 4800);
    assert_eq!(summary.total.achieved_qty, 4200);
    assert_eq!(summary.shift(Shift::Night).achieved_qty, 2000);

    let categories: Vec<&str> = summary
        .breakdown_by_category
        .iter()
        .map(|c| c.category.as_str())
        .collect();
    assert_eq!(categories, vec!["Power", "Mould", "未分类"]);
    assert_eq!(summary.breakdown_by_category[0].minutes, 60);
    assert_eq!(summary.breakdown_by_category[0].lost_qty, 200);
}

#[test]
fn test_extreme_rate_saturates_instead_of_overflowing() {
    let json = r#"{
        "shift": "Day",
        "window": {"start": "08:00", "end": "20:00"},
        "ratePerHour": 1e20,
        "cavities": 1,
        "unitWeightGrams": 10,
        "breakdowns": [
            {"category": "Mould", "window": {"start": "08:00", "end": "19:00"}},
            {"category": "Power", "window": {"start": "09:00", "end": "20:00"}}
        ]
    }"#;
    let row: ProductionRecord = serde_json::from_str(json).unwrap();
    let m = compute_metrics(&row);

    assert_eq!(m.plan_qty, i64::MAX);
    assert_eq!(m.breakdown_lost_qty, i64::MAX);
    assert_eq!(m.breakdown_minutes, 1320);
    assert_eq!(m.lost_qty, i64::MAX);
    assert_eq!(m.efficiency_loss_qty, 0);
    assert!(m.plan_kg.is_finite());

    let mut record = DayRecord::new(date(2024, 3, 1), MachineType::IM);
    record.push_row(row.clone());
    record.push_row(row);
    let summary = DaySummaryEngine::new().summarize(&record);
    assert_eq!(summary.total.plan_qty, i64::MAX);
    assert_eq!(summary.breakdown_by_category[0].lost_qty, i64::MAX);
}

#[test]
fn test_extreme_counts_saturate_accepted_qty() {
    let json = r#"{
        "shift": "Night",
        "window": {"start": "20:00", "end": "08:00"},
        "achievedQty": 5,
        "rejectionQty": "-1e30",
        "startupQty": "1e30"
    }"#;
    let row: ProductionRecord = serde_json::from_str(json).unwrap();
    assert_eq!(row.rejection_qty, i64::MIN);
    assert_eq!(row.startup_qty, i64::MAX);

    let m = compute_metrics(&row);
    // 5 - MIN 饱和为 MAX，再减 MAX 为 0
    assert_eq!(m.accepted_qty, 0);
    assert_eq!(m.lost_qty, -5);

    let mut record = DayRecord::new(date(2024, 3, 1), MachineType::BM);
    record.push_row(row.clone());
    record.push_row(row);
    let summary = DaySummaryEngine::new().summarize(&record);
    assert_eq!(summary.night_shift.rejection_qty, i64::MIN);
    assert_eq!(summary.total.startup_qty, i64::MAX);
}
