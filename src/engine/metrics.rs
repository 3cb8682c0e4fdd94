// ==========================================
// 生产日志看板 - 产量指标引擎
// ==========================================
// 职责: 从单行生产记录计算计划量、损失量与效率
// 输入: ProductionRecord
// 输出: MetricsResult
// 约束: 纯函数、确定性，不访问存储，不报错
// ==========================================

use crate::domain::metrics::MetricsResult;
use crate::domain::production::ProductionRecord;
use crate::domain::time_window::TimeWindow;
use tracing::instrument;

// ==========================================
// 数值工具
// ==========================================

/// 非有限值视为 0
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 向下取整为件数
fn floor_qty(value: f64) -> i64 {
    finite_or_zero(value).floor() as i64
}

/// 四舍五入到指定小数位
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    finite_or_zero((finite_or_zero(value) * factor).round() / factor)
}

/// 件数换算公斤（保留 2 位）
pub fn qty_to_kg(qty: i64, unit_weight_grams: f64) -> f64 {
    round_to(qty as f64 * unit_weight_grams / 1000.0, 2)
}

/// 每分钟理论产出 = 每小时节拍 × 模腔数 / 60
pub fn rate_per_minute(record: &ProductionRecord) -> f64 {
    finite_or_zero(record.rate_per_hour * record.cavities as f64 / 60.0)
}

/// 给定窗口内按理论速率应产出的件数（向下取整）
pub fn window_qty(rate_per_minute: f64, window: &TimeWindow) -> i64 {
    floor_qty(rate_per_minute * window.duration_minutes() as f64)
}

/// 效率百分比（计划为 0 时为 0，保留 1 位）
pub fn efficiency_pct(achieved_qty: i64, plan_qty: i64) -> f64 {
    if plan_qty > 0 {
        round_to(achieved_qty as f64 / plan_qty as f64 * 100.0, 1)
    } else {
        0.0
    }
}

/// 计算单行指标
pub fn compute_metrics(record: &ProductionRecord) -> MetricsResult {
    // 1. 班次时长与理论速率
    let duration_minutes = record.window.duration_minutes();
    let rate_per_minute = rate_per_minute(record);

    // 2. 计划量
    let plan_qty = window_qty(rate_per_minute, &record.window);

    // 3. 停机损失（逐事件取整后累加）
    let (breakdown_minutes, breakdown_lost_qty) = record.breakdowns.iter().fold(
        (0u32, 0i64),
        |(minutes, lost), event| {
            (
                minutes.saturating_add(event.window.duration_minutes()),
                lost.saturating_add(window_qty(rate_per_minute, &event.window)),
            )
        },
    );

    // 4. 带符号损失（极端输入饱和而非溢出）
    let lost_qty = plan_qty.saturating_sub(record.achieved_qty);
    let efficiency_loss_qty = lost_qty.saturating_sub(breakdown_lost_qty);
    let accepted_qty = record.accepted_qty();

    let weight = record.unit_weight_grams;
    MetricsResult {
        duration_minutes,
        rate_per_minute,
        plan_qty,
        plan_kg: qty_to_kg(plan_qty, weight),
        achieved_kg: qty_to_kg(record.achieved_qty, weight),
        lost_qty,
        lost_kg: qty_to_kg(lost_qty, weight),
        breakdown_minutes,
        breakdown_lost_qty,
        breakdown_lost_kg: qty_to_kg(breakdown_lost_qty, weight),
        efficiency_loss_qty,
        efficiency_loss_kg: qty_to_kg(efficiency_loss_qty, weight),
        accepted_qty,
        accepted_kg: qty_to_kg(accepted_qty, weight),
        efficiency_pct: efficiency_pct(record.achieved_qty, plan_qty),
    }
}

// ==========================================
// MetricsEngine - 指标引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, record: &ProductionRecord) -> MetricsResult {
        compute_metrics(record)
    }

    /// 批量计算（保持行顺序）
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn compute_batch(&self, records: &[ProductionRecord]) -> Vec<MetricsResult> {
        records.iter().map(compute_metrics).collect()
    }
}
