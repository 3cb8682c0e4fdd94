// ==========================================
// 生产日志看板 - 指标结果
// ==========================================
// 由 MetricsEngine 从单行生产记录派生
// 所有损失量带符号: 超产时为负
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResult {
    // ===== 计划 =====
    pub duration_minutes: u32, // 班次时长
    pub rate_per_minute: f64,  // 每分钟理论产出
    pub plan_qty: i64,
    pub plan_kg: f64,

    // ===== 实绩与损失 =====
    pub achieved_kg: f64,
    pub lost_qty: i64,
    pub lost_kg: f64,

    // ===== 停机损失 =====
    pub breakdown_minutes: u32,
    pub breakdown_lost_qty: i64,
    pub breakdown_lost_kg: f64,

    // ===== 效率损失（扣除停机后的剩余损失）=====
    pub efficiency_loss_qty: i64,
    pub efficiency_loss_kg: f64,

    // ===== 合格品 =====
    pub accepted_qty: i64,
    pub accepted_kg: f64,

    pub efficiency_pct: f64, // 实绩/计划 × 100，保留 1 位
}
