// ==========================================
// 生产日志看板 - 日汇总引擎
// ==========================================
// 职责: 汇总一个日记录的全部行
// 输出: 白班/夜班/全天合计 + 按停机类别的损失排行
// 约束: 纯计算，与 MetricsEngine 使用同一套取整规则
// ==========================================

use crate::domain::metrics::MetricsResult;
use crate::domain::production::DayRecord;
use crate::domain::types::{MachineType, Shift};
use crate::engine::metrics::{compute_metrics, efficiency_pct, rate_per_minute, round_to, window_qty};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

/// 未填写类别的停机归入此类
pub const UNCATEGORIZED: &str = "未分类";

// ==========================================
// ShiftTotals - 班次合计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTotals {
    pub row_count: usize,
    pub plan_qty: i64,
    pub achieved_qty: i64,
    pub lost_qty: i64,
    pub breakdown_minutes: u32,
    pub breakdown_lost_qty: i64,
    pub efficiency_loss_qty: i64,
    pub accepted_qty: i64,
    pub rejection_qty: i64,
    pub startup_qty: i64,
    pub plan_kg: f64,
    pub achieved_kg: f64,
    pub lost_kg: f64,
    pub breakdown_lost_kg: f64,
    pub efficiency_loss_kg: f64,
    pub accepted_kg: f64,
    pub efficiency_pct: f64, // 由合计计划/实绩重新计算
}

impl ShiftTotals {
    fn add_row(&mut self, achieved: i64, rejection: i64, startup: i64, m: &MetricsResult) {
        self.row_count += 1;
        self.plan_qty = self.plan_qty.saturating_add(m.plan_qty);
        self.achieved_qty = self.achieved_qty.saturating_add(achieved);
        self.lost_qty = self.lost_qty.saturating_add(m.lost_qty);
        self.breakdown_minutes = self.breakdown_minutes.saturating_add(m.breakdown_minutes);
        self.breakdown_lost_qty = self.breakdown_lost_qty.saturating_add(m.breakdown_lost_qty);
        self.efficiency_loss_qty = self.efficiency_loss_qty.saturating_add(m.efficiency_loss_qty);
        self.accepted_qty = self.accepted_qty.saturating_add(m.accepted_qty);
        self.rejection_qty = self.rejection_qty.saturating_add(rejection);
        self.startup_qty = self.startup_qty.saturating_add(startup);
        self.plan_kg += m.plan_kg;
        self.achieved_kg += m.achieved_kg;
        self.lost_kg += m.lost_kg;
        self.breakdown_lost_kg += m.breakdown_lost_kg;
        self.efficiency_loss_kg += m.efficiency_loss_kg;
        self.accepted_kg += m.accepted_kg;
    }

    fn merge(&mut self, other: &ShiftTotals) {
        self.row_count += other.row_count;
        self.plan_qty = self.plan_qty.saturating_add(other.plan_qty);
        self.achieved_qty = self.achieved_qty.saturating_add(other.achieved_qty);
        self.lost_qty = self.lost_qty.saturating_add(other.lost_qty);
        self.breakdown_minutes = self.breakdown_minutes.saturating_add(other.breakdown_minutes);
        self.breakdown_lost_qty = self.breakdown_lost_qty.saturating_add(other.breakdown_lost_qty);
        self.efficiency_loss_qty = self.efficiency_loss_qty.saturating_add(other.efficiency_loss_qty);
        self.accepted_qty = self.accepted_qty.saturating_add(other.accepted_qty);
        self.rejection_qty = self.rejection_qty.saturating_add(other.rejection_qty);
        self.startup_qty = self.startup_qty.saturating_add(other.startup_qty);
        self.plan_kg += other.plan_kg;
        self.achieved_kg += other.achieved_kg;
        self.lost_kg += other.lost_kg;
        self.breakdown_lost_kg += other.breakdown_lost_kg;
        self.efficiency_loss_kg += other.efficiency_loss_kg;
        self.accepted_kg += other.accepted_kg;
    }

    /// 消除浮点累加误差并重算效率
    fn finish(mut self) -> Self {
        for kg in [
            &mut self.plan_kg,
            &mut self.achieved_kg,
            &mut self.lost_kg,
            &mut self.breakdown_lost_kg,
            &mut self.efficiency_loss_kg,
            &mut self.accepted_kg,
        ] {
            *kg = round_to(*kg, 2);
        }
        self.efficiency_pct = efficiency_pct(self.achieved_qty, self.plan_qty);
        self
    }
}

// ==========================================
// CategoryLoss - 停机类别损失
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLoss {
    pub category: String,
    pub event_count: usize,
    pub minutes: u32,
    pub lost_qty: i64,
}

// ==========================================
// DaySummary - 日汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub machine_type: MachineType,
    pub day_shift: ShiftTotals,
    pub night_shift: ShiftTotals,
    pub total: ShiftTotals,
    pub breakdown_by_category: Vec<CategoryLoss>, // 按停机分钟降序
}

impl DaySummary {
    pub fn shift(&self, shift: Shift) -> &ShiftTotals {
        match shift {
            Shift::Day => &self.day_shift,
            Shift::Night => &self.night_shift,
        }
    }
}

// ==========================================
// DaySummaryEngine - 日汇总引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct DaySummaryEngine;

impl DaySummaryEngine {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, record), fields(key = %record.key(), rows = record.rows.len()))]
    pub fn summarize(&self, record: &DayRecord) -> DaySummary {
        let mut day_shift = ShiftTotals::default();
        let mut night_shift = ShiftTotals::default();
        let mut categories: HashMap<String, CategoryLoss> = HashMap::new();

        for row in &record.rows {
            let metrics = compute_metrics(row);
            let totals = match row.shift {
                Shift::Day => &mut day_shift,
                Shift::Night => &mut night_shift,
            };
            totals.add_row(row.achieved_qty, row.rejection_qty, row.startup_qty, &metrics);

            let rpm = rate_per_minute(row);
            for event in &row.breakdowns {
                let name = match event.category.trim() {
                    "" => UNCATEGORIZED.to_string(),
                    other => other.to_string(),
                };
                let slot = categories.entry(name.clone()).or_insert_with(|| CategoryLoss {
                    category: name,
                    event_count: 0,
                    minutes: 0,
                    lost_qty: 0,
                });
                slot.event_count += 1;
                slot.minutes = slot.minutes.saturating_add(event.window.duration_minutes());
                slot.lost_qty = slot.lost_qty.saturating_add(window_qty(rpm, &event.window));
            }
        }

        let mut total = day_shift.clone();
        total.merge(&night_shift);

        let mut breakdown_by_category: Vec<CategoryLoss> = categories.into_values().collect();
        breakdown_by_category.sort_by(|a, b| {
            b.minutes
                .cmp(&a.minutes)
                .then_with(|| a.category.cmp(&b.category))
        });

        DaySummary {
            date: record.date,
            machine_type: record.machine_type,
            day_shift: day_shift.finish(),
            night_shift: night_shift.finish(),
            total: total.finish(),
            breakdown_by_category,
        }
    }
}
