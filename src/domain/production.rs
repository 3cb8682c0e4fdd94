// ==========================================
// 生产日志看板 - 生产记录领域模型
// ==========================================
// DayRecord: 某日某机型的记录（键: <YYYY-MM-DD>_<IM|BM>）
// ProductionRecord: 单个班次/机台的一行录入
// BreakdownEvent: 行内的停机事件
// ==========================================

use super::config_record::ProductItem;
use super::lenient::{f64_or_zero, i64_or_zero, u32_or_zero};
use super::time_window::TimeWindow;
use super::types::{MachineType, Shift};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// BreakdownEvent - 停机事件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEvent {
    #[serde(default)]
    pub category: String,    // 停机类别（来自配置）
    #[serde(default)]
    pub description: String, // 描述
    #[serde(default)]
    pub window: TimeWindow,  // 停机起止
}

impl BreakdownEvent {
    pub fn new(category: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            category: category.into(),
            description: String::new(),
            window,
        }
    }
}

// ==========================================
// ProductionRecord - 班次生产行
// ==========================================
// 数值字段宽松解析: 缺失或非数字均为 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    // ===== 班次 =====
    #[serde(default)]
    pub shift: Shift,
    #[serde(default)]
    pub window: TimeWindow,

    // ===== 机台与产品 =====
    #[serde(default)]
    pub machine: String,
    #[serde(default)]
    pub product: String,

    // ===== 产品参数 =====
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub unit_weight_grams: f64,  // 单件重量 (克)
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub rate_per_hour: f64,      // 每模腔每小时节拍
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub cavities: u32,           // 模腔数
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub cycle_time_seconds: f64, // 成型周期（仅展示）

    // ===== 实绩 =====
    #[serde(default, deserialize_with = "i64_or_zero")]
    pub achieved_qty: i64,
    #[serde(default, deserialize_with = "i64_or_zero")]
    pub rejection_qty: i64,
    #[serde(default, deserialize_with = "i64_or_zero")]
    pub startup_qty: i64,

    #[serde(default)]
    pub breakdowns: Vec<BreakdownEvent>,
}

impl ProductionRecord {
    pub fn new(shift: Shift, window: TimeWindow) -> Self {
        Self {
            shift,
            window,
            ..Default::default()
        }
    }

    /// 合格数 = 实绩 - 不良 - 开机料（派生值，可为负）
    pub fn accepted_qty(&self) -> i64 {
        self.achieved_qty
            .saturating_sub(self.rejection_qty)
            .saturating_sub(self.startup_qty)
    }

    /// 录入数量是否自相矛盾（不良+开机料超过实绩）
    pub fn has_inconsistent_counts(&self) -> bool {
        self.accepted_qty() < 0
    }

    /// 选择产品后带出产品参数
    pub fn apply_product(&mut self, product: &ProductItem) {
        self.product = product.name.clone();
        self.unit_weight_grams = product.unit_weight_grams;
        self.rate_per_hour = product.rate_per_hour;
        self.cavities = product.cavities;
        self.cycle_time_seconds = product.cycle_time_seconds;
    }
}

// ==========================================
// DayRecord - 日记录
// ==========================================
// 首次保存时创建，之后只追加/修改/删除行，不整体销毁
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub date: NaiveDate,
    pub machine_type: MachineType,
    #[serde(default)]
    pub day_supervisor: String,
    #[serde(default)]
    pub night_supervisor: String,
    #[serde(default)]
    pub rows: Vec<ProductionRecord>,
}

impl DayRecord {
    pub fn new(date: NaiveDate, machine_type: MachineType) -> Self {
        Self {
            date,
            machine_type,
            day_supervisor: String::new(),
            night_supervisor: String::new(),
            rows: Vec::new(),
        }
    }

    /// 数据集中的键
    pub fn key(&self) -> String {
        super::dataset::day_key(self.date, self.machine_type)
    }

    /// 追加一行，返回其下标
    pub fn push_row(&mut self, row: ProductionRecord) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    /// 替换指定行；下标越界返回 false
    pub fn update_row(&mut self, index: usize, row: ProductionRecord) -> bool {
        match self.rows.get_mut(index) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }

    pub fn remove_row(&mut self, index: usize) -> Option<ProductionRecord> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    pub fn rows_for_shift(&self, shift: Shift) -> impl Iterator<Item = &ProductionRecord> {
        self.rows.iter().filter(move |r| r.shift == shift)
    }

    pub fn supervisor(&self, shift: Shift) -> &str {
        match shift {
            Shift::Day => &self.day_supervisor,
            Shift::Night => &self.night_supervisor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_accepted_qty_may_be_negative() {
        let mut row = ProductionRecord::default();
        row.achieved_qty = 10;
        row.rejection_qty = 8;
        row.startup_qty = 5;
        assert_eq!(row.accepted_qty(), -3);
        assert!(row.has_inconsistent_counts());
    }

    #[test]
    fn test_row_lifecycle() {
        let mut record = DayRecord::new(date(), MachineType::IM);
        assert_eq!(record.key(), "2024-03-01_IM");

        let idx = record.push_row(ProductionRecord::new(Shift::Day, TimeWindow::parse("08:00", "20:00")));
        assert_eq!(idx, 0);
        record.push_row(ProductionRecord::new(Shift::Night, TimeWindow::parse("20:00", "08:00")));

        let mut replacement = record.rows[0].clone();
        replacement.achieved_qty = 99;
        assert!(record.update_row(0, replacement));
        assert!(!record.update_row(5, ProductionRecord::default()));
        assert_eq!(record.rows[0].achieved_qty, 99);

        assert_eq!(record.rows_for_shift(Shift::Night).count(), 1);
        assert!(record.remove_row(1).is_some());
        assert!(record.remove_row(1).is_none());
        assert_eq!(record.rows.len(), 1);
    }

    #[test]
    fn test_apply_product() {
        let product = ProductItem {
            name: "Cap 28mm".to_string(),
            unit_weight_grams: 3.2,
            rate_per_hour: 240.0,
            cavities: 16,
            cycle_time_seconds: 15.0,
        };
        let mut row = ProductionRecord::default();
        row.apply_product(&product);
        assert_eq!(row.product, "Cap 28mm");
        assert_eq!(row.cavities, 16);
        assert_eq!(row.rate_per_hour, 240.0);
    }

    #[test]
    fn test_lenient_row_decoding() {
        let json = r#"{
            "shift": "Night",
            "window": {"start": "20:00", "end": "08:00"},
            "ratePerHour": "100",
            "cavities": "",
            "achievedQty": "n/a"
        }"#;
        let row: ProductionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(row.shift, Shift::Night);
        assert_eq!(row.rate_per_hour, 100.0);
        assert_eq!(row.cavities, 0);
        assert_eq!(row.achieved_qty, 0);
        assert!(row.breakdowns.is_empty());
    }
}
