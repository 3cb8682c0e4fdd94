// ==========================================
// 生产日志看板 - 配置记录
// ==========================================
// 存放于保留键 "config"
// 产品目录、停机类别、不良类别、班组名称
// ==========================================

use super::lenient::{f64_or_zero, u32_or_zero};
use serde::{Deserialize, Serialize};

// ==========================================
// ProductItem - 产品目录条目
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub unit_weight_grams: f64,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub rate_per_hour: f64,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub cavities: u32,
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub cycle_time_seconds: f64,
}

// ==========================================
// ConfigRecord - 管理配置
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    #[serde(default)]
    pub products: Vec<ProductItem>,
    #[serde(default)]
    pub breakdown_categories: Vec<String>,
    #[serde(default)]
    pub defect_categories: Vec<String>,
    #[serde(default)]
    pub shift_teams: Vec<String>,
}

impl ConfigRecord {
    /// 按名称查找产品（忽略首尾空白）
    pub fn find_product(&self, name: &str) -> Option<&ProductItem> {
        let name = name.trim();
        self.products.iter().find(|p| p.name.trim() == name)
    }

    pub fn has_breakdown_category(&self, category: &str) -> bool {
        self.breakdown_categories.iter().any(|c| c == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_product() {
        let config = ConfigRecord {
            products: vec![ProductItem {
                name: "Bottle 500ml".to_string(),
                unit_weight_grams: 22.0,
                rate_per_hour: 120.0,
                cavities: 4,
                cycle_time_seconds: 30.0,
            }],
            breakdown_categories: vec!["Mould".to_string()],
            ..Default::default()
        };
        assert!(config.find_product(" Bottle 500ml").is_some());
        assert!(config.find_product("Cap").is_none());
        assert!(config.has_breakdown_category("Mould"));
    }

    #[test]
    fn test_missing_lists_default_empty() {
        let config: ConfigRecord = serde_json::from_str(r#"{"products":[{"name":"A"}]}"#).unwrap();
        assert_eq!(config.products[0].cavities, 0);
        assert!(config.shift_teams.is_empty());
    }
}
