// ==========================================
// 生产日志看板 - 数据集
// ==========================================
// 整个应用的数据是一个有序的键值映射:
// - "<YYYY-MM-DD>_<IM|BM>" → 日记录
// - "config"               → 配置记录
// 本地缓存与云端文档都保存完整数据集
// ==========================================

use super::config_record::ConfigRecord;
use super::production::DayRecord;
use super::types::MachineType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// 配置记录的保留键
pub const CONFIG_KEY: &str = "config";

/// 空数据集的存储形式
pub const EMPTY_SENTINEL: &str = "{}";

/// 日记录键: "<YYYY-MM-DD>_<IM|BM>"
pub fn day_key(date: NaiveDate, machine_type: MachineType) -> String {
    format!("{}_{}", date.format("%Y-%m-%d"), machine_type.as_str())
}

/// 解析日记录键
pub fn parse_day_key(key: &str) -> Option<(NaiveDate, MachineType)> {
    let (date_part, machine_part) = key.rsplit_once('_')?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let machine_type = MachineType::from_code(machine_part)?;
    if machine_part != machine_type.as_str() {
        return None;
    }
    Some((date, machine_type))
}

// ==========================================
// Entry - 数据集条目（带标签的联合类型）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Day(DayRecord),
    Config(ConfigRecord),
}

impl Entry {
    /// 条目自身对应的键
    pub fn natural_key(&self) -> String {
        match self {
            Entry::Day(record) => record.key(),
            Entry::Config(_) => CONFIG_KEY.to_string(),
        }
    }

    pub fn as_day(&self) -> Option<&DayRecord> {
        match self {
            Entry::Day(record) => Some(record),
            Entry::Config(_) => None,
        }
    }

    pub fn as_config(&self) -> Option<&ConfigRecord> {
        match self {
            Entry::Config(config) => Some(config),
            Entry::Day(_) => None,
        }
    }
}

impl From<DayRecord> for Entry {
    fn from(record: DayRecord) -> Self {
        Entry::Day(record)
    }
}

impl From<ConfigRecord> for Entry {
    fn from(config: ConfigRecord) -> Self {
        Entry::Config(config)
    }
}

// ==========================================
// DatasetViolation - 键与条目不一致
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetViolation {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for DatasetViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

// ==========================================
// Dataset - 键值数据集
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    entries: BTreeMap<String, Entry>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(key.into(), entry)
    }

    /// 以条目自身的键插入
    pub fn upsert(&mut self, entry: Entry) -> Option<Entry> {
        let key = entry.natural_key();
        self.entries.insert(key, entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Entry> {
        self.entries.iter()
    }

    /// 键级合并: other 中的键覆盖本数据集，其余键保留
    pub fn merge_from(&mut self, other: &Dataset) {
        for (key, entry) in other.iter() {
            self.entries.insert(key.clone(), entry.clone());
        }
    }

    pub fn day_record(&self, date: NaiveDate, machine_type: MachineType) -> Option<&DayRecord> {
        self.get(&day_key(date, machine_type)).and_then(Entry::as_day)
    }

    pub fn config(&self) -> Option<&ConfigRecord> {
        self.get(CONFIG_KEY).and_then(Entry::as_config)
    }

    /// 所有日记录（按键排序）
    pub fn day_records(&self) -> impl Iterator<Item = &DayRecord> {
        self.entries.values().filter_map(Entry::as_day)
    }

    /// 检查键与条目是否一致
    pub fn violations(&self) -> Vec<DatasetViolation> {
        self.iter()
            .filter_map(|(key, entry)| check_key(key, entry).map(|reason| DatasetViolation {
                key: key.clone(),
                reason,
            }))
            .collect()
    }

    pub fn validate(&self) -> Result<(), Vec<DatasetViolation>> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// 单个键的一致性检查，返回不一致原因
pub fn check_key(key: &str, entry: &Entry) -> Option<String> {
    match entry {
        Entry::Config(_) if key == CONFIG_KEY => None,
        Entry::Config(_) => Some(format!("配置记录必须使用键 {}", CONFIG_KEY)),
        Entry::Day(_) if key == CONFIG_KEY => Some("保留键 config 只能存放配置记录".to_string()),
        Entry::Day(record) => {
            if parse_day_key(key).is_none() {
                Some("键格式应为 <YYYY-MM-DD>_<IM|BM>".to_string())
            } else if record.key() != key {
                Some(format!("键与记录不符，记录对应 {}", record.key()))
            } else {
                None
            }
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = (&'a String, &'a Entry);
    type IntoIter = btree_map::Iter<'a, String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32, mt: MachineType) -> DayRecord {
        DayRecord::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), mt)
    }

    #[test]
    fn test_day_key_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let key = day_key(date, MachineType::BM);
        assert_eq!(key, "2024-01-09_BM");
        assert_eq!(parse_day_key(&key), Some((date, MachineType::BM)));
        assert_eq!(parse_day_key("2024-01-09_bm"), None);
        assert_eq!(parse_day_key("config"), None);
    }

    #[test]
    fn test_tagged_entry_json() {
        let mut dataset = Dataset::new();
        dataset.upsert(day(2024, 1, 9, MachineType::IM).into());
        dataset.upsert(ConfigRecord::default().into());

        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["config"]["kind"], "config");
        assert_eq!(json["2024-01-09_IM"]["kind"], "day");
        assert_eq!(json["2024-01-09_IM"]["machineType"], "IM");

        let back: Dataset = serde_json::from_value(json).unwrap();
        assert_eq!(back, dataset);
    }

    #[test]
    fn test_validate_rejects_mismatch() {
        let mut dataset = Dataset::new();
        dataset.insert("2024-01-09_BM", day(2024, 1, 9, MachineType::IM).into());
        dataset.insert(CONFIG_KEY, day(2024, 1, 10, MachineType::IM).into());
        dataset.insert("2024-01-11_IM", ConfigRecord::default().into());

        let violations = dataset.validate().unwrap_err();
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn test_validate_accepts_consistent() {
        let mut dataset = Dataset::new();
        dataset.upsert(day(2024, 2, 29, MachineType::BM).into());
        dataset.upsert(ConfigRecord::default().into());
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn test_merge_preserves_sibling_keys() {
        let mut remote = Dataset::new();
        remote.upsert(day(2024, 1, 1, MachineType::IM).into());
        remote.upsert(day(2024, 1, 2, MachineType::IM).into());

        let mut local = Dataset::new();
        let mut changed = day(2024, 1, 2, MachineType::IM);
        changed.day_supervisor = "Lee".to_string();
        local.upsert(changed.clone().into());

        remote.merge_from(&local);
        assert_eq!(remote.len(), 2);
        let merged = remote.day_record(changed.date, MachineType::IM).unwrap();
        assert_eq!(merged.day_supervisor, "Lee");
    }
}
