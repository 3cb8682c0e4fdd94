// ==========================================
// 生产日志看板 - 宽松数值反序列化
// ==========================================
// 操作员录入的数值字段可能缺失、为空串或为非数字文本
// 这些情况一律按 0 处理，不报错
// ==========================================

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

fn raw_to_f64(raw: Option<RawNumber>) -> f64 {
    let value = match raw {
        Some(RawNumber::Number(n)) => n,
        Some(RawNumber::Text(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        Some(RawNumber::Other(_)) | None => 0.0,
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 浮点字段（单重、速率、周期）
pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw_to_f64(raw))
}

/// 数量字段（可为负，截断小数）
pub fn i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw_to_f64(raw).trunc() as i64)
}

/// 模腔数（非正数视为 0）
pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    let value = raw_to_f64(raw).trunc();
    Ok(if value > 0.0 { value as u32 } else { 0 })
}
