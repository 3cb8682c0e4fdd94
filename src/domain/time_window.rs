// ==========================================
// 生产日志看板 - 时间窗口
// ==========================================
// 班次与停机都以 "HH:MM" 起止时间描述
// 时长永不为负: 结束早于开始视为跨越午夜
// ==========================================

use chrono::{NaiveTime, Timelike};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 一天的分钟数
pub const MINUTES_PER_DAY: u32 = 1440;

// ==========================================
// ClockTime - 钟点时间（午夜起的分钟数, 0..1440）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes < MINUTES_PER_DAY {
            Some(Self(minutes as u16))
        } else {
            None
        }
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Self::from_minutes(hour * 60 + minute)
        } else {
            None
        }
    }

    /// 解析 "HH:MM"，格式错误返回 None
    pub fn parse(text: &str) -> Option<Self> {
        NaiveTime::parse_from_str(text.trim(), "%H:%M")
            .ok()
            .and_then(|t| Self::from_hm(t.hour(), t.minute()))
    }

    pub fn minutes(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

// ==========================================
// TimeWindow - 起止时间窗口
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default, with = "clock_field")]
    pub start: Option<ClockTime>,
    #[serde(default, with = "clock_field")]
    pub end: Option<ClockTime>,
}

impl TimeWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// 从两个 "HH:MM" 字符串构造，非法部分置空
    pub fn parse(start: &str, end: &str) -> Self {
        Self {
            start: ClockTime::parse(start),
            end: ClockTime::parse(end),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// 跨午夜时长（分钟）
    ///
    /// - end >= start: end - start
    /// - end < start: end + 1440 - start
    /// - 任一端缺失: 0
    pub fn duration_minutes(&self) -> u32 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                let (s, e) = (start.minutes(), end.minutes());
                if e < s {
                    e + MINUTES_PER_DAY - s
                } else {
                    e - s
                }
            }
            _ => 0,
        }
    }
}

/// Option<ClockTime> 的序列化: 缺失写作 ""，读取时任何非法值都视为缺失
mod clock_field {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawClock {
        Text(String),
        Other(IgnoredAny),
    }

    pub fn serialize<S>(value: &Option<ClockTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.collect_str(t),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ClockTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawClock::deserialize(deserializer)? {
            RawClock::Text(text) => ClockTime::parse(&text),
            RawClock::Other(_) => None,
        })
    }
}
