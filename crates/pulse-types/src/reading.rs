use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 图表使用的数值字段名
pub const FIELD_VALUE: &str = "value";
/// 单位字段名
pub const FIELD_UNIT: &str = "unit";
/// 状态字段名
pub const FIELD_STATUS: &str = "status";

pub const TAG_DEVICE_ID: &str = "device_id";
pub const TAG_PATIENT_ID: &str = "patient_id";
pub const TAG_VITALS_TYPE: &str = "vitals_type";

/// 单条读数
///
/// 后端按 `{ time, field, value, tags }` 返回，每个字段一条。
/// `time` 保留后端原始的 ISO-8601 字符串，分组时按字符串精确比较，
/// 绘图时再按需解析。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// 测量名称（读取接口不一定返回）
    #[serde(default)]
    pub measurement: String,

    /// 标签
    #[serde(default, deserialize_with = "tags_as_strings")]
    pub tags: HashMap<String, String>,

    /// 字段名
    pub field: String,

    /// 字段值（数值或字符串）
    pub value: serde_json::Value,

    /// 时间戳
    pub time: String,
}

impl Reading {
    pub fn new(field: impl Into<String>, value: impl Into<serde_json::Value>, time: impl Into<String>) -> Self {
        Self {
            measurement: String::new(),
            tags: HashMap::new(),
            field: field.into(),
            value: value.into(),
            time: time.into(),
        }
    }

    pub fn with_measurement(mut self, measurement: impl Into<String>) -> Self {
        self.measurement = measurement.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// 解析时间戳
    pub fn timestamp(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.time).map(|t| t.with_timezone(&Utc))
    }

    /// 数值型读数
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.as_f64()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// 以文本形式显示字段值
    pub fn display_value(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// 读取接口的返回：device_id → 读数列表
pub type DeviceReadings = BTreeMap<String, Vec<Reading>>;

// InfluxDB 的 record.values 里混有 `_start`、`_value` 等非字符串列，
// 只保留能表示为字符串的标签。
fn tags_as_strings<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<HashMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::String(s) => Some((k, s)),
            serde_json::Value::Number(n) => Some((k, n.to_string())),
            serde_json::Value::Bool(b) => Some((k, b.to_string())),
            _ => None,
        })
        .collect())
}
