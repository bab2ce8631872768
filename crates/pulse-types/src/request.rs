use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 写入一条数据（`POST /data/`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteDataRequest {
    pub measurement: String,
    pub tag: HashMap<String, String>,
    pub field: HashMap<String, serde_json::Value>,
    /// 不设置时由后端打时间戳
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl WriteDataRequest {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tag: HashMap::new(),
            field: HashMap::new(),
            timestamp: None,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tag.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.field.insert(key.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn device_id(&self) -> Option<&str> {
        self.tag.get(crate::TAG_DEVICE_ID).map(String::as_str)
    }
}

/// 字段选择：全部或指定字段列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", from = "Vec<String>")]
pub enum FieldSelector {
    All,
    Named(Vec<String>),
}

impl From<FieldSelector> for Vec<String> {
    fn from(selector: FieldSelector) -> Self {
        match selector {
            FieldSelector::All => vec!["All".to_string()],
            FieldSelector::Named(fields) => fields,
        }
    }
}

impl From<Vec<String>> for FieldSelector {
    fn from(fields: Vec<String>) -> Self {
        if fields.is_empty() || fields.first().map(String::as_str) == Some("All") {
            FieldSelector::All
        } else {
            FieldSelector::Named(fields)
        }
    }
}

/// 读取时序数据（`POST /data/read/`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadDataRequest {
    pub measurement_name: String,
    /// 为空表示所有设备
    pub tag: HashMap<String, String>,
    pub field: FieldSelector,
    /// 回看窗口（小时）
    pub time_interval: u32,
}

impl ReadDataRequest {
    pub fn new(measurement_name: impl Into<String>, time_interval: u32) -> Self {
        Self {
            measurement_name: measurement_name.into(),
            tag: HashMap::new(),
            field: FieldSelector::All,
            time_interval,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tag.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.field = FieldSelector::from(fields);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_request_without_filter() {
        let req = ReadDataRequest::new("vitals", 1);
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(
            body,
            json!({
                "measurement_name": "vitals",
                "tag": {},
                "field": ["All"],
                "time_interval": 1
            })
        );
    }

    #[test]
    fn test_read_request_with_fields() {
        let req = ReadDataRequest::new("weather", 6)
            .with_tag("device_id", "dev-temp-001")
            .with_fields(vec!["temperature".to_string(), "pressure".to_string()]);
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["field"], json!(["temperature", "pressure"]));
        assert_eq!(body["tag"]["device_id"], "dev-temp-001");
    }

    #[test]
    fn test_write_request_omits_missing_timestamp() {
        let req = WriteDataRequest::new("vitals")
            .with_tag("device_id", "hr-001")
            .with_field("value", 72)
            .with_field("unit", "bpm");
        let body = serde_json::to_value(&req).unwrap();
        assert!(body.get("timestamp").is_none());
        assert_eq!(body["field"]["value"], 72);
        assert_eq!(req.device_id(), Some("hr-001"));
    }
}
