use serde::{Deserialize, Serialize};

/// 设备记录（后端所有，控制台只保存临时副本）
///
/// 后端存在两套字段命名：`model/patient_id/vital_type` 与
/// `name/location/quantity_measured`，解码时两者都接受。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// 设备 ID
    pub device_id: String,

    /// 设备型号
    #[serde(default, alias = "name")]
    pub model: Option<String>,

    /// 病人 ID / 安装位置
    #[serde(default, alias = "location")]
    pub patient_id: Option<String>,

    /// 测量的体征类型
    #[serde(default, alias = "quantity_measured")]
    pub vital_type: Option<String>,

    /// 最后活跃时间
    #[serde(default)]
    pub last_active: Option<String>,

    /// 设备状态
    #[serde(default)]
    pub status: Option<String>,
}

impl DeviceRecord {
    pub fn status(&self) -> DeviceStatus {
        self.status
            .as_deref()
            .map(DeviceStatus::from_str)
            .unwrap_or(DeviceStatus::Unknown)
    }
}

/// 设备状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Active,
    Inactive,
    Offline,
    Warning,
    Error,
    Unknown,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Inactive => "inactive",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Warning => "warning",
            DeviceStatus::Error => "error",
            DeviceStatus::Unknown => "unknown",
        }
    }

    /// 大小写不敏感
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "active" => DeviceStatus::Active,
            "inactive" => DeviceStatus::Inactive,
            "offline" => DeviceStatus::Offline,
            "warning" => DeviceStatus::Warning,
            "error" => DeviceStatus::Error,
            _ => DeviceStatus::Unknown,
        }
    }

    /// 是否需要提醒操作员
    pub fn is_alerting(&self) -> bool {
        matches!(
            self,
            DeviceStatus::Offline | DeviceStatus::Warning | DeviceStatus::Error
        )
    }
}

/// 设备注册请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterDevice {
    pub device_id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub vital_type: String,
}

impl RegisterDevice {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = patient_id.into();
        self
    }

    pub fn with_vital_type(mut self, vital_type: impl Into<String>) -> Self {
        self.vital_type = vital_type.into();
        self
    }
}

/// 设备更新请求（只包含可编辑字段，未设置的字段不发送）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.patient_id.is_none()
    }

    /// 把更新应用到本地缓存副本上
    pub fn apply_to(&self, record: &mut DeviceRecord) {
        if let Some(model) = &self.model {
            record.model = Some(model.clone());
        }
        if let Some(patient_id) = &self.patient_id {
            record.patient_id = Some(patient_id.clone());
        }
    }
}
