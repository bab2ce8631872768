use crate::{Result, SimulatorError};
use chrono::{DateTime, Utc};
use pulse_types::{
    WriteDataRequest, FIELD_STATUS, FIELD_UNIT, FIELD_VALUE, TAG_DEVICE_ID, TAG_PATIENT_ID,
    TAG_VITALS_TYPE,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Duration;

/// 默认的随机间隔窗口（毫秒，左闭右开）
pub const DEFAULT_INTERVAL_MS: Range<u64> = 30_000..120_000;

/// 固定的首次周期触发延迟
pub const PINNED_FIRST_DELAY: Duration = Duration::from_secs(60);

/// 气象设备的固定发送间隔
pub const WEATHER_INTERVAL: Duration = Duration::from_secs(30);

pub const VITALS_MEASUREMENT: &str = "vitals";
pub const WEATHER_MEASUREMENT: &str = "weather";

/// 模拟通道配置
///
/// 一个通道对应一台模拟设备：取值范围、单位、首次延迟和随机间隔窗口。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// 设备 ID
    pub device_id: String,

    /// 测量名称
    pub measurement: String,

    /// 数值字段名
    pub field: String,

    /// 体征类型（写入 `vitals_type` 标签）
    pub vital_type: String,

    /// 病人 ID 标签
    pub patient_id: Option<String>,

    /// 取值范围（左闭右开）
    pub value_range: Range<i64>,

    /// 小数位数；None 时读数为整数
    pub decimals: Option<u32>,

    /// 单位
    pub unit: String,

    /// 固定状态元数据
    pub status: String,

    /// 是否附带 `status`/`unit` 元数据字段
    pub metadata: bool,

    /// 是否由本端打时间戳
    pub timestamped: bool,

    /// 首次周期触发的固定延迟（None 表示使用随机延迟）
    pub first_delay: Option<Duration>,

    /// 随机间隔窗口（毫秒，左闭右开）
    pub interval_ms: Range<u64>,
}

impl ChannelConfig {
    pub fn new(device_id: impl Into<String>, vital_type: impl Into<String>, value_range: Range<i64>) -> Self {
        Self {
            device_id: device_id.into(),
            measurement: VITALS_MEASUREMENT.to_string(),
            field: FIELD_VALUE.to_string(),
            vital_type: vital_type.into(),
            patient_id: None,
            value_range,
            decimals: None,
            unit: String::new(),
            status: "normal".to_string(),
            metadata: true,
            timestamped: false,
            first_delay: None,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }

    /// 心率通道：60..100 bpm
    pub fn heart_rate() -> Self {
        Self::new("sim-hr-001", "heart_rate", 60..100).with_unit("bpm")
    }

    /// 血氧通道：92..100 %，首次周期触发固定在 60 秒
    pub fn blood_oxygen() -> Self {
        Self::new("sim-spo2-001", "blood_oxygen", 92..100)
            .with_unit("%")
            .with_first_delay(PINNED_FIRST_DELAY)
    }

    pub fn with_measurement(mut self, measurement: impl Into<String>) -> Self {
        self.measurement = measurement.into();
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn with_first_delay(mut self, delay: Duration) -> Self {
        self.first_delay = Some(delay);
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: Range<u64>) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// 固定间隔，不做随机
    pub fn with_fixed_interval(mut self, interval: Duration) -> Self {
        let ms = interval.as_millis() as u64;
        self.interval_ms = ms..ms + 1;
        self
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// 只发送数值字段
    pub fn without_metadata(mut self) -> Self {
        self.metadata = false;
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.timestamped = true;
        self
    }

    pub fn is_fixed_interval(&self) -> bool {
        self.interval_ms.end - self.interval_ms.start == 1
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.device_id.trim().is_empty() {
            return Err(SimulatorError::invalid_channel(&self.device_id, "device_id is empty"));
        }
        if self.value_range.is_empty() {
            return Err(SimulatorError::invalid_channel(
                &self.device_id,
                format!("empty value range {:?}", self.value_range),
            ));
        }
        if self.interval_ms.is_empty() {
            return Err(SimulatorError::invalid_channel(
                &self.device_id,
                format!("empty interval window {:?}", self.interval_ms),
            ));
        }
        Ok(())
    }

    /// 构造一条写入请求
    ///
    /// 整数通道写入整数；`timestamped` 为 false 时不带时间戳，由后端生成。
    pub fn reading(&self, value: f64, at: DateTime<Utc>) -> WriteDataRequest {
        let mut request = WriteDataRequest::new(&self.measurement)
            .with_tag(TAG_DEVICE_ID, &self.device_id)
            .with_tag(TAG_VITALS_TYPE, &self.vital_type);

        request = match self.decimals {
            None => request.with_field(&self.field, value as i64),
            Some(_) => request.with_field(&self.field, value),
        };

        if self.metadata {
            request = request.with_field(FIELD_STATUS, self.status.as_str());
            if !self.unit.is_empty() {
                request = request.with_field(FIELD_UNIT, self.unit.as_str());
            }
        }
        if let Some(patient_id) = &self.patient_id {
            request = request.with_tag(TAG_PATIENT_ID, patient_id);
        }
        if self.timestamped {
            request = request.with_timestamp(at);
        }

        request
    }
}

/// 模拟场景
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationProfile {
    /// 心率 + 血氧
    Vitals,
    /// 温度、气压、风速三台气象设备
    Weather,
}

impl SimulationProfile {
    pub fn channels(&self) -> Vec<ChannelConfig> {
        match self {
            SimulationProfile::Vitals => vec![ChannelConfig::heart_rate(), ChannelConfig::blood_oxygen()],
            SimulationProfile::Weather => vec![
                Self::weather("dev-temp-001", "temperature", 20..40, "C"),
                Self::weather("dev-press-001", "pressure", 800..1200, "hPa"),
                Self::weather("dev-wind-001", "wind_speed", 0..60, "km/h"),
            ],
        }
    }

    /// 气象读数：两位小数，只带数值字段和时间戳，每 30 秒一条
    fn weather(device_id: &str, quantity: &str, range: Range<i64>, unit: &str) -> ChannelConfig {
        ChannelConfig::new(device_id, quantity, range)
            .with_measurement(WEATHER_MEASUREMENT)
            .with_field(quantity)
            .with_unit(unit)
            .with_decimals(2)
            .without_metadata()
            .with_timestamps()
            .with_fixed_interval(WEATHER_INTERVAL)
    }
}

impl std::str::FromStr for SimulationProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vitals" => Ok(SimulationProfile::Vitals),
            "weather" => Ok(SimulationProfile::Weather),
            other => Err(format!("unknown simulation profile: {}", other)),
        }
    }
}
