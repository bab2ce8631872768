use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Duration;

/// 控制台配置
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 后端 API 配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// 传感器模拟配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// 模拟场景：vitals 或 weather
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
    #[serde(default = "default_interval_min_ms")]
    pub interval_min_ms: u64,
    #[serde(default = "default_interval_max_ms")]
    pub interval_max_ms: u64,
    /// 血氧通道的固定首延迟
    #[serde(default = "default_pinned_first_delay_ms")]
    pub pinned_first_delay_ms: u64,
    #[serde(default)]
    pub patient_id: Option<String>,
}

/// 看板配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default = "default_measurement")]
    pub measurement: String,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_window_hours")]
    pub default_window_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// 默认值函数
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_profile() -> String {
    "vitals".to_string()
}

fn default_measurement() -> String {
    "vitals".to_string()
}

fn default_interval_min_ms() -> u64 {
    30_000
}

fn default_interval_max_ms() -> u64 {
    120_000
}

fn default_pinned_first_delay_ms() -> u64 {
    60_000
}

fn default_fields() -> Vec<String> {
    vec!["All".to_string()]
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_window_hours() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            measurement: default_measurement(),
            interval_min_ms: default_interval_min_ms(),
            interval_max_ms: default_interval_max_ms(),
            pinned_first_delay_ms: default_pinned_first_delay_ms(),
            patient_id: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            measurement: default_measurement(),
            fields: default_fields(),
            poll_interval_secs: default_poll_interval_secs(),
            default_window_hours: default_window_hours(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SimulatorConfig {
    /// 随机间隔窗口 `[min, max)`（毫秒）
    pub fn interval_range(&self) -> Range<u64> {
        self.interval_min_ms..self.interval_max_ms
    }

    pub fn pinned_first_delay(&self) -> Duration {
        Duration::from_millis(self.pinned_first_delay_ms)
    }
}

impl DashboardConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ConsoleConfig {
    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow!("api.base_url must not be empty"));
        }

        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be greater than 0"));
        }

        if self.simulator.interval_min_ms >= self.simulator.interval_max_ms {
            return Err(anyhow!(
                "simulator.interval_min_ms ({}) must be less than interval_max_ms ({})",
                self.simulator.interval_min_ms,
                self.simulator.interval_max_ms
            ));
        }

        if self.dashboard.poll_interval_secs == 0 {
            return Err(anyhow!("dashboard.poll_interval_secs must be greater than 0"));
        }

        if self.dashboard.default_window_hours == 0 {
            return Err(anyhow!("dashboard.default_window_hours must be greater than 0"));
        }

        Ok(())
    }

    /// 导出为 TOML 文本
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_console_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.simulator.interval_range(), 30_000..120_000);
        assert_eq!(config.simulator.pinned_first_delay(), Duration::from_secs(60));
        assert_eq!(config.dashboard.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.dashboard.fields, vec!["All"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ConsoleConfig::default();
        config.api.base_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = ConsoleConfig::default();
        config.simulator.interval_min_ms = 120_000;
        assert!(config.validate().is_err());

        let mut config = ConsoleConfig::default();
        config.dashboard.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ConsoleConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[simulator]"));

        let parsed: ConsoleConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
