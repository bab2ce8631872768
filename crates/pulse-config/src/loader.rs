use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::ConsoleConfig;

/// 未指定路径时查找的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "pulse.toml";

/// 环境变量前缀，如 `PULSE_API__BASE_URL`
pub const ENV_PREFIX: &str = "PULSE";

/// 配置加载器
///
/// 优先级从低到高：内置默认值、TOML 文件、环境变量。
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// 创建配置加载器；`path` 为 None 时尝试当前目录下的默认文件
    pub fn new<P: AsRef<Path>>(path: Option<P>) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 加载并验证配置
    pub fn load(&self) -> Result<ConsoleConfig> {
        let mut builder = Config::builder().add_source(Config::try_from(&ConsoleConfig::default())?);

        match &self.path {
            Some(path) => {
                // 显式指定的文件必须存在
                if !path.exists() {
                    return Err(anyhow!("Config file not found: {}", path.display()));
                }
                builder = builder.add_source(File::new(
                    path.to_str().ok_or_else(|| anyhow!("Invalid config path"))?,
                    FileFormat::Toml,
                ));
            }
            None => {
                builder = builder.add_source(
                    File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
                );
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let console: ConsoleConfig = config.try_deserialize()?;
        console.validate()?;
        Ok(console)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    // 环境变量是进程级的，涉及它的测试串行执行
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_load_partial_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("pulse.toml");
        let config_content = r#"
[api]
base_url = "http://backend:9000"

[simulator]
patient_id = "p-42"
interval_min_ms = 1000
interval_max_ms = 2000

[dashboard]
fields = ["value", "unit"]
"#;
        fs::write(&path, config_content).unwrap();

        let config = ConfigLoader::new(Some(&path))
            .with_env_prefix("PULSE_TEST_FILE")
            .load()
            .unwrap();

        assert_eq!(config.api.base_url, "http://backend:9000");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.simulator.patient_id.as_deref(), Some("p-42"));
        assert_eq!(config.simulator.interval_range(), 1000..2000);
        assert_eq!(config.simulator.measurement, "vitals");
        assert_eq!(config.dashboard.fields, vec!["value", "unit"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = tempdir().unwrap();
        let loader = ConfigLoader::new(Some(temp_dir.path().join("missing.toml")));
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("pulse.toml");
        fs::write(&path, "[dashboard]\npoll_interval_secs = 0\n").unwrap();

        let loader = ConfigLoader::new(Some(&path)).with_env_prefix("PULSE_TEST_INVALID");
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let _lock = ENV_LOCK.lock().unwrap();

        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("pulse.toml");
        fs::write(&path, "[api]\nbase_url = \"http://from-file:8000\"\n").unwrap();

        std::env::set_var("PULSE_TEST_ENV_API__BASE_URL", "http://from-env:8000");
        std::env::set_var("PULSE_TEST_ENV_DASHBOARD__POLL_INTERVAL_SECS", "15");

        let config = ConfigLoader::new(Some(&path))
            .with_env_prefix("PULSE_TEST_ENV")
            .load();

        std::env::remove_var("PULSE_TEST_ENV_API__BASE_URL");
        std::env::remove_var("PULSE_TEST_ENV_DASHBOARD__POLL_INTERVAL_SECS");

        let config = config.unwrap();
        assert_eq!(config.api.base_url, "http://from-env:8000");
        assert_eq!(config.dashboard.poll_interval_secs, 15);
    }
}
