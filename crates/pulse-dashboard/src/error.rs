use std::time::Duration;
use thiserror::Error;

/// 看板错误类型
#[derive(Error, Debug)]
pub enum DashboardError {
    /// 时间戳无法解析
    #[error("Invalid timestamp {time:?} for device {device_id}")]
    InvalidTimestamp { device_id: String, time: String },

    /// 拉取数据失败
    #[error("Fetch failed: {0}")]
    Fetch(#[from] pulse_client::ClientError),

    /// 回看窗口无效
    #[error("Invalid look-back window: {0} hours")]
    InvalidWindow(u32),

    /// 轮询间隔无效
    #[error("Invalid poll interval: {0:?}")]
    InvalidPollInterval(Duration),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
