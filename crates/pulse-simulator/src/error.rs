use thiserror::Error;

/// 模拟器错误类型
#[derive(Error, Debug)]
pub enum SimulatorError {
    /// 通道配置无效
    #[error("Invalid channel {channel}: {reason}")]
    InvalidChannel { channel: String, reason: String },

    /// 没有配置任何通道
    #[error("No channels configured")]
    NoChannels,
}

pub type Result<T> = std::result::Result<T, SimulatorError>;

impl SimulatorError {
    pub fn invalid_channel(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        SimulatorError::InvalidChannel {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}
