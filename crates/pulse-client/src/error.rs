use thiserror::Error;

/// 客户端错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    /// 网络/传输错误
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 后端返回的错误（保留结构化内容）
    #[error("Backend returned {status}: {body}")]
    Api {
        status: u16,
        body: serde_json::Value,
    },

    /// 响应体无法解析
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// 配置的地址无效
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

/// 客户端结果类型
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// 由后端响应构造错误
    pub fn api(status: u16, raw_body: &str) -> Self {
        let body = serde_json::from_str(raw_body)
            .unwrap_or_else(|_| serde_json::Value::String(raw_body.to_string()));
        ClientError::Api { status, body }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// 给操作员看的错误信息
    ///
    /// 结构化内容按缩进 JSON 输出，字符串原样输出。
    pub fn operator_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Api { body, .. } => match body {
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
                }
                serde_json::Value::String(s) if !s.is_empty() => s.clone(),
                _ => fallback.to_string(),
            },
            _ => fallback.to_string(),
        }
    }
}
