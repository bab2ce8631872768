use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// 初始化日志，只在第一次调用时生效
///
/// 未设置 `RUST_LOG` 时使用配置中的级别。
pub fn init(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter(level).into());

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
    });
}

fn default_filter(level: &str) -> String {
    format!("{level},pulse_client={level},pulse_simulator={level},pulse_dashboard={level}")
}
