use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// 关闭信号类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM
    Term,

    /// SIGINT - Ctrl+C
    Interrupt,

    /// 手动触发
    Manual,
}

/// 信号处理器，把系统信号广播给长时间运行的命令
pub struct SignalHandler {
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
}

impl SignalHandler {
    pub fn new() -> (Self, broadcast::Receiver<ShutdownSignal>) {
        let (tx, rx) = broadcast::channel(16);
        (Self { shutdown_tx: tx }, rx)
    }

    /// 等待系统信号并广播
    #[cfg(unix)]
    pub async fn wait_for_system_signal(&self) -> ShutdownSignal {
        use signal::unix::{signal, SignalKind};

        let received = match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM");
                        ShutdownSignal::Term
                    }
                    _ = signal::ctrl_c() => {
                        info!("Received SIGINT");
                        ShutdownSignal::Interrupt
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl+C only");
                self.wait_for_ctrl_c().await
            }
        };

        let _ = self.shutdown_tx.send(received);
        received
    }

    #[cfg(not(unix))]
    pub async fn wait_for_system_signal(&self) -> ShutdownSignal {
        let received = self.wait_for_ctrl_c().await;
        let _ = self.shutdown_tx.send(received);
        received
    }

    async fn wait_for_ctrl_c(&self) -> ShutdownSignal {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C");
                ShutdownSignal::Interrupt
            }
            Err(e) => {
                // 无法监听信号时只能靠手动触发
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending().await
            }
        }
    }

    /// 手动触发关闭
    pub fn trigger_shutdown(&self) {
        info!("Manual shutdown triggered");
        let _ = self.shutdown_tx.send(ShutdownSignal::Manual);
    }

    /// 订阅关闭信号
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.shutdown_tx.subscribe()
    }
}

/// 等待关闭信号；发送端已关闭时视为手动关闭
pub async fn wait(rx: &mut broadcast::Receiver<ShutdownSignal>) -> ShutdownSignal {
    rx.recv().await.unwrap_or(ShutdownSignal::Manual)
}
