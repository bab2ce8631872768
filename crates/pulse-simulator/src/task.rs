use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// 可取消的重复任务句柄
///
/// 任务在自身循环中重新排程；取消通过 watch 通道通知，
/// 任务在每次等待和重新排程前检查。句柄被丢弃时发送端随之关闭，
/// 任务同样会退出。
pub struct RepeatingTask {
    name: String,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    /// 启动任务，闭包拿到取消信号的接收端
    pub fn spawn<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(CancelSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(body(CancelSignal { rx: cancel_rx }));

        debug!(task = %name, "Repeating task armed");

        Self {
            name,
            cancel_tx,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 取消后续的排程；已发出的请求不受影响
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
        debug!(task = %self.name, "Repeating task cancelled");
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 取消并等待任务退出
    pub async fn shutdown(self) {
        self.cancel();
        let _ = self.handle.await;
    }
}

/// 取消信号（任务侧）
#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待取消；句柄被丢弃也视为取消
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
