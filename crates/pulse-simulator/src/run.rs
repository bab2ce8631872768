use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 模拟运行状态
///
/// 唯一的权威状态，所有定时回调在触发时读取，而不是在排程时捕获。
/// 每次启动递增 `generation`，上一轮残留的回调据此识别自己已过期。
#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
    generation: AtomicU64,
    sent: AtomicU64,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始新一轮运行，返回本轮的 generation；已在运行时返回 None
    pub fn begin(&self) -> Option<u64> {
        if self.running.load(Ordering::SeqCst) {
            return None;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.store(0, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Some(generation)
    }

    /// 结束运行；原本未运行时返回 false
    pub fn end(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 指定 generation 是否仍是当前活动的运行
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_running() && self.generation.load(Ordering::SeqCst) == generation
    }

    /// 记录一次发送尝试，返回累计数
    pub fn record_attempt(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}
