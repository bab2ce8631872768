use crate::channel::ChannelConfig;
use crate::task::{CancelSignal, RepeatingTask};
use crate::{Jitter, Result, RunState, SimulatorError};
use chrono::Utc;
use pulse_client::DataApi;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// 单个通道的运行时状态
struct Channel {
    config: ChannelConfig,
    last_value: RwLock<Option<f64>>,
    attempts: AtomicU64,
    failures: AtomicU64,
}

impl Channel {
    fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            last_value: RwLock::new(None),
            attempts: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    async fn reset(&self) {
        *self.last_value.write().await = None;
        self.attempts.store(0, Ordering::SeqCst);
        self.failures.store(0, Ordering::SeqCst);
    }
}

/// 模拟统计快照
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStats {
    pub running: bool,
    pub sent: u64,
    pub channels: Vec<ChannelStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    pub device_id: String,
    pub last_value: Option<f64>,
    pub attempts: u64,
    pub failures: u64,
}

/// 传感器模拟器
///
/// 为每个通道维护一个随机间隔的重复任务，生成读数并提交给后端。
/// 同一通道内的提交严格串行，不同通道之间并发。
pub struct Simulator {
    channels: Vec<Arc<Channel>>,
    sink: Arc<dyn DataApi>,
    jitter: Arc<Jitter>,
    run: Arc<RunState>,
    tasks: Mutex<Vec<RepeatingTask>>,
}

impl Simulator {
    pub fn builder(sink: Arc<dyn DataApi>) -> SimulatorBuilder {
        SimulatorBuilder::new(sink)
    }

    /// 启动模拟
    ///
    /// 已在运行时不做任何事并返回 false。
    pub async fn start(&self) -> bool {
        let mut tasks = self.tasks.lock().await;

        if self.run.is_running() {
            warn!("Simulation is already running");
            return false;
        }

        // 清理上一轮遗留的定时器
        for task in tasks.drain(..) {
            if !task.is_finished() {
                debug!(task = %task.name(), "Cancelling leftover channel task");
            }
            task.cancel();
        }

        let generation = match self.run.begin() {
            Some(generation) => generation,
            None => return false,
        };
        let started_at = Instant::now();

        for channel in &self.channels {
            channel.reset().await;

            let ctx = ChannelContext {
                channel: channel.clone(),
                sink: self.sink.clone(),
                jitter: self.jitter.clone(),
                run: self.run.clone(),
                generation,
                started_at,
            };
            tasks.push(RepeatingTask::spawn(
                channel.config.device_id.clone(),
                move |cancel| ctx.run(cancel),
            ));
        }

        info!(
            generation = generation,
            channels = self.channels.len(),
            "Simulation started"
        );
        true
    }

    /// 停止模拟，取消所有待触发的定时器
    ///
    /// 未运行时为空操作并返回 false。
    pub async fn stop(&self) -> bool {
        let mut tasks = self.tasks.lock().await;

        if !self.run.end() {
            debug!("Simulation is not running");
            return false;
        }

        for task in tasks.drain(..) {
            task.cancel();
        }

        info!(sent = self.run.sent(), "Simulation stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.run.is_running()
    }

    /// 本轮已尝试发送的读数数量
    pub fn sent(&self) -> u64 {
        self.run.sent()
    }

    pub async fn stats(&self) -> SimulationStats {
        let mut channels = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            channels.push(ChannelStats {
                device_id: channel.config.device_id.clone(),
                last_value: *channel.last_value.read().await,
                attempts: channel.attempts.load(Ordering::SeqCst),
                failures: channel.failures.load(Ordering::SeqCst),
            });
        }

        SimulationStats {
            running: self.run.is_running(),
            sent: self.run.sent(),
            channels,
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.channels.iter().map(|c| &c.config)
    }
}

impl Drop for Simulator {
    // 任务句柄随之丢弃，所有待触发的定时器一并取消
    fn drop(&mut self) {
        self.run.end();
    }
}

/// 一个通道任务所需的全部上下文
struct ChannelContext {
    channel: Arc<Channel>,
    sink: Arc<dyn DataApi>,
    jitter: Arc<Jitter>,
    run: Arc<RunState>,
    generation: u64,
    started_at: Instant,
}

impl ChannelContext {
    async fn run(self, mut cancel: CancelSignal) {
        let config = &self.channel.config;

        if cancel.is_cancelled() || !self.run.is_current(self.generation) {
            return;
        }

        // 启动时立即发送一条
        self.fire().await;

        // 固定首延迟从 start() 时刻起算，随机首延迟从首条发送结束起算
        let (mut anchor, mut delay) = match config.first_delay {
            Some(pinned) => (self.started_at, pinned),
            None => (Instant::now(), self.jitter.delay(&config.interval_ms)),
        };

        loop {
            debug!(
                device_id = %config.device_id,
                delay_ms = delay.as_millis() as u64,
                "Next reading scheduled"
            );

            tokio::select! {
                _ = tokio::time::sleep_until(anchor + delay) => {}
                _ = cancel.cancelled() => break,
            }

            if cancel.is_cancelled() || !self.run.is_current(self.generation) {
                break;
            }

            self.fire().await;

            anchor = Instant::now();
            delay = self.jitter.delay(&config.interval_ms);
        }

        debug!(device_id = %config.device_id, "Channel loop exited");
    }

    /// 生成并提交一条读数；失败只记录日志
    async fn fire(&self) {
        let config = &self.channel.config;
        let value = match config.decimals {
            Some(decimals) => self.jitter.decimal(&config.value_range, decimals),
            None => self.jitter.value(&config.value_range) as f64,
        };
        let reading = config.reading(value, Utc::now());

        *self.channel.last_value.write().await = Some(value);
        self.channel.attempts.fetch_add(1, Ordering::SeqCst);
        let sent = self.run.record_attempt();

        match self.sink.write_data(&reading).await {
            Ok(()) => {
                info!(
                    device_id = %config.device_id,
                    value = value,
                    unit = %config.unit,
                    sent = sent,
                    "Simulated reading sent"
                );
            }
            Err(e) => {
                self.channel.failures.fetch_add(1, Ordering::SeqCst);
                warn!(
                    device_id = %config.device_id,
                    error = %e,
                    "Failed to send simulated reading"
                );
            }
        }
    }
}

/// 模拟器构建器
pub struct SimulatorBuilder {
    sink: Arc<dyn DataApi>,
    channels: Vec<ChannelConfig>,
    jitter: Option<Jitter>,
}

impl SimulatorBuilder {
    pub fn new(sink: Arc<dyn DataApi>) -> Self {
        Self {
            sink,
            channels: Vec::new(),
            jitter: None,
        }
    }

    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_channels(mut self, channels: impl IntoIterator<Item = ChannelConfig>) -> Self {
        self.channels.extend(channels);
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = Some(jitter);
        self
    }

    pub fn build(self) -> Result<Simulator> {
        if self.channels.is_empty() {
            return Err(SimulatorError::NoChannels);
        }

        for (i, channel) in self.channels.iter().enumerate() {
            channel.validate()?;
            if self.channels[..i].iter().any(|c| c.device_id == channel.device_id) {
                return Err(SimulatorError::invalid_channel(
                    &channel.device_id,
                    "duplicate device_id",
                ));
            }
        }

        Ok(Simulator {
            channels: self.channels.into_iter().map(|c| Arc::new(Channel::new(c))).collect(),
            sink: self.sink,
            jitter: Arc::new(self.jitter.unwrap_or_default()),
            run: Arc::new(RunState::new()),
            tasks: Mutex::new(Vec::new()),
        })
    }
}
