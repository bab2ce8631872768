use crate::{bucket_by_device, project_series, ChartSeries, DashboardError, Result, TimeSeriesBucket};
use chrono::{DateTime, Utc};
use pulse_client::DataApi;
use pulse_types::{DeviceReadings, ReadDataRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// 每次拉取使用的查询模板（回看窗口单独传入）
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTemplate {
    pub measurement: String,
    pub fields: Vec<String>,
    pub device_id: Option<String>,
}

impl QueryTemplate {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            fields: vec!["All".to_string()],
            device_id: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn request(&self, window_hours: u32) -> ReadDataRequest {
        let mut request =
            ReadDataRequest::new(&self.measurement, window_hours).with_fields(self.fields.clone());
        if let Some(device_id) = &self.device_id {
            request = request.with_tag(pulse_types::TAG_DEVICE_ID, device_id);
        }
        request
    }
}

/// 一次成功拉取的结果
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub window_hours: u32,
    pub devices: Vec<TimeSeriesBucket>,
}

impl DashboardSnapshot {
    pub fn new(readings: DeviceReadings, window_hours: u32) -> Self {
        Self {
            fetched_at: Utc::now(),
            window_hours,
            devices: bucket_by_device(readings),
        }
    }

    pub fn device(&self, device_id: &str) -> Option<&TimeSeriesBucket> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    /// 按需生成某设备的图表序列
    pub fn chart(&self, device_id: &str) -> Option<ChartSeries> {
        self.device(device_id)
            .and_then(|d| project_series(&d.device_id, &d.points))
    }

    pub fn point_count(&self) -> usize {
        self.devices.iter().map(|d| d.points.len()).sum()
    }
}

/// 看板轮询器
pub struct DashboardPoller {
    api: Arc<dyn DataApi>,
    template: QueryTemplate,
    poll_interval: Duration,
}

impl DashboardPoller {
    pub fn new(api: Arc<dyn DataApi>, template: QueryTemplate) -> Self {
        Self {
            api,
            template,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// 设置轮询间隔，不接受零
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Result<Self> {
        if poll_interval.is_zero() {
            return Err(DashboardError::InvalidPollInterval(poll_interval));
        }
        self.poll_interval = poll_interval;
        Ok(self)
    }

    /// 拉取一次
    pub async fn fetch(&self, window_hours: u32) -> Result<DashboardSnapshot> {
        if window_hours == 0 {
            return Err(DashboardError::InvalidWindow(window_hours));
        }

        let request = self.template.request(window_hours);
        let readings = self.api.read_data(&request).await?;
        let snapshot = DashboardSnapshot::new(readings, window_hours);

        debug!(
            devices = snapshot.devices.len(),
            points = snapshot.point_count(),
            hours = window_hours,
            "Dashboard data fetched"
        );

        Ok(snapshot)
    }

    /// 启动后台轮询
    ///
    /// 立即拉取一次，然后按固定间隔重复。修改窗口会立即拉取并重新计时。
    /// 拉取失败只记录日志，保留上一次成功的数据。
    pub fn spawn(self, window_hours: u32) -> PollerHandle {
        let (window_tx, mut window_rx) = watch::channel(window_hours);
        let (snapshot_tx, snapshot_rx) = watch::channel::<Option<Arc<DashboardSnapshot>>>(None);
        let refresh = Arc::new(Notify::new());
        let refresh_signal = refresh.clone();

        info!(
            interval_secs = self.poll_interval.as_secs(),
            hours = window_hours,
            "Dashboard polling started"
        );

        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = window_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        // 新窗口：立即拉取，并从现在起重新计时
                        ticker.reset();
                    }
                    _ = refresh_signal.notified() => {}
                }

                let hours = *window_rx.borrow_and_update();
                match self.fetch(hours).await {
                    Ok(snapshot) => {
                        snapshot_tx.send_replace(Some(Arc::new(snapshot)));
                    }
                    Err(e) => {
                        error!(error = %e, hours = hours, "Error fetching dashboard data");
                    }
                }
            }

            info!("Dashboard polling stopped");
        });

        PollerHandle {
            window_tx,
            snapshot_rx,
            refresh,
            handle,
        }
    }
}

/// 轮询任务句柄，丢弃即停止轮询
pub struct PollerHandle {
    window_tx: watch::Sender<u32>,
    snapshot_rx: watch::Receiver<Option<Arc<DashboardSnapshot>>>,
    refresh: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    /// 修改回看窗口，立即触发一次拉取
    pub fn set_window(&self, window_hours: u32) -> Result<()> {
        if window_hours == 0 {
            return Err(DashboardError::InvalidWindow(window_hours));
        }
        self.window_tx.send_replace(window_hours);
        Ok(())
    }

    pub fn window(&self) -> u32 {
        *self.window_tx.borrow()
    }

    /// 手动刷新一次
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// 最近一次成功拉取的数据
    pub fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DashboardSnapshot>>> {
        self.snapshot_rx.clone()
    }

    pub async fn shutdown(self) {
        let PollerHandle {
            window_tx, handle, ..
        } = self;
        drop(window_tx);
        let _ = handle.await;
    }
}
