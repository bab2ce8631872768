use crate::cli::Command;
use crate::shutdown::{self, ShutdownSignal};
use anyhow::{anyhow, bail, Context, Result};
use pulse_client::{ClientError, DataApi, DeviceApi, HttpClient};
use pulse_config::{ConsoleConfig, SimulatorConfig};
use pulse_dashboard::{
    render_device_list, render_snapshot, DashboardPoller, PollerHandle, QueryTemplate,
};
use pulse_simulator::{ChannelConfig, SimulationProfile, Simulator};
use pulse_types::{DeviceUpdate, RegisterDevice};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// 一次命令执行所需的后端与配置
pub struct Console {
    config: ConsoleConfig,
    devices: Arc<dyn DeviceApi>,
    data: Arc<dyn DataApi>,
}

impl Console {
    /// 按配置连接后端
    pub fn connect(config: ConsoleConfig) -> Result<Self> {
        let client = Arc::new(HttpClient::new(&config.api.base_url, config.api.timeout())?);
        Ok(Self::with_backend(config, client.clone(), client))
    }

    pub fn with_backend(
        config: ConsoleConfig,
        devices: Arc<dyn DeviceApi>,
        data: Arc<dyn DataApi>,
    ) -> Self {
        Self {
            config,
            devices,
            data,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// 查询模板；未指定测量名称时用配置中的
    fn query_template(&self, measurement: Option<&str>, device: Option<String>) -> QueryTemplate {
        let dashboard = &self.config.dashboard;
        let measurement = measurement.unwrap_or(&dashboard.measurement);
        let template = QueryTemplate::new(measurement).with_fields(dashboard.fields.clone());
        match device {
            Some(device_id) => template.with_device(device_id),
            None => template,
        }
    }

    fn poller(&self, measurement: Option<&str>, device: Option<String>) -> Result<DashboardPoller> {
        let poller = DashboardPoller::new(self.data.clone(), self.query_template(measurement, device))
            .with_poll_interval(self.config.dashboard.poll_interval())?;
        Ok(poller)
    }
}

/// 执行一条子命令，输出写到 `out`
///
/// `watch` 与 `simulate` 一直运行到收到关闭信号。
pub async fn execute<W: Write>(
    console: &Console,
    command: Command,
    out: &mut W,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) -> Result<()> {
    match command {
        Command::Register {
            device_id,
            model,
            patient_id,
            vital_type,
        } => {
            if device_id.trim().is_empty() {
                bail!("Device ID is required");
            }

            let request = RegisterDevice::new(device_id)
                .with_model(model)
                .with_patient(patient_id)
                .with_vital_type(vital_type);
            let record = console
                .devices
                .register_device(&request)
                .await
                .context("Registration failed")?;

            info!(device_id = %record.device_id, "Device registered");
            writeln!(out, "Device registered successfully: {}", record.device_id)?;
        }

        Command::List => {
            let devices = console
                .devices
                .list_devices()
                .await
                .context("Failed to load devices")?;
            writeln!(out, "{}", render_device_list(&devices))?;
        }

        Command::Update {
            device_id,
            model,
            patient_id,
        } => {
            let update = DeviceUpdate { model, patient_id };
            if update.is_empty() {
                bail!("Nothing to update: pass --model and/or --patient-id");
            }

            let record = console
                .devices
                .update_device(&device_id, &update)
                .await
                .context("Update failed")?;

            info!(device_id = %record.device_id, "Device updated");
            writeln!(out, "Device updated: {}", record.device_id)?;
        }

        Command::Delete { device_id, yes } => {
            if !yes {
                let prompt = format!("Are you sure you want to delete device {}?", device_id);
                let stdin = std::io::stdin();
                if !confirm(&prompt, &mut stdin.lock(), out)? {
                    writeln!(out, "Cancelled")?;
                    return Ok(());
                }
            }

            console
                .devices
                .delete_device(&device_id)
                .await
                .context("Delete failed")?;

            info!(device_id = %device_id, "Device deleted");
            writeln!(out, "Device deleted: {}", device_id)?;
        }

        Command::Data {
            hours,
            device,
            measurement,
            chart,
        } => {
            let hours = hours.unwrap_or(console.config.dashboard.default_window_hours);
            let snapshot = console
                .poller(measurement.as_deref(), device)?
                .fetch(hours)
                .await
                .context("Error fetching data")?;
            write!(out, "{}", render_snapshot(&snapshot, chart))?;
        }

        Command::Watch {
            hours,
            measurement,
            chart,
        } => {
            let view = WatchView {
                hours,
                measurement,
                chart,
            };
            watch(console, view, out, stdin_lines(), shutdown_rx).await?;
        }

        Command::Simulate { profile } => {
            let channels = simulation_channels(&console.config.simulator, profile.as_deref())?;
            let simulator = Simulator::builder(console.data.clone())
                .with_channels(channels)
                .build()?;

            simulator.start().await;
            writeln!(
                out,
                "Simulation started with {} channels. Press Ctrl-C to stop.",
                simulator.channels().count()
            )?;
            out.flush()?;

            shutdown::wait(&mut shutdown_rx).await;
            simulator.stop().await;

            let stats = simulator.stats().await;
            writeln!(out, "Simulation stopped after {} readings", stats.sent)?;
            for channel in &stats.channels {
                writeln!(
                    out,
                    "  {}: {} sent, {} failed",
                    channel.device_id, channel.attempts, channel.failures
                )?;
            }
        }

        Command::ShowConfig => {
            write!(out, "{}", console.config.to_toml()?)?;
        }
    }

    Ok(())
}

/// `watch` 的显示参数
#[derive(Debug, Clone, Default)]
pub struct WatchView {
    pub hours: Option<u32>,
    pub measurement: Option<String>,
    pub chart: bool,
}

/// 持续轮询并在每次拉取后重新渲染，直到收到关闭信号
///
/// `controls` 每行一条操作员指令：数字修改回看窗口，空行立即刷新。
/// 输入结束后继续轮询。
pub async fn watch<W: Write>(
    console: &Console,
    view: WatchView,
    out: &mut W,
    mut controls: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) -> Result<()> {
    let hours = view
        .hours
        .unwrap_or(console.config.dashboard.default_window_hours);
    let handle = console
        .poller(view.measurement.as_deref(), None)?
        .spawn(hours);
    let mut snapshots = handle.subscribe();
    let mut controls_open = true;

    writeln!(
        out,
        "Type a number of hours and press Enter to change the window, or press Enter to refresh."
    )?;
    out.flush()?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    writeln!(out, "{}", render_snapshot(&snapshot, view.chart))?;
                    out.flush()?;
                }
            }
            line = controls.recv(), if controls_open => match line {
                Some(line) => apply_control(&handle, line.trim(), out)?,
                None => {
                    debug!("Control input closed");
                    controls_open = false;
                }
            },
            _ = shutdown::wait(&mut shutdown_rx) => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn apply_control<W: Write>(handle: &PollerHandle, line: &str, out: &mut W) -> Result<()> {
    if line.is_empty() {
        handle.refresh();
        return Ok(());
    }

    match line.parse::<u32>() {
        Ok(hours) => match handle.set_window(hours) {
            Ok(()) => writeln!(out, "Window set to {}h", hours)?,
            Err(e) => writeln!(out, "{}", e)?,
        },
        Err(_) => writeln!(out, "Not a number of hours: {:?}", line)?,
    }
    out.flush()?;
    Ok(())
}

/// 在独立线程上逐行读取标准输入
///
/// 阻塞读取放在普通线程里，进程退出时不必等它结束。
pub fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// 按配置生成模拟通道
pub fn simulation_channels(
    config: &SimulatorConfig,
    profile: Option<&str>,
) -> Result<Vec<ChannelConfig>> {
    let profile: SimulationProfile = profile
        .unwrap_or(&config.profile)
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let channels = profile
        .channels()
        .into_iter()
        .map(|mut channel| {
            // 气象设备保持固定节奏
            if profile == SimulationProfile::Vitals {
                channel = channel
                    .with_interval_ms(config.interval_range())
                    .with_measurement(&config.measurement);
                if channel.first_delay.is_some() {
                    channel = channel.with_first_delay(config.pinned_first_delay());
                }
            }
            if let Some(patient_id) = &config.patient_id {
                channel = channel.with_patient(patient_id);
            }
            channel
        })
        .collect();

    Ok(channels)
}

/// 交互确认，只有 y/yes 算同意
pub fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "{} [y/N] ", prompt)?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        warn!("No confirmation input, treating as no");
        return Ok(false);
    }

    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// 把命令失败转成给操作员看的文本
///
/// 后端返回的结构化错误原样展示。
pub fn report(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client) => format!("{}: {}", err, client.operator_message(&client.to_string())),
        None => format!("{:#}", err),
    }
}
