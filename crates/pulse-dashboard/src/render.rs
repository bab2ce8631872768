use crate::{project_series, ChartSeries, DashboardSnapshot, TimeSeriesBucket};
use chrono::{DateTime, Local};
use pulse_types::DeviceRecord;
use std::fmt::Write;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// 缺失字段的占位符
pub const PLACEHOLDER: &str = "—";

const BAR_WIDTH: usize = 40;

/// 设备列表中的一行
#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    device_id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Patient ID")]
    patient_id: String,
    #[tabled(rename = "Vitals")]
    vital_type: String,
    #[tabled(rename = "Last Active (Local Time)")]
    last_active: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&DeviceRecord> for DeviceRow {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            device_id: record.device_id.clone(),
            model: or_placeholder(record.model.as_deref()),
            patient_id: or_placeholder(record.patient_id.as_deref()),
            vital_type: or_placeholder(record.vital_type.as_deref()),
            last_active: format_last_active(record.last_active.as_deref()),
            status: status_label(record),
        }
    }
}

/// 原样显示后端状态，需要关注的状态后加 `!`
fn status_label(record: &DeviceRecord) -> String {
    let text = record
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown");
    if record.status().is_alerting() {
        format!("{} !", text)
    } else {
        text.to_string()
    }
}

fn or_placeholder(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

fn local_time(time: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(time).ok()?;
    Some(
        parsed
            .with_timezone(&Local)
            .format("%b %-d, %Y, %H:%M:%S")
            .to_string(),
    )
}

/// 最后活跃时间：缺失为 `Never`，无法解析为 `Invalid date`
pub fn format_last_active(last_active: Option<&str>) -> String {
    match last_active.filter(|t| !t.is_empty()) {
        None => "Never".to_string(),
        Some(time) => local_time(time).unwrap_or_else(|| "Invalid date".to_string()),
    }
}

/// 渲染设备列表
pub fn render_device_list(devices: &[DeviceRecord]) -> String {
    if devices.is_empty() {
        return "No devices found".to_string();
    }

    let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

/// 渲染单台设备的按时间展开表格
pub fn render_device_table(bucket: &TimeSeriesBucket) -> String {
    if bucket.table.is_empty() {
        return format!("{}: no data", bucket.device_id);
    }

    let mut builder = Builder::default();

    let mut header = vec!["Time".to_string()];
    header.extend(bucket.table.fields.iter().cloned());
    builder.push_record(header);

    for row in &bucket.table.rows {
        let mut record = vec![local_time(&row.time).unwrap_or_else(|| row.time.clone())];
        record.extend(row.cells.iter().map(|cell| match cell {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => PLACEHOLDER.to_string(),
            Some(other) => other.to_string(),
        }));
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}

/// 渲染文本柱状图（每个时间刻度一根柱）
pub fn render_chart(series: &ChartSeries) -> String {
    let mut out = String::new();

    let unit = series
        .unit
        .as_deref()
        .map(|u| format!(" ({})", u))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{} · {}{} · per {}",
        series.device_id,
        series.label,
        unit,
        series.bucket.as_str()
    );

    let points = series.averaged();
    let min = series.min_value();
    let max = series.max_value();
    let range = max - min;

    for point in &points {
        let width = if range > 0.0 {
            (((point.value - min) / range) * (BAR_WIDTH - 1) as f64).round() as usize + 1
        } else {
            BAR_WIDTH
        };
        let label = point
            .time
            .with_timezone(&Local)
            .format(series.bucket.label_format())
            .to_string();
        let _ = writeln!(out, "{:>16} │{} {:.1}", label, "█".repeat(width), point.value);
    }

    if series.skipped > 0 {
        let _ = writeln!(out, "({} points skipped: invalid timestamp)", series.skipped);
    }

    out
}

/// 渲染一次拉取的全部设备
pub fn render_snapshot(snapshot: &DashboardSnapshot, with_charts: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Last {}h · fetched {}",
        snapshot.window_hours,
        snapshot.fetched_at.with_timezone(&Local).format("%H:%M:%S")
    );

    if snapshot.devices.is_empty() {
        let _ = writeln!(out, "No data in the selected window");
        return out;
    }

    for bucket in &snapshot.devices {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", bucket.device_id);
        let _ = writeln!(out, "{}", render_device_table(bucket));

        if with_charts {
            if let Some(series) = project_series(&bucket.device_id, &bucket.points) {
                let _ = write!(out, "{}", render_chart(&series));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_types::{DeviceReadings, Reading};

    fn record(device_id: &str) -> DeviceRecord {
        DeviceRecord {
            device_id: device_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_device_list() {
        assert_eq!(render_device_list(&[]), "No devices found");
    }

    #[test]
    fn test_device_list_placeholders() {
        let output = render_device_list(&[record("d1")]);

        assert!(output.contains("Last Active (Local Time)"));
        assert!(output.contains("d1"));
        assert!(output.contains(PLACEHOLDER));
        assert!(output.contains("Never"));
        assert!(output.contains("Unknown"));
    }

    #[test]
    fn test_device_list_values() {
        let mut device = record("hr-001");
        device.model = Some("Polar H10".to_string());
        device.patient_id = Some("p-42".to_string());
        device.vital_type = Some("heart_rate".to_string());
        device.status = Some("active".to_string());
        device.last_active = Some("yesterday".to_string());

        let output = render_device_list(&[device]);
        assert!(output.contains("Polar H10"));
        assert!(output.contains("p-42"));
        assert!(output.contains("heart_rate"));
        assert!(output.contains("active"));
        assert!(output.contains("Invalid date"));
        assert!(!output.contains(PLACEHOLDER));
    }

    #[test]
    fn test_alerting_status_is_marked() {
        let mut offline = record("spo2-001");
        offline.status = Some("Offline".to_string());
        let mut active = record("hr-001");
        active.status = Some("active".to_string());

        assert_eq!(status_label(&offline), "Offline !");
        assert_eq!(status_label(&active), "active");
        assert_eq!(status_label(&record("d1")), "Unknown");

        let output = render_device_list(&[offline, active]);
        assert!(output.contains("Offline !"));
        assert!(!output.contains("active !"));
    }

    #[test]
    fn test_format_last_active() {
        assert_eq!(format_last_active(None), "Never");
        assert_eq!(format_last_active(Some("")), "Never");
        assert_eq!(format_last_active(Some("garbage")), "Invalid date");
        let formatted = format_last_active(Some("2024-05-01T10:00:00+00:00"));
        assert!(formatted.contains("2024"));
    }

    #[test]
    fn test_device_table_missing_cell() {
        let bucket = TimeSeriesBucket::new(
            "hr-001",
            vec![
                Reading::new("value", 72, "2024-05-01T10:00:00+00:00"),
                Reading::new("unit", "bpm", "2024-05-01T10:00:00+00:00"),
                Reading::new("value", 75, "2024-05-01T10:01:00+00:00"),
            ],
        );

        let output = render_device_table(&bucket);
        assert!(output.contains("Time"));
        assert!(output.contains("bpm"));
        assert!(output.contains("75"));
        assert!(output.contains(PLACEHOLDER));
    }

    #[test]
    fn test_chart_has_one_bar_per_bucket() {
        let points = vec![
            Reading::new("value", 60, "2024-05-01T10:00:00+00:00"),
            Reading::new("value", 100, "2024-05-01T10:05:00+00:00"),
            Reading::new("unit", "bpm", "2024-05-01T10:00:00+00:00"),
        ];
        let series = project_series("hr-001", &points).unwrap();

        let output = render_chart(&series);
        assert!(output.starts_with("hr-001"));
        assert!(output.contains("(bpm)"));
        assert!(output.contains("per minute"));
        assert_eq!(output.matches('│').count(), 2);
        assert!(output.contains(&"█".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_render_snapshot() {
        let mut readings = DeviceReadings::new();
        readings.insert(
            "hr-001".to_string(),
            vec![Reading::new("value", 72, "2024-05-01T10:00:00+00:00")],
        );
        let snapshot = DashboardSnapshot::new(readings, 6);

        let output = render_snapshot(&snapshot, true);
        assert!(output.starts_with("Last 6h"));
        assert!(output.contains("hr-001"));
        assert!(output.contains("per minute"));

        let empty = DashboardSnapshot::new(DeviceReadings::new(), 1);
        assert!(render_snapshot(&empty, false).contains("No data"));
    }
}
