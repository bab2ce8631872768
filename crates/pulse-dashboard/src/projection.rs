use crate::{DashboardError, Result};
use chrono::{DateTime, Datelike, Duration, DurationRound, TimeZone, Utc};
use pulse_types::{Reading, FIELD_UNIT, FIELD_VALUE, TAG_VITALS_TYPE};
use serde::Serialize;
use tracing::warn;

/// 图表的时间刻度单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Minute,
    Hour,
    Day,
    Week,
}

impl TimeBucket {
    /// 按总跨度选择刻度：<1h 分钟，<1d 小时，<1w 天，否则周
    pub fn from_span(span: Duration) -> Self {
        if span < Duration::hours(1) {
            TimeBucket::Minute
        } else if span < Duration::days(1) {
            TimeBucket::Hour
        } else if span < Duration::weeks(1) {
            TimeBucket::Day
        } else {
            TimeBucket::Week
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TimeBucket::Minute => "minute",
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
        }
    }

    /// 刻度标签格式
    pub fn label_format(&self) -> &'static str {
        match self {
            TimeBucket::Minute => "%H:%M",
            TimeBucket::Hour => "%m-%d %H:00",
            TimeBucket::Day => "%Y-%m-%d",
            TimeBucket::Week => "%Y-%m-%d",
        }
    }

    /// 截断到所在刻度的起点（周从周一开始）
    pub fn truncate(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeBucket::Minute => time.duration_trunc(Duration::minutes(1)).unwrap_or(time),
            TimeBucket::Hour => time.duration_trunc(Duration::hours(1)).unwrap_or(time),
            TimeBucket::Day => time.duration_trunc(Duration::days(1)).unwrap_or(time),
            TimeBucket::Week => {
                let monday = time.date_naive()
                    - Duration::days(time.weekday().num_days_from_monday() as i64);
                monday
                    .and_hms_opt(0, 0, 0)
                    .map(|naive| Utc.from_utc_datetime(&naive))
                    .unwrap_or(time)
            }
        }
    }
}

/// 图表上的一个点
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// 单设备单字段的时间序列，按时间升序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub device_id: String,
    /// 语义标签（vitals_type 标签，缺省为设备 ID）
    pub label: String,
    pub unit: Option<String>,
    pub bucket: TimeBucket,
    pub points: Vec<ChartPoint>,
    /// 因时间戳无法解析而跳过的点数
    pub skipped: usize,
}

impl ChartSeries {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.time)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.time)
    }

    /// 首尾时间差，没有点时为零
    pub fn span(&self) -> Duration {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::zero(),
        }
    }

    pub fn min_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max)
    }

    /// 按刻度求平均，每个刻度一个点
    pub fn averaged(&self) -> Vec<ChartPoint> {
        let mut out: Vec<ChartPoint> = Vec::new();
        let mut count = 0usize;

        for point in &self.points {
            let slot = self.bucket.truncate(point.time);
            match out.last_mut() {
                Some(last) if last.time == slot => {
                    count += 1;
                    last.value += (point.value - last.value) / count as f64;
                }
                _ => {
                    out.push(ChartPoint {
                        time: slot,
                        value: point.value,
                    });
                    count = 1;
                }
            }
        }

        out
    }
}

pub(crate) fn parse_time(device_id: &str, point: &Reading) -> Result<DateTime<Utc>> {
    point
        .timestamp()
        .map_err(|_| DashboardError::InvalidTimestamp {
            device_id: device_id.to_string(),
            time: point.time.clone(),
        })
}

/// 把一台设备的读数投影成可绘制的 `value` 序列
///
/// 没有可绘制的点时返回 None。
pub fn project_series(device_id: &str, points: &[Reading]) -> Option<ChartSeries> {
    let mut skipped = 0;
    let mut series: Vec<ChartPoint> = Vec::new();

    for point in points.iter().filter(|p| p.field == FIELD_VALUE) {
        let Some(value) = point.numeric_value() else {
            continue;
        };
        match parse_time(device_id, point) {
            Ok(time) => series.push(ChartPoint { time, value }),
            Err(e) => {
                warn!(error = %e, "Skipping unplottable point");
                skipped += 1;
            }
        }
    }

    if series.is_empty() {
        return None;
    }

    series.sort_by_key(|p| p.time);

    let span = series[series.len() - 1].time - series[0].time;

    let unit = points
        .iter()
        .find(|p| p.field == FIELD_UNIT)
        .map(Reading::display_value)
        .or_else(|| points.iter().find_map(|p| p.tag(FIELD_UNIT).map(str::to_string)));

    let label = points
        .iter()
        .find_map(|p| p.tag(TAG_VITALS_TYPE))
        .unwrap_or(device_id)
        .to_string();

    Some(ChartSeries {
        device_id: device_id.to_string(),
        label,
        unit,
        bucket: TimeBucket::from_span(span),
        points: series,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(time: &str, value: i64) -> Reading {
        Reading::new(FIELD_VALUE, value, time)
    }

    #[test]
    fn test_series_sorted_ascending() {
        let points = vec![
            at("2024-05-01T10:02:00+00:00", 3),
            at("2024-05-01T10:00:00+00:00", 1),
            at("2024-05-01T10:01:00+00:00", 2),
        ];

        let series = project_series("hr-001", &points).unwrap();
        let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert!(series.start() < series.end());
        assert_eq!(series.span(), Duration::minutes(2));
        assert_eq!(series.bucket, TimeBucket::Minute);
    }

    #[test]
    fn test_empty_series_has_no_bounds() {
        let mut series = project_series("hr-001", &[at("2024-05-01T10:00:00+00:00", 72)]).unwrap();
        series.points.clear();

        assert_eq!(series.start(), None);
        assert_eq!(series.end(), None);
        assert_eq!(series.span(), Duration::zero());
        assert!(series.averaged().is_empty());
    }

    #[test]
    fn test_no_value_field_is_none() {
        let points = vec![
            Reading::new("temperature", 21, "2024-05-01T10:00:00+00:00"),
            Reading::new(FIELD_UNIT, "C", "2024-05-01T10:00:00+00:00"),
        ];
        assert!(project_series("dev-temp-001", &points).is_none());
        assert!(project_series("dev-temp-001", &[]).is_none());
    }

    #[test]
    fn test_non_numeric_values_filtered() {
        let points = vec![Reading::new(FIELD_VALUE, "n/a", "2024-05-01T10:00:00+00:00")];
        assert!(project_series("d1", &points).is_none());
    }

    #[test]
    fn test_unit_and_label_lookup() {
        let points = vec![
            at("2024-05-01T10:00:00+00:00", 72).with_tag(TAG_VITALS_TYPE, "heart_rate"),
            Reading::new(FIELD_UNIT, "bpm", "2024-05-01T10:00:00+00:00"),
        ];
        let series = project_series("hr-001", &points).unwrap();
        assert_eq!(series.unit.as_deref(), Some("bpm"));
        assert_eq!(series.label, "heart_rate");

        let bare = project_series("hr-002", &[at("2024-05-01T10:00:00+00:00", 70)]).unwrap();
        assert_eq!(bare.label, "hr-002");
        assert_eq!(bare.unit, None);
    }

    #[test]
    fn test_unparseable_points_skipped() {
        let points = vec![at("not a time", 1), at("2024-05-01T10:00:00+00:00", 2)];
        let series = project_series("d1", &points).unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.skipped, 1);
    }

    #[test]
    fn test_bucket_from_span() {
        assert_eq!(TimeBucket::from_span(Duration::minutes(59)), TimeBucket::Minute);
        assert_eq!(TimeBucket::from_span(Duration::hours(1)), TimeBucket::Hour);
        assert_eq!(TimeBucket::from_span(Duration::hours(23)), TimeBucket::Hour);
        assert_eq!(TimeBucket::from_span(Duration::days(1)), TimeBucket::Day);
        assert_eq!(TimeBucket::from_span(Duration::days(6)), TimeBucket::Day);
        assert_eq!(TimeBucket::from_span(Duration::weeks(1)), TimeBucket::Week);
    }

    #[test]
    fn test_week_truncates_to_monday() {
        // 2024-05-02 是周四
        let time = Utc.with_ymd_and_hms(2024, 5, 2, 15, 30, 0).unwrap();
        let start = TimeBucket::Week.truncate(time);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 4, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_averaged_per_bucket() {
        let points = vec![
            at("2024-05-01T10:00:10+00:00", 60),
            at("2024-05-01T10:00:40+00:00", 80),
            at("2024-05-01T10:05:00+00:00", 90),
        ];
        let series = project_series("hr-001", &points).unwrap();
        let averaged = series.averaged();
        assert_eq!(averaged.len(), 2);
        assert_eq!(averaged[0].value, 70.0);
        assert_eq!(averaged[1].value, 90.0);
        assert_eq!(series.min_value(), 60.0);
        assert_eq!(series.max_value(), 90.0);
    }
}
