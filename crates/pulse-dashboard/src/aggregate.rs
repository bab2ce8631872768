use pulse_types::{DeviceReadings, Reading};
use std::collections::HashMap;

/// 按时间戳展开的表格
///
/// 每个不同的时间戳一行，每个不同的字段一列，顺序都按首次出现排列。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeTable {
    pub fields: Vec<String>,
    pub rows: Vec<TimeRow>,
}

/// 一行：同一时间戳下各字段的值，缺失为 None
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRow {
    pub time: String,
    pub cells: Vec<Option<serde_json::Value>>,
}

impl TimeTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 按时间戳分组（字符串精确匹配，不做容差）
pub fn group_by_time(points: &[Reading]) -> TimeTable {
    let mut fields: Vec<String> = Vec::new();
    let mut field_index: HashMap<&str, usize> = HashMap::new();
    for point in points {
        if !field_index.contains_key(point.field.as_str()) {
            field_index.insert(point.field.as_str(), fields.len());
            fields.push(point.field.clone());
        }
    }

    let mut rows: Vec<TimeRow> = Vec::new();
    let mut row_index: HashMap<&str, usize> = HashMap::new();
    for point in points {
        let row = match row_index.get(point.time.as_str()) {
            Some(&i) => i,
            None => {
                row_index.insert(point.time.as_str(), rows.len());
                rows.push(TimeRow {
                    time: point.time.clone(),
                    cells: vec![None; fields.len()],
                });
                rows.len() - 1
            }
        };

        // 同一时间戳重复的字段以先出现的为准
        let column = field_index[point.field.as_str()];
        let cell = &mut rows[row].cells[column];
        if cell.is_none() {
            *cell = Some(point.value.clone());
        }
    }

    TimeTable { fields, rows }
}

/// 单台设备的分组视图，每次拉取后重建
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesBucket {
    pub device_id: String,
    pub points: Vec<Reading>,
    pub table: TimeTable,
}

impl TimeSeriesBucket {
    pub fn new(device_id: impl Into<String>, points: Vec<Reading>) -> Self {
        let table = group_by_time(&points);
        Self {
            device_id: device_id.into(),
            points,
            table,
        }
    }
}

/// 把后端返回的 device_id → 读数 映射拆成按设备的分组
pub fn bucket_by_device(readings: DeviceReadings) -> Vec<TimeSeriesBucket> {
    readings
        .into_iter()
        .map(|(device_id, points)| TimeSeriesBucket::new(device_id, points))
        .collect()
}
