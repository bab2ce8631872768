use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use pulse_types::{
    DeviceReadings, DeviceRecord, DeviceUpdate, ReadDataRequest, Reading, RegisterDevice,
    WriteDataRequest, TAG_DEVICE_ID,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// 测试用的内存后端
#[derive(Clone, Default)]
pub struct StubBackend {
    pub devices: Arc<Mutex<Vec<DeviceRecord>>>,
    pub writes: Arc<Mutex<Vec<WriteDataRequest>>>,
    pub reads: Arc<Mutex<Vec<ReadDataRequest>>>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<serde_json::Value>)>;

fn detail(status: StatusCode, msg: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(json!({ "detail": msg })))
}

async fn create_device(
    State(stub): State<StubBackend>,
    Json(req): Json<RegisterDevice>,
) -> ApiResult<Json<DeviceRecord>> {
    let mut devices = stub.devices.lock().unwrap();
    if devices.iter().any(|d| d.device_id == req.device_id) {
        return Err(detail(StatusCode::BAD_REQUEST, "Device already exists"));
    }
    let record = DeviceRecord {
        device_id: req.device_id,
        model: Some(req.model),
        patient_id: Some(req.patient_id),
        vital_type: Some(req.vital_type),
        last_active: None,
        status: Some("inactive".to_string()),
    };
    devices.push(record.clone());
    Ok(Json(record))
}

async fn list_devices(State(stub): State<StubBackend>) -> Json<Vec<DeviceRecord>> {
    Json(stub.devices.lock().unwrap().clone())
}

async fn update_device(
    State(stub): State<StubBackend>,
    Path(device_id): Path<String>,
    Json(update): Json<DeviceUpdate>,
) -> ApiResult<Json<DeviceRecord>> {
    let mut devices = stub.devices.lock().unwrap();
    let record = devices
        .iter_mut()
        .find(|d| d.device_id == device_id)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Device not found"))?;
    update.apply_to(record);
    Ok(Json(record.clone()))
}

async fn delete_device(
    State(stub): State<StubBackend>,
    Path(device_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut devices = stub.devices.lock().unwrap();
    let before = devices.len();
    devices.retain(|d| d.device_id != device_id);
    if devices.len() == before {
        return Err(detail(StatusCode::NOT_FOUND, "Device not found"));
    }
    Ok(Json(json!({ "ok": true })))
}

async fn write_data(
    State(stub): State<StubBackend>,
    Json(req): Json<WriteDataRequest>,
) -> Json<serde_json::Value> {
    stub.writes.lock().unwrap().push(req);
    Json(json!({ "message": "Recorded!" }))
}

async fn read_data(
    State(stub): State<StubBackend>,
    Json(req): Json<ReadDataRequest>,
) -> Json<DeviceReadings> {
    stub.reads.lock().unwrap().push(req.clone());

    let mut table = DeviceReadings::new();
    for (i, write) in stub.writes.lock().unwrap().iter().enumerate() {
        if write.measurement != req.measurement_name {
            continue;
        }
        if req.tag.iter().any(|(k, v)| write.tag.get(k) != Some(v)) {
            continue;
        }
        let device_id = write
            .tag
            .get(TAG_DEVICE_ID)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let time = format!("2024-05-01T10:{:02}:00+00:00", i);
        for (field, value) in &write.field {
            let mut reading = Reading::new(field.clone(), value.clone(), time.clone());
            reading.tags = write.tag.clone();
            table.entry(device_id.clone()).or_default().push(reading);
        }
    }
    Json(table)
}

impl StubBackend {
    pub fn router(&self) -> Router {
        Router::new()
            .route("/devices/", post(create_device).get(list_devices))
            .route("/devices/:device_id", put(update_device).delete(delete_device))
            .route("/data/", post(write_data))
            .route("/data/read/", post(read_data))
            .with_state(self.clone())
    }

    /// 在随机端口启动，返回基础地址
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
