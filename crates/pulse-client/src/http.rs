use crate::{ClientError, DataApi, DeviceApi, Result};
use async_trait::async_trait;
use pulse_types::{
    DeviceReadings, DeviceRecord, DeviceUpdate, ReadDataRequest, RegisterDevice, WriteDataRequest,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// 基于 reqwest 的后端客户端
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClient {
    /// 创建客户端
    ///
    /// # 参数
    /// * `base_url` - 后端地址，如 `http://localhost:8000` 或 `http://host/api`
    /// * `timeout` - 单次请求超时
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(base_url = %base_url, "HTTP client created");

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn device_url(&self, device_id: &str) -> String {
        self.url(&format!("/devices/{}", urlencoding::encode(device_id)))
    }

    /// 检查状态码并返回响应体
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = %status, body = %body, "Backend rejected request");
            return Err(ClientError::api(status.as_u16(), &body));
        }

        Ok(body)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DeviceApi for HttpClient {
    async fn register_device(&self, device: &RegisterDevice) -> Result<DeviceRecord> {
        info!(device_id = %device.device_id, "Registering device");

        let response = self
            .client
            .post(self.url("/devices/"))
            .json(device)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        debug!("Listing devices");

        let response = self.client.get(self.url("/devices/")).send().await?;
        Self::decode(response).await
    }

    async fn update_device(&self, device_id: &str, update: &DeviceUpdate) -> Result<DeviceRecord> {
        info!(device_id = %device_id, "Updating device");

        let response = self
            .client
            .put(self.device_url(device_id))
            .json(update)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn delete_device(&self, device_id: &str) -> Result<()> {
        info!(device_id = %device_id, "Deleting device");

        let response = self
            .client
            .delete(self.device_url(device_id))
            .send()
            .await?;

        Self::read_body(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DataApi for HttpClient {
    async fn write_data(&self, data: &WriteDataRequest) -> Result<()> {
        debug!(
            measurement = %data.measurement,
            device_id = ?data.device_id(),
            "Writing reading"
        );

        let response = self
            .client
            .post(self.url("/data/"))
            .json(data)
            .send()
            .await?;

        // 后端返回 `{"message": "Recorded!"}`，内容无需解析
        Self::read_body(response).await?;
        Ok(())
    }

    async fn read_data(&self, query: &ReadDataRequest) -> Result<DeviceReadings> {
        debug!(
            measurement = %query.measurement_name,
            hours = query.time_interval,
            "Reading time-series data"
        );

        let response = self
            .client
            .post(self.url("/data/read/"))
            .json(query)
            .send()
            .await?;

        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let client = HttpClient::new("http://localhost:8000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/devices/"), "http://localhost:8000/api/devices/");
    }

    #[test]
    fn test_device_id_is_encoded() {
        let client = HttpClient::new("http://localhost:8000", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.device_url("ward 3/bed 1"),
            "http://localhost:8000/devices/ward%203%2Fbed%201"
        );
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let err = HttpClient::new("/api", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }
}
