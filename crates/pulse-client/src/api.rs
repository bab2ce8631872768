use crate::Result;
use async_trait::async_trait;
use pulse_types::{
    DeviceReadings, DeviceRecord, DeviceUpdate, ReadDataRequest, RegisterDevice, WriteDataRequest,
};

/// 设备管理接口
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// 注册设备
    async fn register_device(&self, device: &RegisterDevice) -> Result<DeviceRecord>;

    /// 列出所有设备
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>>;

    /// 更新设备可编辑字段
    async fn update_device(&self, device_id: &str, update: &DeviceUpdate) -> Result<DeviceRecord>;

    /// 删除设备
    async fn delete_device(&self, device_id: &str) -> Result<()>;
}

/// 时序数据接口
#[async_trait]
pub trait DataApi: Send + Sync {
    /// 写入一条读数
    async fn write_data(&self, data: &WriteDataRequest) -> Result<()>;

    /// 读取回看窗口内的读数
    async fn read_data(&self, query: &ReadDataRequest) -> Result<DeviceReadings>;
}
