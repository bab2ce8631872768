pub mod device;
pub mod reading;
pub mod request;

pub use device::{DeviceRecord, DeviceStatus, DeviceUpdate, RegisterDevice};
pub use reading::{DeviceReadings, Reading, FIELD_STATUS, FIELD_UNIT, FIELD_VALUE, TAG_DEVICE_ID, TAG_PATIENT_ID, TAG_VITALS_TYPE};
pub use request::{FieldSelector, ReadDataRequest, WriteDataRequest};
