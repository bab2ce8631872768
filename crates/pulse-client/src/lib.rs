pub mod api;
pub mod error;
pub mod http;

pub use api::{DataApi, DeviceApi};
pub use error::{ClientError, Result};
pub use http::HttpClient;
