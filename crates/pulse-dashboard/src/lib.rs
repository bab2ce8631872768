pub mod aggregate;
pub mod error;
pub mod poller;
pub mod projection;
pub mod render;

pub use aggregate::{bucket_by_device, group_by_time, TimeRow, TimeSeriesBucket, TimeTable};
pub use error::{DashboardError, Result};
pub use poller::{DashboardPoller, DashboardSnapshot, PollerHandle, QueryTemplate};
pub use projection::{project_series, ChartPoint, ChartSeries, TimeBucket};
pub use render::{
    format_last_active, render_chart, render_device_list, render_device_table, render_snapshot,
    PLACEHOLDER,
};
