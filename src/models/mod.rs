// Domain models: samples, descriptors, series, windows, stored value lists

mod sample;
mod series;
mod system;
mod value_list;
mod window;

pub use sample::{DataSourceDescriptor, Sample, ValueKind};
pub use series::{Chart, Series, SeriesPoint};
pub use system::SystemSummary;
pub use value_list::{ValueList, ValueListPayload};
pub use window::TimeWindow;
