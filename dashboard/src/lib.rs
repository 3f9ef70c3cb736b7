//! Live fleet dashboard core: polls a telemetry backend and keeps a map,
//! charts and summary counters in step with it.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod headless;
pub mod placement;
pub mod scheduler;
pub mod selection;
pub mod summary;
pub mod surface;
pub mod topology;

#[cfg(test)]
mod test_support;

pub use api::{HttpTelemetryApi, TelemetryApi};
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardHandle, UiCommand};
pub use error::{ClientSetupError, FetchError};
