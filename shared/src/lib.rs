pub mod geo;
pub mod history;
pub mod metrics;
pub mod node;
pub mod status;

pub use geo::{COLLECTOR_ID, COLLECTOR_POSITION, Coordinates};
pub use history::{HistoryPoint, HistoryResponse, time_of_day_label};
pub use metrics::{FleetSummary, LatencySeries, SignalSeries};
pub use node::{NodeRecord, Snapshot};
pub use status::{StatusStyle, StatusTier, classify};
