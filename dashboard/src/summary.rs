use chrono::{DateTime, Utc};
use nodewatch_shared::FleetSummary;
use tracing::{debug, warn};

use crate::api::TelemetryApi;
use crate::surface::{SummaryDisplay, SummaryFields};

/// Keeps the fleet counters on screen up to date.
pub struct SummaryAggregator<D: SummaryDisplay> {
    display: D,
    last: Option<SummaryFields>,
    updated_at: Option<DateTime<Utc>>,
}

impl<D: SummaryDisplay> SummaryAggregator<D> {
    pub fn new(display: D) -> Self {
        Self {
            display,
            last: None,
            updated_at: None,
        }
    }

    /// Last values written to the display.
    pub fn current(&self) -> Option<&SummaryFields> {
        self.last.as_ref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Fetch fresh counters. On failure the previously shown values stay.
    pub async fn refresh<A: TelemetryApi>(&mut self, api: &A) -> bool {
        match api.fetch_summary().await {
            Ok(summary) => {
                let fields = format_summary(&summary);
                if self.last.as_ref() != Some(&fields) {
                    self.display.show(&fields);
                    self.last = Some(fields);
                }
                self.updated_at = Some(Utc::now());
                debug!(total = summary.total_nodes, online = summary.online_nodes, "summary refreshed");
                true
            }
            Err(e) => {
                warn!(error = %e, "summary fetch failed");
                false
            }
        }
    }
}

pub fn format_summary(summary: &FleetSummary) -> SummaryFields {
    SummaryFields {
        total: summary.total_nodes.to_string(),
        online: summary.online_nodes.to_string(),
        offline: summary.offline_nodes.to_string(),
        avg_latency: match summary.avg_latency {
            Some(ms) if ms.is_finite() => format!("{ms:.1} ms"),
            _ => "n/a".to_string(),
        },
    }
}
