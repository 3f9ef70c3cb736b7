use std::sync::Arc;

use nodewatch_shared::{HistoryPoint, LatencySeries, SignalSeries};
use tracing::{debug, warn};

use crate::api::TelemetryApi;
use crate::error::FetchError;
use crate::surface::{Chart, ChartConfig, ChartRenderer, ChartSlot, DetailFields};

/// Chart-ready arrays derived from a history window, in point order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub latency: Vec<f64>,
    pub signal: Vec<f64>,
}

impl ChartSeries {
    pub fn from_points(points: &[HistoryPoint]) -> Self {
        let mut series = Self {
            labels: Vec::with_capacity(points.len()),
            latency: Vec::with_capacity(points.len()),
            signal: Vec::with_capacity(points.len()),
        };
        for point in points {
            series.labels.push(point.label().to_string());
            series.latency.push(point.latency_ms);
            series.signal.push(point.signal_strength);
        }
        series
    }
}

/// Draw `values` into the chart held in `slot`, creating it on first use.
fn draw(
    renderer: &dyn ChartRenderer,
    chart: &mut Option<Box<dyn Chart>>,
    slot: ChartSlot,
    labels: &[String],
    values: &[f64],
) {
    if let Some(existing) = chart.as_mut() {
        existing.update(labels, values);
        return;
    }
    *chart = Some(renderer.create(ChartConfig::for_slot(
        slot,
        labels.to_vec(),
        values.to_vec(),
    )));
}

/// Latency and signal charts for the selected node.
///
/// Charts are updated in place for the lifetime of one selection and torn down
/// by [`TimeSeriesFeed::reset`] when the selection changes.
pub struct TimeSeriesFeed {
    renderer: Arc<dyn ChartRenderer>,
    latency: Option<Box<dyn Chart>>,
    signal: Option<Box<dyn Chart>>,
}

impl TimeSeriesFeed {
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            renderer,
            latency: None,
            signal: None,
        }
    }

    pub async fn load_history<A: TelemetryApi>(
        api: &A,
        id: &str,
        limit: usize,
    ) -> Result<Vec<HistoryPoint>, FetchError> {
        api.fetch_history(id, limit).await
    }

    /// Draw `points` and return the matching detail field values.
    pub fn render_series(&mut self, node_id: &str, points: &[HistoryPoint]) -> DetailFields {
        let series = ChartSeries::from_points(points);
        draw(
            self.renderer.as_ref(),
            &mut self.latency,
            ChartSlot::NodeLatency,
            &series.labels,
            &series.latency,
        );
        draw(
            self.renderer.as_ref(),
            &mut self.signal,
            ChartSlot::NodeSignal,
            &series.labels,
            &series.signal,
        );

        let latest = points.last();
        DetailFields {
            node_id: node_id.to_string(),
            samples: points.len(),
            latest_latency_ms: latest.map(|point| point.latency_ms),
            latest_signal_strength: latest.map(|point| point.signal_strength),
            last_sample_at: latest.and_then(HistoryPoint::recorded_at),
            status: None,
            packet_loss: None,
            last_seen: None,
        }
    }

    /// Destroy both charts so the next render starts from scratch.
    pub fn reset(&mut self) {
        if let Some(chart) = self.latency.take() {
            chart.destroy();
        }
        if let Some(chart) = self.signal.take() {
            chart.destroy();
        }
    }

    pub fn has_charts(&self) -> bool {
        self.latency.is_some() || self.signal.is_some()
    }
}

impl Drop for TimeSeriesFeed {
    fn drop(&mut self) {
        self.reset();
    }
}

/// Fleet-wide latency and signal charts, independent of selection.
pub struct FleetCharts {
    renderer: Arc<dyn ChartRenderer>,
    latency: Option<Box<dyn Chart>>,
    signal: Option<Box<dyn Chart>>,
}

impl FleetCharts {
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            renderer,
            latency: None,
            signal: None,
        }
    }

    /// Fetch both series and redraw whichever arrived. A failed fetch leaves
    /// its chart as it was.
    pub async fn refresh<A: TelemetryApi>(&mut self, api: &A) {
        let (latency, signal) =
            futures::future::join(api.fetch_latency_series(), api.fetch_signal_series()).await;

        match latency {
            Ok(series) => self.show_latency(series),
            Err(e) => warn!(error = %e, "failed to refresh fleet latency chart"),
        }
        match signal {
            Ok(series) => self.show_signal(series),
            Err(e) => warn!(error = %e, "failed to refresh fleet signal chart"),
        }
    }

    fn show_latency(&mut self, series: LatencySeries) {
        let (labels, values) = aligned(series.labels, series.values, "latency");
        draw(
            self.renderer.as_ref(),
            &mut self.latency,
            ChartSlot::FleetLatency,
            &labels,
            &values,
        );
    }

    fn show_signal(&mut self, series: SignalSeries) {
        let (labels, values) = aligned(series.nodes, series.signals, "signal");
        draw(
            self.renderer.as_ref(),
            &mut self.signal,
            ChartSlot::FleetSignal,
            &labels,
            &values,
        );
    }
}

impl Drop for FleetCharts {
    fn drop(&mut self) {
        if let Some(chart) = self.latency.take() {
            chart.destroy();
        }
        if let Some(chart) = self.signal.take() {
            chart.destroy();
        }
    }
}

fn aligned(mut labels: Vec<String>, mut values: Vec<f64>, series: &str) -> (Vec<String>, Vec<f64>) {
    if labels.len() != values.len() {
        debug!(
            series,
            labels = labels.len(),
            values = values.len(),
            "fleet series lengths differ, truncating"
        );
        let len = labels.len().min(values.len());
        labels.truncate(len);
        values.truncate(len);
    }
    (labels, values)
}
