//! Recording fakes for the capability traits and the telemetry backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use nodewatch_shared::{
    Coordinates, FleetSummary, HistoryPoint, LatencySeries, SignalSeries, Snapshot, StatusStyle,
};
use tokio::sync::Notify;

use crate::api::TelemetryApi;
use crate::error::FetchError;
use crate::surface::{
    AnchorSpec, Chart, ChartConfig, ChartRenderer, ChartSlot, DetailFields, DetailPanel, LineId,
    LineSpec, MapSurface, MarkerId, SelectCallback, SummaryDisplay, SummaryFields,
};

#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    SetAnchor,
    AddMarker(String),
    UpdateMarker(MarkerId),
    RemoveMarker(MarkerId),
    AddLine(String),
    UpdateLine(LineId),
    RemoveLine(LineId),
}

pub struct RecordedMarker {
    pub node_id: String,
    pub position: Coordinates,
    pub style: StatusStyle,
    pub on_select: SelectCallback,
}

#[derive(Default)]
pub struct RecordingMap {
    next_id: u64,
    pub anchor: Option<AnchorSpec>,
    pub markers: HashMap<MarkerId, RecordedMarker>,
    pub lines: HashMap<LineId, LineSpec>,
    pub calls: Vec<MapCall>,
}

impl RecordingMap {
    pub fn count(&self, predicate: impl Fn(&MapCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn marker_for(&self, node_id: &str) -> Option<&RecordedMarker> {
        self.markers.values().find(|marker| marker.node_id == node_id)
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MapSurface for RecordingMap {
    fn set_anchor(&mut self, anchor: &AnchorSpec) {
        self.anchor = Some(anchor.clone());
        self.calls.push(MapCall::SetAnchor);
    }

    fn add_marker(&mut self, marker: crate::surface::MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next());
        self.calls.push(MapCall::AddMarker(marker.node_id.clone()));
        self.markers.insert(
            id,
            RecordedMarker {
                node_id: marker.node_id,
                position: marker.position,
                style: marker.style,
                on_select: marker.on_select,
            },
        );
        id
    }

    fn update_marker(&mut self, marker: MarkerId, style: &StatusStyle) {
        self.calls.push(MapCall::UpdateMarker(marker));
        if let Some(recorded) = self.markers.get_mut(&marker) {
            recorded.style = *style;
        }
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.calls.push(MapCall::RemoveMarker(marker));
        self.markers.remove(&marker);
    }

    fn add_line(&mut self, line: LineSpec) -> LineId {
        let id = LineId(self.next());
        self.calls.push(MapCall::AddLine(line.node_id.clone()));
        self.lines.insert(id, line);
        id
    }

    fn update_line(&mut self, line: LineId, style: &StatusStyle) {
        self.calls.push(MapCall::UpdateLine(line));
        if let Some(recorded) = self.lines.get_mut(&line) {
            recorded.style = *style;
        }
    }

    fn remove_line(&mut self, line: LineId) {
        self.calls.push(MapCall::RemoveLine(line));
        self.lines.remove(&line);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    Created {
        chart: u64,
        slot: ChartSlot,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Updated {
        chart: u64,
        slot: ChartSlot,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Destroyed {
        chart: u64,
        slot: ChartSlot,
    },
}

#[derive(Clone, Default)]
pub struct RecordingCharts {
    log: Arc<Mutex<Vec<ChartEvent>>>,
    next_id: Arc<AtomicU64>,
}

impl RecordingCharts {
    pub fn events(&self) -> Vec<ChartEvent> {
        self.log.lock().expect("chart log").clone()
    }

    pub fn created(&self, slot: ChartSlot) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, ChartEvent::Created { slot: s, .. } if *s == slot))
            .count()
    }

    pub fn destroyed(&self, slot: ChartSlot) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, ChartEvent::Destroyed { slot: s, .. } if *s == slot))
            .count()
    }

    pub fn updated(&self, slot: ChartSlot) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, ChartEvent::Updated { slot: s, .. } if *s == slot))
            .count()
    }

    pub fn live(&self, slot: ChartSlot) -> usize {
        self.created(slot) - self.destroyed(slot)
    }

    /// Labels and values most recently drawn into `slot`.
    pub fn latest(&self, slot: ChartSlot) -> Option<(Vec<String>, Vec<f64>)> {
        self.events().into_iter().rev().find_map(|event| match event {
            ChartEvent::Created {
                slot: s,
                labels,
                values,
                ..
            }
            | ChartEvent::Updated {
                slot: s,
                labels,
                values,
                ..
            } if s == slot => Some((labels, values)),
            _ => None,
        })
    }
}

struct RecordingChart {
    id: u64,
    slot: ChartSlot,
    log: Arc<Mutex<Vec<ChartEvent>>>,
}

impl Chart for RecordingChart {
    fn update(&mut self, labels: &[String], values: &[f64]) {
        self.log.lock().expect("chart log").push(ChartEvent::Updated {
            chart: self.id,
            slot: self.slot,
            labels: labels.to_vec(),
            values: values.to_vec(),
        });
    }

    fn destroy(self: Box<Self>) {
        self.log.lock().expect("chart log").push(ChartEvent::Destroyed {
            chart: self.id,
            slot: self.slot,
        });
    }
}

impl ChartRenderer for RecordingCharts {
    fn create(&self, config: ChartConfig) -> Box<dyn Chart> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.lock().expect("chart log").push(ChartEvent::Created {
            chart: id,
            slot: config.slot,
            labels: config.labels,
            values: config.values,
        });
        Box::new(RecordingChart {
            id,
            slot: config.slot,
            log: Arc::clone(&self.log),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Opened(String),
    Fields(DetailFields),
    Closed,
}

#[derive(Clone, Default)]
pub struct RecordingPanel {
    log: Arc<Mutex<Vec<PanelEvent>>>,
}

impl RecordingPanel {
    pub fn events(&self) -> Vec<PanelEvent> {
        self.log.lock().expect("panel log").clone()
    }

    pub fn last_fields(&self) -> Option<DetailFields> {
        self.events().into_iter().rev().find_map(|event| match event {
            PanelEvent::Fields(fields) => Some(fields),
            _ => None,
        })
    }

    pub fn field_updates_for(&self, node_id: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, PanelEvent::Fields(fields) if fields.node_id == node_id))
            .count()
    }

    pub fn is_open(&self) -> bool {
        self.events()
            .iter()
            .rev()
            .find_map(|event| match event {
                PanelEvent::Opened(_) => Some(true),
                PanelEvent::Closed => Some(false),
                PanelEvent::Fields(_) => None,
            })
            .unwrap_or(false)
    }
}

impl DetailPanel for RecordingPanel {
    fn open(&mut self, node_id: &str) {
        self.log
            .lock()
            .expect("panel log")
            .push(PanelEvent::Opened(node_id.to_string()));
    }

    fn show_fields(&mut self, fields: &DetailFields) {
        self.log
            .lock()
            .expect("panel log")
            .push(PanelEvent::Fields(fields.clone()));
    }

    fn close(&mut self) {
        self.log.lock().expect("panel log").push(PanelEvent::Closed);
    }
}

#[derive(Clone, Default)]
pub struct RecordingSummary {
    shown: Arc<Mutex<Vec<SummaryFields>>>,
}

impl RecordingSummary {
    pub fn shown(&self) -> Vec<SummaryFields> {
        self.shown.lock().expect("summary log").clone()
    }
}

impl SummaryDisplay for RecordingSummary {
    fn show(&mut self, fields: &SummaryFields) {
        self.shown.lock().expect("summary log").push(fields.clone());
    }
}

/// In-memory backend. Unset responses fail with HTTP 503; history requests for
/// a gated id wait until the gate is opened.
#[derive(Default)]
pub struct FakeApi {
    nodes: Mutex<Option<Snapshot>>,
    history: Mutex<HashMap<String, Vec<HistoryPoint>>>,
    latency: Mutex<Option<LatencySeries>>,
    signal: Mutex<Option<SignalSeries>>,
    summary: Mutex<Option<FleetSummary>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    history_calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn set_nodes(&self, snapshot: Option<Snapshot>) {
        *self.nodes.lock().expect("nodes") = snapshot;
    }

    pub fn set_history(&self, id: &str, points: Vec<HistoryPoint>) {
        self.history
            .lock()
            .expect("history")
            .insert(id.to_string(), points);
    }

    pub fn clear_history(&self, id: &str) {
        self.history.lock().expect("history").remove(id);
    }

    pub fn set_latency(&self, series: Option<LatencySeries>) {
        *self.latency.lock().expect("latency") = series;
    }

    pub fn set_signal(&self, series: Option<SignalSeries>) {
        *self.signal.lock().expect("signal") = series;
    }

    pub fn set_summary(&self, summary: Option<FleetSummary>) {
        *self.summary.lock().expect("summary") = summary;
    }

    /// Hold history responses for `id` until the returned gate is notified.
    pub fn gate_history(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("gates")
            .insert(id.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn history_calls(&self) -> Vec<String> {
        self.history_calls.lock().expect("history calls").clone()
    }
}

fn unavailable(endpoint: &str) -> FetchError {
    FetchError::Status {
        endpoint: endpoint.to_string(),
        status: 503,
    }
}

impl TelemetryApi for FakeApi {
    async fn fetch_nodes(&self) -> Result<Snapshot, FetchError> {
        self.nodes
            .lock()
            .expect("nodes")
            .clone()
            .ok_or_else(|| unavailable("/api/nodes"))
    }

    async fn fetch_history(&self, id: &str, _limit: usize) -> Result<Vec<HistoryPoint>, FetchError> {
        self.history_calls
            .lock()
            .expect("history calls")
            .push(id.to_string());
        let gate = self.gates.lock().expect("gates").get(id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.history
            .lock()
            .expect("history")
            .get(id)
            .cloned()
            .ok_or_else(|| unavailable("/api/nodes/{id}/history"))
    }

    async fn fetch_latency_series(&self) -> Result<LatencySeries, FetchError> {
        self.latency
            .lock()
            .expect("latency")
            .clone()
            .ok_or_else(|| unavailable("/api/metrics/latency"))
    }

    async fn fetch_signal_series(&self) -> Result<SignalSeries, FetchError> {
        self.signal
            .lock()
            .expect("signal")
            .clone()
            .ok_or_else(|| unavailable("/api/metrics/signal"))
    }

    async fn fetch_summary(&self) -> Result<FleetSummary, FetchError> {
        self.summary
            .lock()
            .expect("summary")
            .clone()
            .ok_or_else(|| unavailable("/api/summary"))
    }
}
