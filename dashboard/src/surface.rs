//! Capabilities the dashboard core renders through.
//!
//! The map surface and chart renderer are opaque: the core only hands them
//! positions, style tokens and label/value arrays.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nodewatch_shared::{Coordinates, NodeRecord, StatusStyle, StatusTier};

/// Invoked by the map surface when the user picks a marker.
pub type SelectCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Collector,
    BaseStation,
}

impl MarkerKind {
    pub const fn icon_size(self) -> u32 {
        match self {
            Self::Collector => 60,
            Self::BaseStation => 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSpec {
    pub id: String,
    pub position: Coordinates,
    pub kind: MarkerKind,
}

pub struct MarkerSpec {
    pub node_id: String,
    pub position: Coordinates,
    pub kind: MarkerKind,
    pub style: StatusStyle,
    pub on_select: SelectCallback,
}

impl fmt::Debug for MarkerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerSpec")
            .field("node_id", &self.node_id)
            .field("position", &self.position)
            .field("kind", &self.kind)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub node_id: String,
    pub from: Coordinates,
    pub to: Coordinates,
    pub style: StatusStyle,
    pub weight: f32,
    pub opacity: f32,
}

/// Map drawing capability. Handles it returns stay valid until removed.
pub trait MapSurface {
    fn set_anchor(&mut self, anchor: &AnchorSpec);
    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId;
    fn update_marker(&mut self, marker: MarkerId, style: &StatusStyle);
    fn remove_marker(&mut self, marker: MarkerId);
    fn add_line(&mut self, line: LineSpec) -> LineId;
    fn update_line(&mut self, line: LineId, style: &StatusStyle);
    fn remove_line(&mut self, line: LineId);
}

/// Where a chart lives on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartSlot {
    NodeLatency,
    NodeSignal,
    FleetLatency,
    FleetSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub slot: ChartSlot,
    pub kind: ChartKind,
    pub title: &'static str,
    pub color: &'static str,
    pub fill: Option<&'static str>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartConfig {
    pub fn for_slot(slot: ChartSlot, labels: Vec<String>, values: Vec<f64>) -> Self {
        let (kind, title, color, fill) = match slot {
            ChartSlot::NodeLatency => (ChartKind::Line, "Latency (ms)", "#3498db", None),
            ChartSlot::NodeSignal => (ChartKind::Line, "Signal Strength", "#2ecc71", None),
            ChartSlot::FleetLatency => (
                ChartKind::Line,
                "Avg Latency (ms)",
                "#3498db",
                Some("rgba(52,152,219,0.2)"),
            ),
            ChartSlot::FleetSignal => (ChartKind::Bar, "Signal Strength", "#2ecc71", None),
        };
        Self {
            slot,
            kind,
            title,
            color,
            fill,
            labels,
            values,
        }
    }
}

/// A live chart object.
pub trait Chart: Send {
    /// Replace labels and values and redraw without recreating the chart.
    fn update(&mut self, labels: &[String], values: &[f64]);
    fn destroy(self: Box<Self>);
}

pub trait ChartRenderer: Send + Sync {
    fn create(&self, config: ChartConfig) -> Box<dyn Chart>;
}

/// Field values shown in the detail panel for the selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailFields {
    pub node_id: String,
    pub samples: usize,
    pub latest_latency_ms: Option<f64>,
    pub latest_signal_strength: Option<f64>,
    pub last_sample_at: Option<DateTime<Utc>>,
    /// From the latest snapshot; `None` until one has listed the node.
    pub status: Option<StatusTier>,
    pub packet_loss: Option<f64>,
    pub last_seen: Option<String>,
}

impl DetailFields {
    /// Fill the snapshot fields from `record` if it describes this node.
    pub fn with_record(mut self, record: Option<&NodeRecord>) -> Self {
        if let Some(record) = record.filter(|record| record.id == self.node_id) {
            self.status = Some(record.style().tier);
            self.packet_loss = Some(record.packet_loss);
            self.last_seen = record.last_seen.clone();
        }
        self
    }
}

pub trait DetailPanel: Send {
    fn open(&mut self, node_id: &str);
    fn show_fields(&mut self, fields: &DetailFields);
    fn close(&mut self);
}

/// The four fixed summary fields, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryFields {
    pub total: String,
    pub online: String,
    pub offline: String,
    pub avg_latency: String,
}

pub trait SummaryDisplay {
    fn show(&mut self, fields: &SummaryFields);
}
