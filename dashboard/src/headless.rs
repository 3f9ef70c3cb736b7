//! Surfaces that render by logging, for running the dashboard without a UI.

use std::sync::atomic::{AtomicU64, Ordering};

use nodewatch_shared::{StatusStyle, StatusTier};
use tracing::info;

use crate::surface::{
    AnchorSpec, Chart, ChartConfig, ChartRenderer, ChartSlot, DetailFields, DetailPanel, LineId,
    LineSpec, MapSurface, MarkerId, MarkerSpec, SummaryDisplay, SummaryFields,
};

#[derive(Debug, Default)]
pub struct LogMap {
    next_id: u64,
}

impl LogMap {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MapSurface for LogMap {
    fn set_anchor(&mut self, anchor: &AnchorSpec) {
        info!(
            id = %anchor.id,
            x = anchor.position.x,
            y = anchor.position.y,
            icon_size = anchor.kind.icon_size(),
            "map anchor placed"
        );
    }

    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next());
        info!(
            node = %marker.node_id,
            x = marker.position.x,
            y = marker.position.y,
            status = marker.style.tier.as_str(),
            color = marker.style.color,
            icon_size = marker.kind.icon_size(),
            "marker added"
        );
        id
    }

    fn update_marker(&mut self, marker: MarkerId, style: &StatusStyle) {
        info!(marker = marker.0, status = style.tier.as_str(), color = style.color, "marker restyled");
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        info!(marker = marker.0, "marker removed");
    }

    fn add_line(&mut self, line: LineSpec) -> LineId {
        let id = LineId(self.next());
        info!(node = %line.node_id, dashed = line.style.dashed, "link added");
        id
    }

    fn update_line(&mut self, line: LineId, style: &StatusStyle) {
        info!(line = line.0, dash = style.dash_pattern().unwrap_or("solid"), "link restyled");
    }

    fn remove_line(&mut self, line: LineId) {
        info!(line = line.0, "link removed");
    }
}

#[derive(Debug, Default)]
pub struct LogChartRenderer {
    next_id: AtomicU64,
}

impl ChartRenderer for LogChartRenderer {
    fn create(&self, config: ChartConfig) -> Box<dyn Chart> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            chart = id,
            slot = ?config.slot,
            kind = ?config.kind,
            title = config.title,
            points = config.values.len(),
            "chart created"
        );
        Box::new(LogChart {
            id,
            slot: config.slot,
        })
    }
}

struct LogChart {
    id: u64,
    slot: ChartSlot,
}

impl Chart for LogChart {
    fn update(&mut self, labels: &[String], values: &[f64]) {
        info!(
            chart = self.id,
            slot = ?self.slot,
            points = values.len(),
            last_label = labels.last().map(String::as_str).unwrap_or("-"),
            last_value = values.last().copied(),
            "chart updated"
        );
    }

    fn destroy(self: Box<Self>) {
        info!(chart = self.id, slot = ?self.slot, "chart destroyed");
    }
}

#[derive(Debug, Default)]
pub struct LogPanel;

impl DetailPanel for LogPanel {
    fn open(&mut self, node_id: &str) {
        info!(node = %node_id, "detail panel opened");
    }

    fn show_fields(&mut self, fields: &DetailFields) {
        info!(
            node = %fields.node_id,
            samples = fields.samples,
            latency_ms = fields.latest_latency_ms,
            signal = fields.latest_signal_strength,
            last_sample_at = ?fields.last_sample_at,
            status = fields.status.map(StatusTier::as_str),
            packet_loss = fields.packet_loss,
            last_seen = fields.last_seen.as_deref(),
            "detail fields"
        );
    }

    fn close(&mut self) {
        info!("detail panel closed");
    }
}

#[derive(Debug, Default)]
pub struct LogSummary;

impl SummaryDisplay for LogSummary {
    fn show(&mut self, fields: &SummaryFields) {
        info!(
            total = %fields.total,
            online = %fields.online,
            offline = %fields.offline,
            avg_latency = %fields.avg_latency,
            "fleet summary"
        );
    }
}
