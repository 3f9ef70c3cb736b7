use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use nodewatch_shared::{NodeRecord, Snapshot};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::TelemetryApi;
use crate::config::DashboardConfig;
use crate::feed::FleetCharts;
use crate::placement::PositionAssigner;
use crate::selection::SelectionController;
use crate::summary::SummaryAggregator;
use crate::surface::{ChartRenderer, DetailPanel, MapSurface, SummaryDisplay};
use crate::topology::{ReconcileReport, SelectionSink, TopologyReconciler};

/// Input from the UI shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Select(String),
    Deselect,
    RefreshSummary,
}

impl UiCommand {
    /// Parse a text command: `select <id>`, `close` or `summary`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let command = parts.next()?.to_ascii_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            return None;
        }
        match (command.as_str(), arg) {
            ("select" | "open", Some(id)) => Some(Self::Select(id.to_string())),
            ("close" | "deselect", None) => Some(Self::Deselect),
            ("summary", None) => Some(Self::RefreshSummary),
            _ => None,
        }
    }
}

/// Cloneable entry point for click handlers and other UI input.
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    tx: mpsc::UnboundedSender<UiCommand>,
}

impl DashboardHandle {
    pub fn select(&self, id: &str) {
        self.send(UiCommand::Select(id.to_string()));
    }

    pub fn deselect(&self) {
        self.send(UiCommand::Deselect);
    }

    pub fn refresh_summary(&self) {
        self.send(UiCommand::RefreshSummary);
    }

    pub fn send(&self, command: UiCommand) {
        if self.tx.send(command).is_err() {
            debug!("dashboard stopped, dropping UI command");
        }
    }
}

/// Wires the components together and runs the polling loops.
///
/// Node reconciliation, fleet charts, summary and UI commands all run on one
/// task; only the detail poller runs on its own.
pub struct Dashboard<A: TelemetryApi, M: MapSurface, S: SummaryDisplay> {
    api: Arc<A>,
    topology: TopologyReconciler<M>,
    selection: SelectionController<A>,
    summary: SummaryAggregator<S>,
    fleet: FleetCharts,
    /// Latest snapshot entry for every rendered node.
    records: HashMap<String, NodeRecord>,
    commands: mpsc::UnboundedReceiver<UiCommand>,
    config: DashboardConfig,
}

impl<A: TelemetryApi, M: MapSurface, S: SummaryDisplay> Dashboard<A, M, S> {
    pub fn new(
        api: Arc<A>,
        surface: M,
        renderer: Arc<dyn ChartRenderer>,
        panel: Box<dyn DetailPanel>,
        summary: S,
        config: DashboardConfig,
    ) -> (Self, DashboardHandle) {
        let (tx, commands) = mpsc::unbounded_channel();
        let handle = DashboardHandle { tx };

        let clicks = handle.clone();
        let on_select: SelectionSink = Arc::new(move |id: &str| clicks.select(id));
        let topology = TopologyReconciler::new(
            surface,
            PositionAssigner::new(config.placement),
            config.departure,
            on_select,
        );
        let selection = SelectionController::new(
            Arc::clone(&api),
            panel,
            Arc::clone(&renderer),
            config.detail_interval,
            config.history_limit,
        );

        let dashboard = Self {
            api,
            topology,
            selection,
            summary: SummaryAggregator::new(summary),
            fleet: FleetCharts::new(renderer),
            records: HashMap::new(),
            commands,
            config,
        };
        (dashboard, handle)
    }

    pub fn topology(&self) -> &TopologyReconciler<M> {
        &self.topology
    }

    pub fn selection(&self) -> &SelectionController<A> {
        &self.selection
    }

    pub fn summary(&self) -> &SummaryAggregator<S> {
        &self.summary
    }

    /// Reconcile the map and hand the selected node's new entry to the detail
    /// view, closing it if the node left the fleet.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        let report = self.topology.reconcile(snapshot);
        self.records = snapshot
            .nodes
            .iter()
            .filter(|node| self.topology.entity(&node.id).is_some())
            .map(|node| (node.id.clone(), node.clone()))
            .collect();

        if let Some(selected) = self.selection.selected() {
            match self.records.get(&selected) {
                Some(record) => self.selection.note_record(record),
                None => {
                    info!(node = %selected, "selected node left the fleet, closing detail");
                    self.selection.deselect();
                }
            }
        }
        report
    }

    /// Fetch and reconcile one snapshot. On failure the map is left as is.
    pub async fn poll_nodes(&mut self) -> Option<ReconcileReport> {
        match self.api.fetch_nodes().await {
            Ok(snapshot) => Some(self.reconcile(&snapshot)),
            Err(e) => {
                warn!(error = %e, "failed to fetch node snapshot");
                None
            }
        }
    }

    pub fn select(&mut self, id: &str) {
        self.selection.select_with(id, self.records.get(id));
    }

    pub fn deselect(&mut self) {
        self.selection.deselect();
    }

    pub async fn refresh_summary(&mut self) -> bool {
        self.summary.refresh(self.api.as_ref()).await
    }

    pub async fn refresh_fleet_charts(&mut self) {
        self.fleet.refresh(self.api.as_ref()).await;
    }

    pub async fn handle(&mut self, command: UiCommand) {
        match command {
            UiCommand::Select(id) => self.select(&id),
            UiCommand::Deselect => self.deselect(),
            UiCommand::RefreshSummary => {
                self.refresh_summary().await;
            }
        }
    }

    /// Apply every queued UI command. Returns how many were handled.
    pub async fn drain_commands(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.handle(command).await;
            handled += 1;
        }
        handled
    }

    /// Poll until `shutdown` resolves, then close the detail view.
    pub async fn run<F: Future<Output = ()>>(mut self, shutdown: F) {
        let mut nodes_tick = tokio::time::interval(self.config.nodes_interval);
        let mut fleet_tick = tokio::time::interval(self.config.fleet_charts_interval);
        let mut summary_tick = tokio::time::interval(self.config.summary_interval);
        for interval in [&mut nodes_tick, &mut fleet_tick, &mut summary_tick] {
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }
        tokio::pin!(shutdown);

        info!(
            nodes_every = ?self.config.nodes_interval,
            detail_every = ?self.config.detail_interval,
            "dashboard polling started"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = nodes_tick.tick() => {
                    self.poll_nodes().await;
                }
                _ = fleet_tick.tick() => self.refresh_fleet_charts().await,
                _ = summary_tick.tick() => {
                    self.refresh_summary().await;
                }
                Some(command) = self.commands.recv() => self.handle(command).await,
            }
        }

        self.selection.deselect();
        info!("dashboard polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nodewatch_shared::{FleetSummary, HistoryPoint, NodeRecord, StatusTier};

    use super::*;
    use crate::surface::ChartSlot;
    use crate::test_support::{
        FakeApi, PanelEvent, RecordingCharts, RecordingMap, RecordingPanel, RecordingSummary,
    };

    type TestDashboard = Dashboard<FakeApi, RecordingMap, RecordingSummary>;

    struct Harness {
        api: Arc<FakeApi>,
        panel: RecordingPanel,
        charts: RecordingCharts,
        summary: RecordingSummary,
        dashboard: TestDashboard,
        handle: DashboardHandle,
    }

    fn harness() -> Harness {
        let api = Arc::new(FakeApi::default());
        let panel = RecordingPanel::default();
        let charts = RecordingCharts::default();
        let summary = RecordingSummary::default();
        let (dashboard, handle) = Dashboard::new(
            Arc::clone(&api),
            RecordingMap::default(),
            Arc::new(charts.clone()),
            Box::new(panel.clone()),
            summary.clone(),
            DashboardConfig::default(),
        );
        Harness {
            api,
            panel,
            charts,
            summary,
            dashboard,
            handle,
        }
    }

    fn snapshot(nodes: &[(&str, &str)]) -> Snapshot {
        Snapshot::new(
            nodes
                .iter()
                .map(|(id, status)| NodeRecord::new(*id, *status))
                .collect(),
        )
    }

    #[test]
    fn parses_text_commands() {
        assert_eq!(UiCommand::parse("select bs-1"), Some(UiCommand::Select("bs-1".into())));
        assert_eq!(UiCommand::parse("  CLOSE "), Some(UiCommand::Deselect));
        assert_eq!(UiCommand::parse("summary"), Some(UiCommand::RefreshSummary));
        assert_eq!(UiCommand::parse("select"), None);
        assert_eq!(UiCommand::parse("select a b"), None);
        assert_eq!(UiCommand::parse(""), None);
    }

    #[tokio::test(start_paused = true)]
    async fn marker_click_opens_the_detail_view() {
        let mut h = harness();
        h.api.set_nodes(Some(snapshot(&[("n1", "online"), ("n2", "stale")])));
        h.api.set_history("n2", vec![HistoryPoint::new("2026-03-01T10:00:00", 9.0, 90.0)]);

        h.dashboard.poll_nodes().await.expect("snapshot reconciled");
        let marker = h.dashboard.topology().entity("n2").expect("n2 rendered").marker;
        (h.dashboard.topology().surface().markers[&marker].on_select)();

        assert_eq!(h.dashboard.drain_commands().await, 1);
        assert_eq!(h.dashboard.selection().selected().as_deref(), Some("n2"));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.panel.last_fields().map(|fields| fields.node_id), Some("n2".into()));
    }

    #[tokio::test]
    async fn failed_snapshot_fetch_keeps_the_map() {
        let mut h = harness();
        h.api.set_nodes(Some(snapshot(&[("n1", "online")])));
        h.dashboard.poll_nodes().await;

        h.api.set_nodes(None);
        assert!(h.dashboard.poll_nodes().await.is_none());
        assert!(h.dashboard.topology().entity("n1").is_some());
        assert_eq!(h.dashboard.topology().surface().markers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn departure_of_the_selected_node_closes_the_detail_view() {
        let mut h = harness();
        h.api.set_history("n2", vec![]);
        h.dashboard.reconcile(&snapshot(&[("n1", "online"), ("n2", "offline")]));
        h.dashboard.select("n2");

        h.dashboard.reconcile(&snapshot(&[("n1", "online"), ("n2", "online")]));
        assert_eq!(h.dashboard.selection().selected().as_deref(), Some("n2"));

        h.dashboard.reconcile(&snapshot(&[("n1", "stale")]));
        assert_eq!(h.dashboard.selection().selected(), None);
        assert_eq!(h.dashboard.selection().active_pollers(), 0);
        assert!(!h.panel.is_open());
        assert_eq!(h.charts.live(ChartSlot::NodeLatency), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn detail_panel_follows_the_selected_nodes_snapshot_entry() {
        let mut h = harness();
        h.api.set_history("n1", vec![HistoryPoint::new("2026-03-01T10:00:00", 5.0, 50.0)]);
        h.api.set_history("n2", vec![HistoryPoint::new("2026-03-01T10:00:00", 9.0, 90.0)]);
        let mut n2 = NodeRecord::new("n2", "offline");
        n2.packet_loss = 12.5;
        n2.last_seen = Some("2026-03-01T09:59:58".to_string());
        h.dashboard.reconcile(&Snapshot::new(vec![NodeRecord::new("n1", "online"), n2]));

        h.dashboard.select("n1");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            h.panel.last_fields().and_then(|fields| fields.status),
            Some(StatusTier::Online)
        );

        h.dashboard.select("n2");
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fields = h.panel.last_fields().expect("n2 fields");
        assert_eq!(fields.node_id, "n2");
        assert_eq!(fields.status, Some(StatusTier::Offline));
        assert_eq!(fields.packet_loss, Some(12.5));
        assert_eq!(fields.last_seen.as_deref(), Some("2026-03-01T09:59:58"));

        h.dashboard.reconcile(&snapshot(&[("n1", "online"), ("n2", "stale")]));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(
            h.panel.last_fields().and_then(|fields| fields.status),
            Some(StatusTier::Stale)
        );

        let n2_statuses: Vec<_> = h
            .panel
            .events()
            .into_iter()
            .filter_map(|event| match event {
                PanelEvent::Fields(fields) if fields.node_id == "n2" => Some(fields.status),
                _ => None,
            })
            .collect();
        assert!(!n2_statuses.contains(&Some(StatusTier::Online)));
    }

    #[tokio::test]
    async fn summary_command_refreshes_counters() {
        let mut h = harness();
        h.api.set_summary(Some(FleetSummary {
            total_nodes: 2,
            online_nodes: 1,
            offline_nodes: 1,
            avg_latency: Some(12.0),
        }));

        h.handle.refresh_summary();
        h.dashboard.drain_commands().await;

        assert_eq!(h.summary.shown().len(), 1);
        assert_eq!(h.summary.shown()[0].avg_latency, "12.0 ms");
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_every_component_and_stops_on_shutdown() {
        let h = harness();
        h.api.set_nodes(Some(snapshot(&[("n1", "online"), ("n2", "offline")])));
        h.api.set_history("n1", vec![HistoryPoint::new("2026-03-01T10:00:00", 5.0, 50.0)]);
        h.api.set_latency(Some(Default::default()));
        h.api.set_signal(Some(Default::default()));
        h.api.set_summary(Some(FleetSummary {
            total_nodes: 2,
            online_nodes: 1,
            offline_nodes: 1,
            avg_latency: None,
        }));

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let panel = h.panel.clone();
        let charts = h.charts.clone();
        let summary = h.summary.clone();
        let handle = h.handle.clone();
        let api = Arc::clone(&h.api);
        let dashboard = h.dashboard;

        let running = tokio::spawn(async move {
            dashboard
                .run(async {
                    let _ = stop_rx.await;
                })
                .await;
        });

        handle.select("n1");
        tokio::time::sleep(Duration::from_secs(5)).await;

        api.set_nodes(Some(snapshot(&[("n1", "stale")])));
        tokio::time::sleep(Duration::from_secs(4)).await;

        assert!(panel.field_updates_for("n1") >= 2);
        assert_eq!(charts.created(ChartSlot::FleetLatency), 1);
        assert!(charts.updated(ChartSlot::FleetLatency) >= 1);
        assert_eq!(summary.shown().len(), 1);
        assert_eq!(summary.shown()[0].avg_latency, "n/a");

        stop_tx.send(()).expect("dashboard still running");
        running.await.expect("dashboard task");

        assert!(!panel.is_open());
        let calls = api.history_calls().len();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.history_calls().len(), calls);
    }

    #[test]
    fn classifier_drives_marker_and_link_alike() {
        let (mut dashboard, _handle) = Dashboard::new(
            Arc::new(FakeApi::default()),
            RecordingMap::default(),
            Arc::new(RecordingCharts::default()),
            Box::new(RecordingPanel::default()),
            RecordingSummary::default(),
            DashboardConfig::default(),
        );
        dashboard.reconcile(&snapshot(&[("n1", "rebooting")]));

        let entity = dashboard.topology().entity("n1").expect("n1 rendered");
        let map = dashboard.topology().surface();
        assert_eq!(map.markers[&entity.marker].style.tier, StatusTier::Offline);
        assert_eq!(map.markers[&entity.marker].style, map.lines[&entity.link].style);
    }
}
