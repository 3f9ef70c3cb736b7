use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use nodewatch_shared::{COLLECTOR_ID, Coordinates, NodeRecord, Snapshot, StatusStyle};
use tracing::{debug, info, warn};

use crate::error::MalformedRecord;
use crate::placement::{DeparturePolicy, PositionAssigner};
use crate::surface::{
    AnchorSpec, LineId, LineSpec, MapSurface, MarkerId, MarkerKind, MarkerSpec, SelectCallback,
};

const LINK_WEIGHT: f32 = 2.0;
const LINK_OPACITY: f32 = 0.8;

/// Receives the id of a node the user picked on the map.
pub type SelectionSink = Arc<dyn Fn(&str) + Send + Sync>;

/// The live marker and link for one node id.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEntity {
    pub marker: MarkerId,
    pub link: LineId,
    pub position: Coordinates,
    pub style: StatusStyle,
}

/// What a single reconcile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub restyled: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub skipped: usize,
    pub placements_evicted: usize,
}

/// Owns every node marker/link on the map and diffs each snapshot against them.
pub struct TopologyReconciler<M: MapSurface> {
    surface: M,
    positions: PositionAssigner,
    departure: DeparturePolicy,
    anchor_ready: bool,
    entities: HashMap<String, RenderedEntity>,
    on_select: SelectionSink,
}

impl<M: MapSurface> TopologyReconciler<M> {
    pub fn new(
        surface: M,
        positions: PositionAssigner,
        departure: DeparturePolicy,
        on_select: SelectionSink,
    ) -> Self {
        Self {
            surface,
            positions,
            departure,
            anchor_ready: false,
            entities: HashMap::new(),
            on_select,
        }
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn positions(&self) -> &PositionAssigner {
        &self.positions
    }

    pub fn entity(&self, id: &str) -> Option<&RenderedEntity> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids with a live visual entity, including the collector once anchored.
    pub fn live_ids(&self) -> BTreeSet<String> {
        let mut ids: BTreeSet<String> = self.entities.keys().cloned().collect();
        if self.anchor_ready {
            ids.insert(COLLECTOR_ID.to_string());
        }
        ids
    }

    /// Bring the map in line with `snapshot`.
    ///
    /// Afterwards the live ids are exactly the snapshot's valid ids plus the
    /// collector. Entities for ids that persist are restyled, never recreated.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        self.ensure_anchor();

        let mut seen: HashSet<&str> = HashSet::with_capacity(snapshot.nodes.len());
        for (index, node) in snapshot.nodes.iter().enumerate() {
            if let Err(skipped) = validate(index, node) {
                warn!(%skipped, "skipping node record");
                report.skipped += 1;
                continue;
            }

            seen.insert(node.id.as_str());
            let style = node.style();
            match self.entities.get_mut(&node.id) {
                Some(entity) => {
                    if entity.style == style {
                        report.unchanged += 1;
                        continue;
                    }
                    self.surface.update_marker(entity.marker, &style);
                    self.surface.update_line(entity.link, &style);
                    debug!(
                        node = %node.id,
                        from = entity.style.tier.as_str(),
                        to = style.tier.as_str(),
                        "restyled node"
                    );
                    entity.style = style;
                    report.restyled += 1;
                }
                None => {
                    let entity = self.spawn_entity(&node.id, style);
                    self.entities.insert(node.id.clone(), entity);
                    report.added += 1;
                }
            }
        }

        let departed: Vec<String> = self
            .entities
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
        for id in departed {
            if let Some(entity) = self.entities.remove(&id) {
                self.surface.remove_marker(entity.marker);
                self.surface.remove_line(entity.link);
                debug!(node = %id, "removed departed node");
                report.removed += 1;
            }
        }

        report.placements_evicted = self.positions.sweep(&seen, self.departure);

        if report.added > 0 || report.removed > 0 {
            info!(
                added = report.added,
                removed = report.removed,
                live = self.entities.len(),
                "topology changed"
            );
        }
        report
    }

    fn ensure_anchor(&mut self) {
        if self.anchor_ready {
            return;
        }
        self.surface.set_anchor(&AnchorSpec {
            id: COLLECTOR_ID.to_string(),
            position: self.positions.anchor(),
            kind: MarkerKind::Collector,
        });
        self.anchor_ready = true;
    }

    fn spawn_entity(&mut self, id: &str, style: StatusStyle) -> RenderedEntity {
        let position = self.positions.place(id);

        let sink = Arc::clone(&self.on_select);
        let node_id = id.to_string();
        let on_select: SelectCallback = Arc::new(move || sink(&node_id));

        let marker = self.surface.add_marker(MarkerSpec {
            node_id: id.to_string(),
            position,
            kind: MarkerKind::BaseStation,
            style,
            on_select,
        });
        let link = self.surface.add_line(LineSpec {
            node_id: id.to_string(),
            from: self.positions.anchor(),
            to: position,
            style,
            weight: LINK_WEIGHT,
            opacity: LINK_OPACITY,
        });

        RenderedEntity {
            marker,
            link,
            position,
            style,
        }
    }
}

fn validate(index: usize, node: &NodeRecord) -> Result<(), MalformedRecord> {
    if !node.has_id() {
        return Err(MalformedRecord {
            index,
            reason: "missing node id".to_string(),
        });
    }
    if node.id == COLLECTOR_ID {
        return Err(MalformedRecord {
            index,
            reason: format!("node id {COLLECTOR_ID:?} is reserved for the collector"),
        });
    }
    Ok(())
}
