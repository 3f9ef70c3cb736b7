use serde::{Deserialize, Serialize};

use crate::status::{StatusStyle, classify};

/// One node's state as reported in a snapshot.
///
/// `id` and `status` default to empty so an incomplete entry still decodes;
/// consumers decide whether to reject it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(alias = "node_id", default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default)]
    pub packet_loss: f64,
    #[serde(default)]
    pub signal_strength: f64,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<f64>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            latency_ms: 0.0,
            packet_loss: 0.0,
            signal_strength: 0.0,
            last_seen: None,
            age_seconds: None,
        }
    }

    pub fn style(&self) -> StatusStyle {
        classify(&self.status)
    }

    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Full fleet state for one poll tick, as served by `GET /api/nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

impl Snapshot {
    pub fn new(nodes: Vec<NodeRecord>) -> Self {
        Self { nodes }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.id.as_str())
    }
}
