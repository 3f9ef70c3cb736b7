use serde::{Deserialize, Serialize};

/// Fleet-wide latency series from `GET /api/metrics/latency`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySeries {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

/// Per-node signal strength from `GET /api/metrics/signal`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub signals: Vec<f64>,
}

/// Fleet counters from `GET /api/summary`. All counters are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total_nodes: u64,
    pub online_nodes: u64,
    pub offline_nodes: u64,
    pub avg_latency: Option<f64>,
}
