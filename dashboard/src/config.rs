use std::time::Duration;

use crate::placement::{DeparturePolicy, PlacementStrategy};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const USER_AGENT: &str = "nodewatch-dashboard/0.1";

pub const DEFAULT_NODES_POLL_INTERVAL_SECS: u64 = 4;
pub const DEFAULT_DETAIL_POLL_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_FLEET_CHARTS_INTERVAL_SECS: u64 = 4;
pub const DEFAULT_SUMMARY_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_url: String,
    pub nodes_interval: Duration,
    pub detail_interval: Duration,
    pub fleet_charts_interval: Duration,
    pub summary_interval: Duration,
    pub history_limit: usize,
    pub placement: PlacementStrategy,
    pub departure: DeparturePolicy,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            nodes_interval: Duration::from_secs(DEFAULT_NODES_POLL_INTERVAL_SECS),
            detail_interval: Duration::from_secs(DEFAULT_DETAIL_POLL_INTERVAL_SECS),
            fleet_charts_interval: Duration::from_secs(DEFAULT_FLEET_CHARTS_INTERVAL_SECS),
            summary_interval: Duration::from_secs(DEFAULT_SUMMARY_INTERVAL_SECS),
            history_limit: DEFAULT_HISTORY_LIMIT,
            placement: PlacementStrategy::default(),
            departure: DeparturePolicy::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: api_url(),
            nodes_interval: secs_from_env("NODES_POLL_INTERVAL_SECS", DEFAULT_NODES_POLL_INTERVAL_SECS),
            detail_interval: secs_from_env(
                "DETAIL_POLL_INTERVAL_SECS",
                DEFAULT_DETAIL_POLL_INTERVAL_SECS,
            ),
            fleet_charts_interval: secs_from_env(
                "FLEET_CHARTS_INTERVAL_SECS",
                DEFAULT_FLEET_CHARTS_INTERVAL_SECS,
            ),
            summary_interval: secs_from_env("SUMMARY_INTERVAL_SECS", DEFAULT_SUMMARY_INTERVAL_SECS),
            history_limit: history_limit(),
            placement: placement_strategy(),
            departure: departure_policy(),
        }
    }
}

pub fn api_url() -> String {
    std::env::var("NODEWATCH_API_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

pub fn history_limit() -> usize {
    std::env::var("HISTORY_LIMIT")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
}

pub fn upstream_http_timeout() -> Duration {
    secs_from_env("UPSTREAM_HTTP_TIMEOUT_SECS", DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS)
}

pub fn upstream_connect_timeout() -> Duration {
    secs_from_env(
        "UPSTREAM_CONNECT_TIMEOUT_SECS",
        DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS,
    )
}

pub fn placement_strategy() -> PlacementStrategy {
    std::env::var("PLACEMENT_STRATEGY")
        .ok()
        .and_then(|value| PlacementStrategy::parse(&value))
        .unwrap_or_default()
}

pub fn departure_policy() -> DeparturePolicy {
    std::env::var("PLACEMENT_DEPARTURE")
        .ok()
        .and_then(|value| DeparturePolicy::parse(&value))
        .unwrap_or_default()
}

fn secs_from_env(key: &str, default_secs: u64) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}
