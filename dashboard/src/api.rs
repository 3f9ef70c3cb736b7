use std::future::Future;

use bytes::Bytes;
use nodewatch_shared::{
    FleetSummary, HistoryPoint, HistoryResponse, LatencySeries, NodeRecord, SignalSeries, Snapshot,
};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{USER_AGENT, upstream_connect_timeout, upstream_http_timeout};
use crate::error::{ClientSetupError, FetchError, MalformedRecord};

/// Read side of the telemetry backend.
///
/// Futures are `Send` so pollers can run on spawned tasks.
pub trait TelemetryApi: Send + Sync + 'static {
    /// `GET /api/nodes`
    fn fetch_nodes(&self) -> impl Future<Output = Result<Snapshot, FetchError>> + Send;

    /// `GET /api/nodes/{id}/history?limit=N`
    fn fetch_history(
        &self,
        id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HistoryPoint>, FetchError>> + Send;

    /// `GET /api/metrics/latency`
    fn fetch_latency_series(
        &self,
    ) -> impl Future<Output = Result<LatencySeries, FetchError>> + Send;

    /// `GET /api/metrics/signal`
    fn fetch_signal_series(&self) -> impl Future<Output = Result<SignalSeries, FetchError>> + Send;

    /// `GET /api/summary`
    fn fetch_summary(&self) -> impl Future<Output = Result<FleetSummary, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTelemetryApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpTelemetryApi {
    /// Client with the configured user agent and timeouts.
    pub fn new(base_url: &str) -> Result<Self, ClientSetupError> {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ClientSetupError> {
        let base = Url::parse(base_url).map_err(|e| ClientSetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientSetupError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_bytes(&self, url: Url) -> Result<Bytes, FetchError> {
        let endpoint = url.path().to_string();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        resp.bytes()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let endpoint = url.path().to_string();
        let bytes = self.get_bytes(url).await?;
        decode(&endpoint, &bytes)
    }
}

impl TelemetryApi for HttpTelemetryApi {
    async fn fetch_nodes(&self) -> Result<Snapshot, FetchError> {
        let url = self.endpoint(&["api", "nodes"]);
        let endpoint = url.path().to_string();
        let bytes = self.get_bytes(url).await?;
        parse_snapshot(&endpoint, &bytes)
    }

    async fn fetch_history(&self, id: &str, limit: usize) -> Result<Vec<HistoryPoint>, FetchError> {
        let mut url = self.endpoint(&["api", "nodes", id, "history"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let response: HistoryResponse = self.get_json(url).await?;
        Ok(response.points)
    }

    async fn fetch_latency_series(&self) -> Result<LatencySeries, FetchError> {
        self.get_json(self.endpoint(&["api", "metrics", "latency"]))
            .await
    }

    async fn fetch_signal_series(&self) -> Result<SignalSeries, FetchError> {
        self.get_json(self.endpoint(&["api", "metrics", "signal"]))
            .await
    }

    async fn fetch_summary(&self) -> Result<FleetSummary, FetchError> {
        self.get_json(self.endpoint(&["api", "summary"])).await
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, bytes: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(bytes).map_err(|source| FetchError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Decode a nodes payload entry by entry, skipping entries that do not decode.
pub fn parse_snapshot(endpoint: &str, bytes: &[u8]) -> Result<Snapshot, FetchError> {
    #[derive(Deserialize)]
    struct RawSnapshot {
        #[serde(default)]
        nodes: Vec<serde_json::Value>,
    }

    let raw: RawSnapshot = decode(endpoint, bytes)?;
    let mut nodes = Vec::with_capacity(raw.nodes.len());
    for (index, value) in raw.nodes.into_iter().enumerate() {
        match serde_json::from_value::<NodeRecord>(value) {
            Ok(node) => nodes.push(node),
            Err(e) => {
                let skipped = MalformedRecord {
                    index,
                    reason: e.to_string(),
                };
                warn!(%skipped, "skipping undecodable node record");
            }
        }
    }
    debug!(nodes = nodes.len(), "decoded node snapshot");
    Ok(Snapshot::new(nodes))
}
