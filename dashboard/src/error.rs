use thiserror::Error;

/// A failed poll against the telemetry backend.
///
/// Always transient from the dashboard's point of view: the caller logs it,
/// keeps whatever is displayed, and the next scheduled poll retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }
}

/// A snapshot entry that was skipped during decoding or reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("snapshot entry {index} is malformed: {reason}")]
pub struct MalformedRecord {
    pub index: usize,
    pub reason: String,
}

/// The HTTP client could not be constructed at startup.
#[derive(Debug, Error)]
pub enum ClientSetupError {
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
