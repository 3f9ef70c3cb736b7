use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Width of the time-of-day axis label (`HH:MM:SS`).
pub const TIME_LABEL_WIDTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: String,
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default)]
    pub signal_strength: f64,
}

impl HistoryPoint {
    pub fn new(timestamp: impl Into<String>, latency_ms: f64, signal_strength: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            latency_ms,
            signal_strength,
        }
    }

    /// Parsed timestamp. Naive ISO timestamps are read as UTC.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn label(&self) -> &str {
        time_of_day_label(&self.timestamp)
    }
}

/// Response body of `GET /api/nodes/{id}/history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub points: Vec<HistoryPoint>,
}

/// Fixed-width time-of-day slice of an ISO timestamp.
///
/// Takes the part after `T` (or the whole string when there is none) and keeps
/// at most [`TIME_LABEL_WIDTH`] characters.
pub fn time_of_day_label(timestamp: &str) -> &str {
    let time = timestamp
        .split_once('T')
        .map(|(_, time)| time)
        .unwrap_or(timestamp);
    match time.char_indices().nth(TIME_LABEL_WIDTH) {
        Some((end, _)) => &time[..end],
        None => time,
    }
}
