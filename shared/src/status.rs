use serde::{Deserialize, Serialize};

pub const ONLINE_COLOR: &str = "#2ecc71";
pub const STALE_COLOR: &str = "#f39c12";
pub const OFFLINE_COLOR: &str = "#e74c3c";

/// Dash pattern applied to offline links.
pub const OFFLINE_DASH: &str = "6,6";

/// Display tier derived from a node's raw status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTier {
    Online,
    Stale,
    Offline,
}

impl StatusTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Stale => "stale",
            Self::Offline => "offline",
        }
    }

    pub const fn style(self) -> StatusStyle {
        match self {
            Self::Online => StatusStyle {
                tier: self,
                color: ONLINE_COLOR,
                dashed: false,
                icon: "status-online",
            },
            Self::Stale => StatusStyle {
                tier: self,
                color: STALE_COLOR,
                dashed: false,
                icon: "status-stale",
            },
            Self::Offline => StatusStyle {
                tier: self,
                color: OFFLINE_COLOR,
                dashed: true,
                icon: "status-offline",
            },
        }
    }
}

/// Style tokens shared by node markers and collector links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub tier: StatusTier,
    pub color: &'static str,
    pub dashed: bool,
    pub icon: &'static str,
}

impl StatusStyle {
    pub const fn dash_pattern(&self) -> Option<&'static str> {
        if self.dashed { Some(OFFLINE_DASH) } else { None }
    }
}

/// Map a raw status string to its display style.
///
/// Total: only the exact strings `"online"` and `"stale"` escape the offline tier.
pub fn classify(status: &str) -> StatusStyle {
    let tier = match status {
        "online" => StatusTier::Online,
        "stale" => StatusTier::Stale,
        _ => StatusTier::Offline,
    };
    tier.style()
}
