use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::colors::Rgb;

pub const NORMAL_COLOR: Rgb = Rgb::new(0x56, 0x98, 0xc3);
pub const WARNING_COLOR: Rgb = Rgb::new(0xff, 0xc1, 0x07);

/// SSE event carrying the full [`StatusMap`]; sent first on every subscription.
pub const INITIAL_STATUS_EVENT: &str = "initial_status";
/// SSE event carrying one [`StatusUpdate`].
pub const STATUS_UPDATE_EVENT: &str = "status_update";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistrictStatus {
    Normal,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status {0:?}, expected \"normal\" or \"warning\"")]
pub struct InvalidStatus(pub String);

impl DistrictStatus {
    pub fn color(self) -> Rgb {
        match self {
            Self::Normal => NORMAL_COLOR,
            Self::Warning => WARNING_COLOR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for DistrictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistrictStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "warning" => Ok(Self::Warning),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// Colors travel as `#rrggbb` strings; receivers validate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictState {
    pub status: DistrictStatus,
    pub color: String,
}

impl DistrictState {
    pub fn new(status: DistrictStatus) -> Self {
        Self {
            status,
            color: status.color().to_hex(),
        }
    }
}

pub type StatusMap = BTreeMap<String, DistrictState>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub district: String,
    pub status: DistrictStatus,
    pub color: String,
}

/// Body of `POST /api/update-status`. `status` stays a string so invalid
/// values get a 400 with a message instead of a generic body rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub district: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
    pub district: String,
    pub status: DistrictStatus,
    pub color: String,
}

#[cfg(test)]
mod tests {
    use super::{DistrictState, DistrictStatus, StatusMap, StatusUpdate};

    #[test]
    fn status_colors_match_palette() {
        assert_eq!(DistrictState::new(DistrictStatus::Normal).color, "#5698c3");
        assert_eq!(DistrictState::new(DistrictStatus::Warning).color, "#ffc107");
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("normal".parse::<DistrictStatus>(), Ok(DistrictStatus::Normal));
        assert_eq!("warning".parse::<DistrictStatus>(), Ok(DistrictStatus::Warning));
        assert!("Warning".parse::<DistrictStatus>().is_err());
        assert!("offline".parse::<DistrictStatus>().is_err());
    }

    #[test]
    fn status_update_wire_shape() {
        let update = StatusUpdate {
            district: "C".to_string(),
            status: DistrictStatus::Warning,
            color: "#ffc107".to_string(),
        };
        let json = serde_json::to_value(&update).expect("serialize update");
        assert_eq!(
            json,
            serde_json::json!({"district": "C", "status": "warning", "color": "#ffc107"})
        );
    }

    #[test]
    fn status_map_deserializes_from_snapshot() {
        let map: StatusMap = serde_json::from_str(
            r##"{"A": {"status": "normal", "color": "#5698c3"},
                 "B": {"status": "warning", "color": "#ffc107"}}"##,
        )
        .expect("snapshot should parse");
        assert_eq!(map.len(), 2);
        assert_eq!(map["B"].status, DistrictStatus::Warning);
    }
}
