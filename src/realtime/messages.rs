//! Telemetry Wire Types
//!
//! Snapshots arrive as JSON on `/topic/scales` (every device) and
//! `/topic/scale/{id}` (one device), both carrying the same shape.

use serde::{Deserialize, Serialize};

/// Broadcast topic carrying updates for every scale
pub const TOPIC_ALL_SCALES: &str = "/topic/scales";

/// Per-device topic
pub fn scale_topic(scale_id: i64) -> String {
    format!("/topic/scale/{}", scale_id)
}

/// Latest telemetry for one scale
///
/// Each message replaces the prior snapshot for its `scale_id` entirely;
/// there is no merging of partial fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSnapshot {
    pub scale_id: i64,
    pub last_time: String,
    #[serde(default)]
    pub data1: Option<String>,
    #[serde(default)]
    pub data2: Option<String>,
    #[serde(default)]
    pub data3: Option<String>,
    #[serde(default)]
    pub data4: Option<String>,
    #[serde(default)]
    pub data5: Option<String>,
    pub status: ScaleStatus,
}

impl ScaleSnapshot {
    /// Parse a snapshot from a message body
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Reported device status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleStatus {
    Online,
    Offline,
    Error,
    Maintenance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_topic() {
        assert_eq!(scale_topic(42), "/topic/scale/42");
    }

    #[test]
    fn test_parse_full_snapshot() {
        let body = r#"{
            "scaleId": 7,
            "lastTime": "2024-03-12T08:15:30",
            "data1": "1520.5",
            "data2": "12",
            "data3": null,
            "data4": null,
            "data5": null,
            "status": "ONLINE"
        }"#;
        let snapshot = ScaleSnapshot::parse(body).unwrap();
        assert_eq!(snapshot.scale_id, 7);
        assert_eq!(snapshot.data1.as_deref(), Some("1520.5"));
        assert!(snapshot.data3.is_none());
        assert_eq!(snapshot.status, ScaleStatus::Online);
    }

    #[test]
    fn test_parse_snapshot_with_missing_channels() {
        let body = r#"{ "scaleId": 3, "lastTime": "2024-03-12T08:15:30", "status": "MAINTENANCE" }"#;
        let snapshot = ScaleSnapshot::parse(body).unwrap();
        assert_eq!(snapshot.status, ScaleStatus::Maintenance);
        assert!(snapshot.data1.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let body = r#"{ "scaleId": 3, "lastTime": "t", "status": "REBOOTING" }"#;
        assert!(ScaleSnapshot::parse(body).is_err());
    }
}
