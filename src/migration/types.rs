//! Types for the migration model.

use super::MigrationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Run state of a migration as tracked by the ledger.
///
/// `Missing` is what a migration without a ledger record reports; it is
/// inferred, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MigrationStatus {
    #[default]
    Missing,
    Running,
    Done,
    Failed,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationStatus {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missing" => Ok(Self::Missing),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(MigrationError::InvalidStatus(s.to_string())),
        }
    }
}

impl Serialize for MigrationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MigrationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ledger document recording the last known state of one migration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    /// Checksum of the migration this record tracks
    #[serde(rename = "_key")]
    pub key: String,
    pub name: String,
    pub status: MigrationStatus,
    pub applied_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(MigrationStatus::Running).unwrap(),
            json!("running")
        );
        assert_eq!(
            serde_json::from_value::<MigrationStatus>(json!("failed")).unwrap(),
            MigrationStatus::Failed
        );
    }

    #[test]
    fn test_status_rejects_unknown_string() {
        assert!(serde_json::from_value::<MigrationStatus>(json!("pending")).is_err());
        assert!(serde_json::from_value::<MigrationStatus>(json!("Done")).is_err());
        assert!(matches!(
            "skipped".parse::<MigrationStatus>(),
            Err(MigrationError::InvalidStatus(ref s)) if s == "skipped"
        ));
    }

    #[test]
    fn test_record_wire_format() {
        let record: MigrationRecord = serde_json::from_value(json!({
            "_key": "abc",
            "_rev": "12",
            "name": "001_users",
            "status": "done",
            "appliedAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.key, "abc");
        assert_eq!(record.status, MigrationStatus::Done);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_key"], "abc");
        assert_eq!(value["appliedAt"], "2024-03-01T10:00:00Z");
        assert!(value.get("applied_at").is_none());
    }
}
