use crate::utils::{DEFAULT_MIGRATION_COLLECTION, DEFAULT_MIGRATION_DIR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "arangom.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn default_migration_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MIGRATION_DIR)
}

fn default_collection() -> String {
    DEFAULT_MIGRATION_COLLECTION.to_string()
}

fn default_create_collection() -> bool {
    true
}

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunnerConfig {
    /// Directory scanned recursively for migration documents
    #[serde(default = "default_migration_dir")]
    pub migration_dir: PathBuf,
    /// Ledger collection name
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Create the ledger collection when it does not exist yet
    #[serde(default = "default_create_collection")]
    pub create_collection: bool,
    /// Deadline for a whole run, in seconds. No deadline when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            migration_dir: default_migration_dir(),
            collection: default_collection(),
            create_collection: default_create_collection(),
            timeout_secs: None,
        }
    }
}

impl RunnerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Read the configuration file, if it exists
pub async fn read_config(config_path: &Path) -> Result<Option<RunnerConfig>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(config_path).await?;
    let config: RunnerConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let config = read_config(&dir.path().join("arangom.json")).await.unwrap();
        assert!(config.is_none());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("arangom.json");
        fs::write(&path, r#"{ "collection": "schema_ledger", "timeoutSecs": 30 }"#)
            .await
            .unwrap();

        let config = read_config(&path).await.unwrap().unwrap();

        assert_eq!(config.collection, "schema_ledger");
        assert_eq!(config.migration_dir, PathBuf::from("migrations"));
        assert!(config.create_collection);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_unknown_key_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("arangom.json");
        fs::write(&path, r#"{ "colection": "typo" }"#).await.unwrap();

        let result = read_config(&path).await;
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }
}
