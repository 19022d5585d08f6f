//! Loading migration documents from disk.
//!
//! A migration document is YAML:
//!
//! ```yaml
//! id: 1
//! operations:
//!   - kind: createCollection
//!     collection: users
//!     options:
//!       waitForSync: true
//! ```

use super::{Migration, MigrationError};
use crate::operation::{Operation, OperationKind};
use crate::utils::MIGRATION_EXTENSIONS;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MigrationDocument {
    id: i64,
    #[serde(default)]
    operations: Vec<OperationDocument>,
}

/// Operations keep their kind as text so an unknown kind can be reported
/// with the position of the offending operation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OperationDocument {
    kind: String,
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    options: Option<Map<String, Value>>,
}

fn is_migration_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MIGRATION_EXTENSIONS.contains(&ext))
}

/// Decode one migration document; `path` is recorded as its provenance
pub fn parse_migration(path: &Path, content: &str) -> Result<Migration, MigrationError> {
    let document: MigrationDocument =
        serde_yaml::from_str(content).map_err(|source| MigrationError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

    let operations = document
        .operations
        .into_iter()
        .enumerate()
        .map(|(index, op)| -> Result<Operation, MigrationError> {
            let kind: OperationKind =
                op.kind
                    .parse()
                    .map_err(|source| MigrationError::InvalidOperation {
                        path: path.to_path_buf(),
                        index,
                        source,
                    })?;
            Ok(Operation {
                kind,
                collection: op.collection,
                options: op.options.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, MigrationError>>()?;

    Ok(Migration::new(document.id, path, operations))
}

pub async fn load_migration(path: &Path) -> Result<Migration, MigrationError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_migration(path, &content)
}

/// Load every migration document under `dir`, recursively.
///
/// Files are visited in file-name order within each directory and the
/// result keeps that order; it is the order the executor runs them in.
pub async fn load_migrations(dir: &Path) -> Result<Vec<Migration>, MigrationError> {
    if !dir.is_dir() {
        return Err(MigrationError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut migrations = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type().is_file() || !is_migration_document(path) {
            continue;
        }

        let migration = load_migration(path).await?;
        debug!(id = migration.id, path = %path.display(), "Loaded migration");
        migrations.push(migration);
    }

    Ok(migrations)
}
