//! Migration model.
//!
//! A [`Migration`] is an ordered list of operations loaded from one
//! document. Its persistent identity is its checksum, not its id: editing a
//! migration's operations makes it a new migration as far as the ledger is
//! concerned.

mod checksum;
mod encoding;
pub mod loader;
mod types;

pub use checksum::canonical_encoding;
pub use encoding::EncodeError;
pub use loader::{load_migration, load_migrations, parse_migration};
pub use types::{MigrationRecord, MigrationStatus};

use crate::database::Database;
use crate::executor::RunContext;
use crate::operation::{Operation, OperationError};
use crate::utils::strip_migration_extension;
use std::path::{PathBuf, MAIN_SEPARATOR};
use thiserror::Error;

/// Error types for migration loading and identity
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("invalid migration status: {0}")]
    InvalidStatus(String),

    #[error("Failed to encode migration {id}: {source}")]
    EncodingError {
        id: i64,
        #[source]
        source: EncodeError,
    },

    #[error("Migration directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to walk migration directory: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Failed to parse {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: operation {index}: {source}", path.display())]
    InvalidOperation {
        path: PathBuf,
        index: usize,
        #[source]
        source: OperationError,
    },
}

/// One migration: an id, its provenance and its operations
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    /// Author-assigned id, used for display only
    pub id: i64,
    pub path: PathBuf,
    pub operations: Vec<Operation>,
    /// Filled in from the ledger during a run
    pub status: MigrationStatus,
}

impl Migration {
    pub fn new(id: i64, path: impl Into<PathBuf>, operations: Vec<Operation>) -> Self {
        Self {
            id,
            path: path.into(),
            operations,
            status: MigrationStatus::Missing,
        }
    }

    /// The last path segment without its document extension
    pub fn name(&self) -> String {
        let path = self.path.to_string_lossy();
        let file_name = path
            .rsplit(|c: char| c == '/' || c == MAIN_SEPARATOR)
            .next()
            .unwrap_or_default();
        strip_migration_extension(file_name).to_string()
    }

    /// SHA-256 over the canonical encoding of id and operations, as lowercase hex
    pub fn checksum(&self) -> Result<String, MigrationError> {
        checksum::checksum(self.id, &self.operations).map_err(|source| {
            MigrationError::EncodingError {
                id: self.id,
                source,
            }
        })
    }

    /// Run every operation in declaration order, stopping at the first error
    pub async fn migrate(&self, ctx: &RunContext, db: &dyn Database) -> Result<(), OperationError> {
        for operation in &self.operations {
            operation.run(ctx, db).await?;
        }
        Ok(())
    }
}
