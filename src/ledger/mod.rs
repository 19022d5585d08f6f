//! Status ledger.
//!
//! One document per migration checksum records whether that exact content
//! has run. The ledger is the only source of truth for "already applied":
//! every read or write failure is returned to the caller, never retried.

use crate::database::{Collection, Database, DbError};
use crate::executor::RunContext;
use crate::migration::{Migration, MigrationError, MigrationRecord, MigrationStatus};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("Invalid ledger record {key}: {source}")]
    InvalidRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Migration status '{0}' cannot be persisted")]
    UnpersistableStatus(MigrationStatus),
}

/// Ledger stored in one collection of the target database
pub struct StatusStore {
    collection: Arc<dyn Collection>,
}

impl StatusStore {
    /// Resolve the ledger collection `name`
    pub async fn open(
        ctx: &RunContext,
        db: &dyn Database,
        name: &str,
    ) -> Result<Self, LedgerError> {
        let collection = ctx.guard(db.collection(name)).await?;
        Ok(Self { collection })
    }

    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// The stored record for `checksum`, if the migration ever left `Missing`
    pub async fn record(
        &self,
        ctx: &RunContext,
        checksum: &str,
    ) -> Result<Option<MigrationRecord>, LedgerError> {
        if !ctx.guard(self.collection.document_exists(checksum)).await? {
            return Ok(None);
        }

        let document = ctx.guard(self.collection.read_document(checksum)).await?;
        let record = serde_json::from_value(document).map_err(|source| {
            LedgerError::InvalidRecord {
                key: checksum.to_string(),
                source,
            }
        })?;
        Ok(Some(record))
    }

    /// Load the persisted status of `migration` onto it
    pub async fn fetch_status(
        &self,
        ctx: &RunContext,
        migration: &mut Migration,
    ) -> Result<(), LedgerError> {
        let checksum = migration.checksum()?;
        migration.status = match self.record(ctx, &checksum).await? {
            Some(record) => record.status,
            None => MigrationStatus::Missing,
        };

        debug!(
            id = migration.id,
            checksum = %checksum,
            status = %migration.status,
            "Fetched migration status"
        );
        Ok(())
    }

    /// Persist the current status of `migration`, creating or overwriting its record
    pub async fn save_status(
        &self,
        ctx: &RunContext,
        migration: &Migration,
    ) -> Result<MigrationRecord, LedgerError> {
        if migration.status == MigrationStatus::Missing {
            return Err(LedgerError::UnpersistableStatus(migration.status));
        }

        let record = MigrationRecord {
            key: migration.checksum()?,
            name: migration.name(),
            status: migration.status,
            applied_at: Utc::now(),
        };
        let document = serde_json::to_value(&record).map_err(DbError::from)?;

        if ctx.guard(self.collection.document_exists(&record.key)).await? {
            ctx.guard(self.collection.update_document(&record.key, &document))
                .await?;
        } else {
            ctx.guard(self.collection.create_document(&document)).await?;
        }

        debug!(
            id = migration.id,
            checksum = %record.key,
            status = %record.status,
            "Saved migration status"
        );
        Ok(record)
    }
}
