//! Migration executor.
//!
//! The executor walks the migration list in the order it was given. For
//! each migration it consults the ledger, then either skips it (`done` or `running`),
//! aborts the run (`failed`), or applies it, recording `running` before the
//! first operation and `done` or `failed` after the last attempted one.
//! The first error of any kind ends the run; nothing is retried or rolled
//! back.

mod context;

pub use context::{Interrupted, RunContext};

use crate::database::Database;
use crate::ledger::{LedgerError, StatusStore};
use crate::logging::{Logger, TracingLogger};
use crate::migration::{Migration, MigrationStatus};
use crate::operation::OperationError;
use crate::utils::DEFAULT_MIGRATION_COLLECTION;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("no database provided")]
    NoDatabase,

    #[error("no collection provided")]
    NoCollection,

    #[error("no migrations provided")]
    NoMigrations,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("migration failed: {source}")]
    MigrationFailed {
        id: i64,
        #[source]
        source: OperationError,
    },

    /// The ledger already records this migration as failed
    #[error("migration failed")]
    PreviouslyFailed { id: i64 },
}

impl ExecutorError {
    /// Whether the run stopped because of a failed migration
    pub fn is_migration_failed(&self) -> bool {
        matches!(
            self,
            Self::MigrationFailed { .. } | Self::PreviouslyFailed { .. }
        )
    }

    /// Id of the migration the run stopped at, when known
    pub fn migration_id(&self) -> Option<i64> {
        match self {
            Self::MigrationFailed { id, .. } | Self::PreviouslyFailed { id } => Some(*id),
            _ => None,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Migrations applied by this run
    pub applied: usize,
    /// Migrations skipped because the ledger records them as done
    pub skipped: usize,
}

/// Builder for [`Executor`]
#[derive(Default)]
pub struct ExecutorBuilder {
    database: Option<Arc<dyn Database>>,
    collection: Option<String>,
    migrations: Option<Vec<Migration>>,
    logger: Option<Arc<dyn Logger>>,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = Some(database);
        self
    }

    /// Ledger collection name; defaults to `migrations`
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Migrations to run, in execution order
    pub fn migrations(mut self, migrations: Vec<Migration>) -> Self {
        self.migrations = Some(migrations);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<Executor, ExecutorError> {
        let db = self.database.ok_or(ExecutorError::NoDatabase)?;

        let collection = match self.collection {
            Some(name) if name.is_empty() => return Err(ExecutorError::NoCollection),
            Some(name) => name,
            None => DEFAULT_MIGRATION_COLLECTION.to_string(),
        };

        let migrations = match self.migrations {
            Some(migrations) if !migrations.is_empty() => migrations,
            _ => return Err(ExecutorError::NoMigrations),
        };

        Ok(Executor {
            db,
            collection,
            migrations,
            logger: self.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
        })
    }
}

/// Runs an ordered list of migrations against one database
pub struct Executor {
    db: Arc<dyn Database>,
    collection: String,
    migrations: Vec<Migration>,
    logger: Arc<dyn Logger>,
}

impl Executor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The migrations with the statuses observed or set by the last run
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Apply every pending migration, stopping at the first failure
    pub async fn execute(&mut self, ctx: &RunContext) -> Result<RunSummary, ExecutorError> {
        warn_if_unordered(&self.migrations);

        self.logger.info(&format!(
            "connecting to the migration collection \"{}\"",
            self.collection
        ));
        let store = StatusStore::open(ctx, self.db.as_ref(), &self.collection).await?;

        let mut summary = RunSummary::default();
        for migration in self.migrations.iter_mut() {
            let id = migration.id;

            self.logger.info(&format!("[{id}] fetching migration status"));
            store.fetch_status(ctx, migration).await?;

            // A `running` record counts as applied, like `done`.
            match migration.status {
                MigrationStatus::Done | MigrationStatus::Running => {
                    self.logger.info(&format!("[{id}] migration already executed"));
                    summary.skipped += 1;
                    continue;
                }
                MigrationStatus::Failed => {
                    self.logger.error(&format!("[{id}] migration failed"));
                    return Err(ExecutorError::PreviouslyFailed { id });
                }
                MigrationStatus::Missing => {}
            }

            self.logger.info(&format!("[{id}] executing migration"));
            migration.status = MigrationStatus::Running;
            store.save_status(ctx, migration).await?;

            if let Err(source) = migration.migrate(ctx, self.db.as_ref()).await {
                let err = ExecutorError::MigrationFailed { id, source };
                self.logger
                    .error(&format!("[{id}] migration failed; err={err}"));

                // Record the failure even when the run itself was cancelled.
                // The migration error is what the caller gets back either way.
                migration.status = MigrationStatus::Failed;
                if let Err(ledger_err) = store.save_status(&ctx.detached(), migration).await {
                    self.logger
                        .error(&format!("[{id}] failed to save migration status; err={ledger_err}"));
                }
                return Err(err);
            }

            migration.status = MigrationStatus::Done;
            store.save_status(ctx, migration).await?;
            self.logger
                .info(&format!("[{id}] migration executed successfully"));
            summary.applied += 1;
        }

        self.logger.info("all migrations executed successfully");
        Ok(summary)
    }
}

/// Migrations run in the order supplied; flag lists that look unsorted
fn warn_if_unordered(migrations: &[Migration]) {
    for pair in migrations.windows(2) {
        if pair[1].id <= pair[0].id {
            warn!(
                previous = pair[0].id,
                next = pair[1].id,
                path = %pair[1].path.display(),
                "Migration ids are not strictly increasing, running in the supplied order"
            );
        }
    }
}
