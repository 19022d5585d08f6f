pub mod config;
pub mod database;
pub mod executor;
pub mod ledger;
pub mod logging;
pub mod migration;
pub mod operation;
pub mod utils;

// Re-export commonly used types
pub use config::{read_config, ConfigError, RunnerConfig};
pub use database::{Database, DbError, MemoryDatabase};
pub use executor::{Executor, ExecutorBuilder, ExecutorError, Interrupted, RunContext, RunSummary};
pub use ledger::{LedgerError, StatusStore};
pub use logging::{Logger, TracingLogger};
pub use migration::{
    load_migration, load_migrations, Migration, MigrationError, MigrationRecord, MigrationStatus,
};
pub use operation::{Operation, OperationCall, OperationError, OperationKind};
