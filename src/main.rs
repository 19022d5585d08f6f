use anyhow::{Context, Result};
use arangom::config::DEFAULT_CONFIG_FILE;
use arangom::database::CreateCollectionOptions;
use arangom::{
    load_migrations, read_config, Database, Executor, MemoryDatabase, Migration, RunContext,
    RunnerConfig,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// arangom - declarative, checksum-tracked migrations for document and graph databases
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Runner configuration file (JSON). Ignored when it does not exist
    #[arg(short, long, env = "ARANGOM_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory scanned recursively for migration documents
    #[arg(long, env = "ARANGOM_MIGRATION_DIR")]
    migration_dir: Option<PathBuf>,

    /// Ledger collection name
    #[arg(long, env = "ARANGOM_COLLECTION")]
    collection: Option<String>,

    /// Create the ledger collection when it does not exist yet
    #[arg(long, env = "ARANGOM_CREATE_COLLECTION")]
    create_collection: Option<bool>,

    /// Deadline for the whole run, in seconds
    #[arg(long, env = "ARANGOM_TIMEOUT")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate every migration, printing its id, checksum and name
    Check,
    /// Run every migration against a fresh in-memory database
    DryRun,
}

impl Args {
    /// Command line values win over the configuration file
    fn apply(&self, config: &mut RunnerConfig) {
        if let Some(dir) = &self.migration_dir {
            config.migration_dir = dir.clone();
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }
        if let Some(create) = self.create_collection {
            config.create_collection = create;
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
    }
}

async fn load(config: &RunnerConfig) -> Result<Vec<Migration>> {
    let migrations = load_migrations(&config.migration_dir)
        .await
        .with_context(|| {
            format!(
                "failed to load migrations from {}",
                config.migration_dir.display()
            )
        })?;
    info!(
        count = migrations.len(),
        dir = %config.migration_dir.display(),
        "Loaded migrations"
    );
    Ok(migrations)
}

async fn check(config: &RunnerConfig) -> Result<()> {
    let migrations = load(config).await?;

    for migration in &migrations {
        for (index, operation) in migration.operations.iter().enumerate() {
            operation.prepare().with_context(|| {
                format!(
                    "{}: operation {index} ({})",
                    migration.path.display(),
                    operation.kind
                )
            })?;
        }

        let checksum = migration.checksum()?;
        println!("{:>6}  {}  {}", migration.id, checksum, migration.name());
    }

    info!("All migrations are valid");
    Ok(())
}

async fn dry_run(config: &RunnerConfig, ctx: &RunContext) -> Result<()> {
    let migrations = load(config).await?;
    let db = Arc::new(MemoryDatabase::new());

    if config.create_collection && !db.collection_exists(&config.collection).await? {
        db.create_collection(&config.collection, &CreateCollectionOptions::default())
            .await?;
    }

    let mut executor = Executor::builder()
        .database(db.clone())
        .collection(&config.collection)
        .migrations(migrations)
        .build()?;
    let summary = executor.execute(ctx).await?;

    info!(
        applied = summary.applied,
        skipped = summary.skipped,
        queries = db.queries().await.len(),
        "Dry run completed"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse CLI arguments
    let args = Args::parse();

    let mut config = read_config(&args.config)
        .await
        .with_context(|| format!("failed to read {}", args.config.display()))?
        .unwrap_or_default();
    args.apply(&mut config);

    // Cancel the run on Ctrl-C
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling run...");
            let _ = cancel_tx.send(true);
        }
    });

    let mut ctx = RunContext::background().with_cancellation(cancel_rx);
    if let Some(timeout) = config.timeout() {
        ctx = ctx.with_timeout(timeout);
    }

    match args.command {
        Command::Check => check(&config).await,
        Command::DryRun => dry_run(&config, &ctx).await,
    }
}
