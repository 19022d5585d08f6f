mod common;

use arangom::database::{Database, DbError, MemoryDatabase};
use arangom::executor::{Executor, ExecutorError, Interrupted, RunContext, RunSummary};
use arangom::ledger::LedgerError;
use arangom::migration::{Migration, MigrationStatus};
use arangom::operation::{OperationError, OperationKind};
use common::{
    aql, database_with_ledger, error, info, ledger_status, migration, op, seed_record,
    RecordingLogger, StallingDatabase, LEDGER,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn executor(
    db: Arc<dyn Database>,
    migrations: Vec<Migration>,
    logger: &Arc<RecordingLogger>,
) -> Executor {
    Executor::builder()
        .database(db)
        .collection(LEDGER)
        .migrations(migrations)
        .logger(logger.clone())
        .build()
        .expect("Should build executor")
}

fn scan_test() -> arangom::operation::Operation {
    aql(
        "FOR doc IN @@collection RETURN doc",
        json!({ "@collection": "test" }),
    )
}

#[tokio::test]
async fn test_execute_aql_migration_records_done() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let m = migration(1, vec![scan_test()]);

    let mut exec = executor(db.clone(), vec![m.clone()], &logger);
    let summary = exec
        .execute(&RunContext::background())
        .await
        .expect("Should execute migrations");

    assert_eq!(summary, RunSummary { applied: 1, skipped: 0 });

    let queries = db.queries().await;
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].query, "FOR doc IN @@collection RETURN doc");
    assert_eq!(queries[0].bind_vars["@collection"], "test");

    let record = db
        .document(LEDGER, &m.checksum().unwrap())
        .await
        .expect("Should write a ledger record");
    assert_eq!(record["status"], "done");
    assert_eq!(record["name"], "001_test");
    assert!(record["appliedAt"].is_string());

    assert_eq!(exec.migrations()[0].status, MigrationStatus::Done);
    assert_eq!(
        logger.lines(),
        vec![
            info("connecting to the migration collection \"migrations\""),
            info("[1] fetching migration status"),
            info("[1] executing migration"),
            info("[1] migration executed successfully"),
            info("all migrations executed successfully"),
        ]
    );
}

#[tokio::test]
async fn test_second_run_executes_nothing() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let migrations = vec![
        migration(1, vec![scan_test()]),
        migration(2, vec![op(OperationKind::CreateCollection, "users", json!({}))]),
    ];

    let first = executor(db.clone(), migrations.clone(), &logger)
        .execute(&RunContext::background())
        .await
        .expect("First run should succeed");
    assert_eq!(first, RunSummary { applied: 2, skipped: 0 });

    let second_logger = Arc::new(RecordingLogger::default());
    let second = executor(db.clone(), migrations, &second_logger)
        .execute(&RunContext::background())
        .await
        .expect("Second run should succeed");

    assert_eq!(second, RunSummary { applied: 0, skipped: 2 });
    assert_eq!(db.queries().await.len(), 1);
    assert_eq!(db.documents(LEDGER).await.len(), 2);
    assert!(second_logger
        .lines()
        .contains(&info("[2] migration already executed")));
}

#[tokio::test]
async fn test_first_failure_stops_the_run() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let failing = migration(1, vec![op(OperationKind::DeleteCollection, "ghosts", json!({}))]);
    let never_run = migration(2, vec![scan_test()]);

    let err = executor(db.clone(), vec![failing.clone(), never_run.clone()], &logger)
        .execute(&RunContext::background())
        .await
        .expect_err("Run should fail");

    assert!(err.is_migration_failed());
    assert_eq!(err.migration_id(), Some(1));
    assert!(err.to_string().starts_with("migration failed: "));
    assert!(matches!(
        err,
        ExecutorError::MigrationFailed {
            source: OperationError::Database(DbError::NotFound { .. }),
            ..
        }
    ));

    assert!(db.queries().await.is_empty());
    assert_eq!(ledger_status(&db, &failing).await.as_deref(), Some("failed"));
    assert_eq!(ledger_status(&db, &never_run).await, None);

    let errors = logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("[1] migration failed; err=migration failed: "));
    assert!(!logger
        .lines()
        .contains(&info("all migrations executed successfully")));
}

#[tokio::test]
async fn test_done_record_is_skipped() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let done = migration(1, vec![aql("RETURN 1", json!({}))]);
    let pending = migration(2, vec![aql("RETURN 2", json!({}))]);
    seed_record(&db, &done, MigrationStatus::Done).await;

    let mut exec = executor(db.clone(), vec![done, pending], &logger);
    let summary = exec
        .execute(&RunContext::background())
        .await
        .expect("Should execute migrations");

    assert_eq!(summary, RunSummary { applied: 1, skipped: 1 });
    let queries: Vec<_> = db.queries().await.into_iter().map(|q| q.query).collect();
    assert_eq!(queries, vec!["RETURN 2".to_string()]);
    assert_eq!(exec.migrations()[0].status, MigrationStatus::Done);
}

#[tokio::test]
async fn test_failed_record_aborts_without_writing() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let failed = migration(1, vec![scan_test()]);
    let after = migration(2, vec![scan_test()]);
    seed_record(&db, &failed, MigrationStatus::Failed).await;
    let before = db.document(LEDGER, &failed.checksum().unwrap()).await;

    let err = executor(db.clone(), vec![failed.clone(), after.clone()], &logger)
        .execute(&RunContext::background())
        .await
        .expect_err("Run should abort");

    assert!(matches!(err, ExecutorError::PreviouslyFailed { id: 1 }));
    assert_eq!(err.to_string(), "migration failed");
    assert!(db.queries().await.is_empty());
    assert_eq!(db.document(LEDGER, &failed.checksum().unwrap()).await, before);
    assert_eq!(ledger_status(&db, &after).await, None);
    assert_eq!(
        logger.lines(),
        vec![
            info("connecting to the migration collection \"migrations\""),
            info("[1] fetching migration status"),
            error("[1] migration failed"),
        ]
    );
}

#[tokio::test]
async fn test_running_record_is_skipped() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let stale = migration(4, vec![scan_test()]);
    let next = migration(5, vec![aql("RETURN 5", json!({}))]);
    seed_record(&db, &stale, MigrationStatus::Running).await;

    let mut exec = executor(db.clone(), vec![stale.clone(), next.clone()], &logger);
    let summary = exec
        .execute(&RunContext::background())
        .await
        .expect("Should execute migrations");

    assert_eq!(summary, RunSummary { applied: 1, skipped: 1 });
    let queries: Vec<_> = db.queries().await.into_iter().map(|q| q.query).collect();
    assert_eq!(queries, vec!["RETURN 5".to_string()]);
    assert_eq!(ledger_status(&db, &stale).await.as_deref(), Some("running"));
    assert_eq!(ledger_status(&db, &next).await.as_deref(), Some("done"));
    assert_eq!(exec.migrations()[0].status, MigrationStatus::Running);
    assert!(logger
        .lines()
        .contains(&info("[4] migration already executed")));
}

#[tokio::test]
async fn test_unrecordable_failure_still_reports_migration_error() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    // Dropping the ledger mid-migration leaves nowhere to record the failure.
    let m = migration(
        1,
        vec![
            op(OperationKind::DeleteCollection, LEDGER, json!({})),
            op(OperationKind::DeleteCollection, "ghosts", json!({})),
        ],
    );

    let err = executor(db.clone(), vec![m], &logger)
        .execute(&RunContext::background())
        .await
        .expect_err("Run should fail");

    assert!(err.is_migration_failed());
    assert_eq!(err.migration_id(), Some(1));
    assert!(matches!(
        err,
        ExecutorError::MigrationFailed {
            source: OperationError::Database(DbError::NotFound { name: ref n, .. }),
            ..
        } if n == "ghosts"
    ));

    let errors = logger.errors();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("[1] migration failed; err=migration failed: "));
    assert!(errors[1].starts_with("[1] failed to save migration status; err="));
    assert!(errors[1].contains("'migrations' not found"));
}

#[tokio::test]
async fn test_missing_ledger_collection_fails_before_any_migration() {
    let db = Arc::new(MemoryDatabase::new());
    let logger = Arc::new(RecordingLogger::default());

    let err = executor(db.clone(), vec![migration(1, vec![])], &logger)
        .execute(&RunContext::background())
        .await
        .expect_err("Run should fail");

    assert!(matches!(
        err,
        ExecutorError::Ledger(LedgerError::Database(ref e)) if e.is_not_found()
    ));
    assert!(!err.is_migration_failed());
    assert_eq!(
        logger.lines(),
        vec![info("connecting to the migration collection \"migrations\"")]
    );
}

#[tokio::test]
async fn test_custom_ledger_collection() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let m = migration(1, vec![]);

    let mut exec = Executor::builder()
        .database(db.clone())
        .collection("test")
        .migrations(vec![m.clone()])
        .logger(logger.clone())
        .build()
        .expect("Should build executor");
    exec.execute(&RunContext::background())
        .await
        .expect("Should execute migrations");

    assert!(db.document("test", &m.checksum().unwrap()).await.is_some());
    assert!(db.documents(LEDGER).await.is_empty());
}

#[tokio::test]
async fn test_supplied_order_is_kept() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let migrations = vec![
        migration(2, vec![aql("RETURN 2", json!({}))]),
        migration(1, vec![aql("RETURN 1", json!({}))]),
    ];

    executor(db.clone(), migrations, &logger)
        .execute(&RunContext::background())
        .await
        .expect("Should execute migrations");

    let queries: Vec<_> = db.queries().await.into_iter().map(|q| q.query).collect();
    assert_eq!(queries, vec!["RETURN 2".to_string(), "RETURN 1".to_string()]);
}

#[tokio::test]
async fn test_deadline_marks_migration_failed() {
    let inner = MemoryDatabase::new();
    let ledger_view = inner.clone();
    inner
        .create_collection(LEDGER, &Default::default())
        .await
        .expect("Should create ledger");
    let db = Arc::new(StallingDatabase { inner });
    let logger = Arc::new(RecordingLogger::default());
    let m = migration(1, vec![aql("RETURN 1", json!({}))]);

    let ctx = RunContext::background().with_timeout(Duration::from_millis(50));
    let err = executor(db, vec![m.clone()], &logger)
        .execute(&ctx)
        .await
        .expect_err("Run should time out");

    assert!(matches!(
        err,
        ExecutorError::MigrationFailed {
            source: OperationError::Database(DbError::Interrupted(Interrupted::DeadlineExceeded)),
            ..
        }
    ));
    assert_eq!(ledger_status(&ledger_view, &m).await.as_deref(), Some("failed"));
}

#[tokio::test]
async fn test_cancellation_marks_migration_failed() {
    let inner = MemoryDatabase::new();
    let ledger_view = inner.clone();
    inner
        .create_collection(LEDGER, &Default::default())
        .await
        .expect("Should create ledger");
    let db = Arc::new(StallingDatabase { inner });
    let logger = Arc::new(RecordingLogger::default());
    let m = migration(1, vec![aql("RETURN 1", json!({}))]);

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(true);
    });

    let ctx = RunContext::background().with_cancellation(rx);
    let err = executor(db, vec![m.clone()], &logger)
        .execute(&ctx)
        .await
        .expect_err("Run should be cancelled");

    assert!(err.is_migration_failed());
    assert!(err.to_string().contains("operation cancelled"));
    assert_eq!(ledger_status(&ledger_view, &m).await.as_deref(), Some("failed"));
}

#[tokio::test]
async fn test_cancelled_before_start_writes_nothing() {
    let db = database_with_ledger().await;
    let logger = Arc::new(RecordingLogger::default());
    let (tx, rx) = watch::channel(false);
    tx.send(true).expect("Should cancel");

    let err = executor(db.clone(), vec![migration(1, vec![scan_test()])], &logger)
        .execute(&RunContext::background().with_cancellation(rx))
        .await
        .expect_err("Run should be cancelled");

    assert!(matches!(
        err,
        ExecutorError::Ledger(LedgerError::Database(DbError::Interrupted(
            Interrupted::Cancelled
        )))
    ));
    assert!(db.documents(LEDGER).await.is_empty());
}
