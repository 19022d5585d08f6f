#![allow(dead_code)]

use arangom::database::{
    Analyzer, AnalyzerDefinition, Collection, CreateCollectionOptions, CreateGraphOptions,
    Database, DbResult, Graph, MemoryDatabase, View, ViewProperties,
};
use arangom::logging::Logger;
use arangom::migration::{Migration, MigrationRecord, MigrationStatus};
use arangom::operation::{Operation, OperationKind};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const LEDGER: &str = "migrations";

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Should create temp dir")
}

/// Write a migration document below `dir`, creating parent directories
pub async fn write_migration(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .expect("Should create migration directory");
    }
    tokio::fs::write(&path, content)
        .await
        .expect("Should write migration");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Info(String),
    Error(String),
}

/// Logger keeping every line for later assertions
#[derive(Debug, Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<LogLine>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().expect("logger lock poisoned").clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                LogLine::Error(message) => Some(message),
                LogLine::Info(_) => None,
            })
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str) {
        self.lines
            .lock()
            .expect("logger lock poisoned")
            .push(LogLine::Info(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.lines
            .lock()
            .expect("logger lock poisoned")
            .push(LogLine::Error(message.to_string()));
    }
}

pub fn info(message: &str) -> LogLine {
    LogLine::Info(message.to_string())
}

pub fn error(message: &str) -> LogLine {
    LogLine::Error(message.to_string())
}

pub fn options(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("options must be an object")
}

pub fn aql(query: &str, bind_vars: Value) -> Operation {
    Operation::new(OperationKind::ExecuteAql)
        .with_options(options(json!({ "query": query, "bindVars": bind_vars })))
}

pub fn op(kind: OperationKind, target: &str, opts: Value) -> Operation {
    Operation::new(kind)
        .with_collection(target)
        .with_options(options(opts))
}

pub fn migration(id: i64, operations: Vec<Operation>) -> Migration {
    Migration::new(id, format!("migrations/{id:03}_test.yaml"), operations)
}

/// A database holding the ledger collection and a `test` collection
pub async fn database_with_ledger() -> Arc<MemoryDatabase> {
    let db = Arc::new(MemoryDatabase::new());
    for name in [LEDGER, "test"] {
        db.create_collection(name, &CreateCollectionOptions::default())
            .await
            .expect("Should create collection");
    }
    db
}

/// Insert a ledger record for `migration` directly, bypassing the executor
pub async fn seed_record(db: &MemoryDatabase, migration: &Migration, status: MigrationStatus) {
    let record = MigrationRecord {
        key: migration.checksum().expect("Should compute checksum"),
        name: migration.name(),
        status,
        applied_at: Utc::now(),
    };
    db.collection(LEDGER)
        .await
        .expect("Should resolve ledger")
        .create_document(&serde_json::to_value(&record).expect("Should encode record"))
        .await
        .expect("Should seed record");
}

pub async fn ledger_status(db: &MemoryDatabase, migration: &Migration) -> Option<String> {
    let checksum = migration.checksum().expect("Should compute checksum");
    db.document(LEDGER, &checksum)
        .await
        .and_then(|doc| doc["status"].as_str().map(str::to_string))
}

/// Database whose queries never finish on their own
pub struct StallingDatabase {
    pub inner: MemoryDatabase,
}

#[async_trait]
impl Database for StallingDatabase {
    async fn query(&self, query: &str, bind_vars: &Map<String, Value>) -> DbResult<Vec<Value>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        self.inner.query(query, bind_vars).await
    }

    async fn collection_exists(&self, name: &str) -> DbResult<bool> {
        self.inner.collection_exists(name).await
    }

    async fn collection(&self, name: &str) -> DbResult<Arc<dyn Collection>> {
        self.inner.collection(name).await
    }

    async fn create_collection(
        &self,
        name: &str,
        options: &CreateCollectionOptions,
    ) -> DbResult<Arc<dyn Collection>> {
        self.inner.create_collection(name, options).await
    }

    async fn graph(&self, name: &str) -> DbResult<Arc<dyn Graph>> {
        self.inner.graph(name).await
    }

    async fn create_graph(
        &self,
        name: &str,
        options: &CreateGraphOptions,
    ) -> DbResult<Arc<dyn Graph>> {
        self.inner.create_graph(name, options).await
    }

    async fn view(&self, name: &str) -> DbResult<Arc<dyn View>> {
        self.inner.view(name).await
    }

    async fn create_view(
        &self,
        name: &str,
        properties: &ViewProperties,
    ) -> DbResult<Arc<dyn View>> {
        self.inner.create_view(name, properties).await
    }

    async fn analyzer(&self, name: &str) -> DbResult<Arc<dyn Analyzer>> {
        self.inner.analyzer(name).await
    }

    async fn ensure_analyzer(
        &self,
        definition: &AnalyzerDefinition,
    ) -> DbResult<(bool, Arc<dyn Analyzer>)> {
        self.inner.ensure_analyzer(definition).await
    }
}
