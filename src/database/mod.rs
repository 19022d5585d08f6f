//! Database capability interface.
//!
//! The migration engine never talks to a transport directly. Everything it
//! needs from the target database is expressed by the traits in this module:
//! a [`Database`] resolves named handles ([`Collection`], [`Graph`],
//! [`View`], [`Index`], [`Analyzer`]) and each handle exposes the schema
//! management calls the operation registry dispatches to.
//!
//! [`MemoryDatabase`] is an in-process implementation used by the test
//! suite and by the CLI's dry run.

mod memory;
mod types;

pub use memory::{MemoryDatabase, QueryRecord};
pub use types::{
    AnalyzerDefinition, AnalyzerFeature, CollectionProperties, CollectionSchema, CollectionType,
    Compression, CreateCollectionOptions, CreateGraphOptions, DocumentMeta, EdgeDefinition,
    FulltextIndexOptions, GeoIndexOptions, HashIndexOptions, IndexDefinition, IndexInfo,
    IndexType, InvertedField, InvertedIndexOptions, KeyGenerator, KeyOptions,
    PersistentIndexOptions, PrimarySortEntry, SchemaLevel, StoreValues, StoredValue,
    TtlIndexOptions, VertexConstraints, ViewLink, ViewProperties, ZkdFieldType, ZkdIndexOptions,
};

use crate::executor::Interrupted;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by the database capability surface
#[derive(Error, Debug)]
pub enum DbError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' already exists")]
    Conflict { kind: &'static str, name: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Backend(String),
}

impl DbError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn conflict(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// A database the migrations are applied to
#[async_trait]
pub trait Database: Send + Sync {
    /// Run an ad-hoc query with bind variables and return its result rows
    async fn query(&self, query: &str, bind_vars: &Map<String, Value>) -> DbResult<Vec<Value>>;

    async fn collection_exists(&self, name: &str) -> DbResult<bool>;

    /// Resolve an existing collection
    async fn collection(&self, name: &str) -> DbResult<Arc<dyn Collection>>;

    async fn create_collection(
        &self,
        name: &str,
        options: &CreateCollectionOptions,
    ) -> DbResult<Arc<dyn Collection>>;

    /// Resolve an existing named graph
    async fn graph(&self, name: &str) -> DbResult<Arc<dyn Graph>>;

    async fn create_graph(
        &self,
        name: &str,
        options: &CreateGraphOptions,
    ) -> DbResult<Arc<dyn Graph>>;

    /// Resolve an existing search view
    async fn view(&self, name: &str) -> DbResult<Arc<dyn View>>;

    async fn create_view(&self, name: &str, properties: &ViewProperties)
        -> DbResult<Arc<dyn View>>;

    /// Resolve an existing analyzer
    async fn analyzer(&self, name: &str) -> DbResult<Arc<dyn Analyzer>>;

    /// Create an analyzer unless an identical one exists.
    ///
    /// Returns `true` alongside the handle when the analyzer already existed.
    async fn ensure_analyzer(
        &self,
        definition: &AnalyzerDefinition,
    ) -> DbResult<(bool, Arc<dyn Analyzer>)>;
}

/// A document collection
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    async fn document_exists(&self, key: &str) -> DbResult<bool>;

    /// Insert a new document; the document must carry its `_key`
    async fn create_document(&self, document: &Value) -> DbResult<DocumentMeta>;

    async fn read_document(&self, key: &str) -> DbResult<Value>;

    /// Patch an existing document with the attributes of `document`
    async fn update_document(&self, key: &str, document: &Value) -> DbResult<DocumentMeta>;

    async fn set_properties(&self, properties: &CollectionProperties) -> DbResult<()>;

    /// Drop the collection with all its documents and indexes
    async fn remove(&self) -> DbResult<()>;

    /// Create an index unless an equivalent one exists.
    ///
    /// Returns `true` alongside the index description when it was created.
    async fn ensure_index(&self, definition: &IndexDefinition) -> DbResult<(bool, IndexInfo)>;

    /// Resolve an index by name or id
    async fn index(&self, name: &str) -> DbResult<Arc<dyn Index>>;
}

/// A named graph
#[async_trait]
pub trait Graph: Send + Sync {
    fn name(&self) -> &str;

    async fn add_vertex_collection(&self, collection: &str, satellites: &[String]) -> DbResult<()>;

    async fn remove_vertex_collection(&self, collection: &str, drop_collection: bool)
        -> DbResult<()>;

    async fn add_edge_definition(
        &self,
        definition: &EdgeDefinition,
        satellites: &[String],
    ) -> DbResult<()>;

    async fn remove_edge_definition(&self, collection: &str, drop_collection: bool)
        -> DbResult<()>;

    async fn remove(&self) -> DbResult<()>;
}

/// A search view
#[async_trait]
pub trait View: Send + Sync {
    fn name(&self) -> &str;

    /// Partially update the view's properties
    async fn set_properties(&self, properties: &ViewProperties) -> DbResult<()>;

    async fn remove(&self) -> DbResult<()>;
}

#[async_trait]
pub trait Index: Send + Sync {
    fn name(&self) -> &str;

    async fn remove(&self) -> DbResult<()>;
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    /// Remove the analyzer; `force` removes it even while views use it
    async fn remove(&self, force: bool) -> DbResult<()>;
}
