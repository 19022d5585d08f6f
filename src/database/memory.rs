//! In-process database implementing the full capability surface.
//!
//! State lives behind a single async mutex shared by every handle, so a
//! handle resolved before a collection was dropped reports `NotFound` on its
//! next call, the same way a server-side handle would.

use super::{
    Analyzer, AnalyzerDefinition, Collection, CollectionProperties, CollectionType,
    CreateCollectionOptions, CreateGraphOptions, Database, DbError, DbResult, DocumentMeta,
    EdgeDefinition, Graph, Index, IndexDefinition, IndexInfo, View, ViewProperties,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Analyzers every database ships with
const BUILTIN_ANALYZERS: [&str; 13] = [
    "identity", "text_de", "text_en", "text_es", "text_fi", "text_fr", "text_it", "text_nl",
    "text_no", "text_pt", "text_ru", "text_sv", "text_zh",
];

/// A query received by [`MemoryDatabase`]
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub query: String,
    pub bind_vars: Map<String, Value>,
}

#[derive(Debug, Default)]
struct CollectionState {
    options: CreateCollectionOptions,
    documents: BTreeMap<String, Value>,
    indexes: Vec<IndexInfo>,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, CollectionState>,
    graphs: BTreeMap<String, CreateGraphOptions>,
    views: BTreeMap<String, ViewProperties>,
    analyzers: BTreeMap<String, AnalyzerDefinition>,
    queries: Vec<QueryRecord>,
    sequence: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn collection(&self, name: &str) -> DbResult<&CollectionState> {
        self.collections
            .get(name)
            .ok_or_else(|| DbError::not_found("collection", name))
    }

    fn collection_mut(&mut self, name: &str) -> DbResult<&mut CollectionState> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| DbError::not_found("collection", name))
    }

    /// Create `name` if missing, as graph definitions do implicitly
    fn ensure_collection(&mut self, name: &str, collection_type: CollectionType) -> DbResult<()> {
        if let Some(existing) = self.collections.get(name) {
            if collection_type == CollectionType::Edge
                && existing.options.collection_type() != CollectionType::Edge
            {
                return Err(DbError::InvalidRequest(format!(
                    "collection '{name}' is not an edge collection"
                )));
            }
            return Ok(());
        }

        let options = CreateCollectionOptions {
            collection_type: Some(collection_type),
            ..CreateCollectionOptions::default()
        };
        self.collections.insert(
            name.to_string(),
            CollectionState {
                options,
                ..CollectionState::default()
            },
        );
        Ok(())
    }

    fn ensure_edge_definition(&mut self, definition: &EdgeDefinition) -> DbResult<()> {
        self.ensure_collection(&definition.collection, CollectionType::Edge)?;
        for vertex in definition.from.iter().chain(definition.to.iter()) {
            self.ensure_collection(vertex, CollectionType::Document)?;
        }
        Ok(())
    }

    fn analyzer_known(&self, name: &str) -> bool {
        BUILTIN_ANALYZERS.contains(&name) || self.analyzers.contains_key(name)
    }

    fn validate_view(&self, properties: &ViewProperties) -> DbResult<()> {
        for (collection, link) in &properties.links {
            self.collection(collection)?;
            for analyzer in link.referenced_analyzers() {
                if !self.analyzer_known(analyzer) {
                    return Err(DbError::not_found("analyzer", analyzer));
                }
            }
        }
        Ok(())
    }

    fn analyzer_in_use(&self, name: &str) -> bool {
        self.views.values().any(|view| {
            view.links
                .values()
                .any(|link| link.referenced_analyzers().contains(&name))
        })
    }

    fn graph_mut(&mut self, name: &str) -> DbResult<&mut CreateGraphOptions> {
        self.graphs
            .get_mut(name)
            .ok_or_else(|| DbError::not_found("graph", name))
    }
}

/// Extract the bind parameters a query references, skipping string literals.
///
/// Collection parameters keep their leading `@` (`@@users` yields `@users`).
fn referenced_bind_parameters(query: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut chars = query.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '@' => {
                let mut name = String::new();
                if chars.peek() == Some(&'@') {
                    chars.next();
                    name.push('@');
                }
                let prefix = name.len();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.len() > prefix && !names.contains(&name) {
                    names.push(name);
                }
            }
            _ => {}
        }
    }

    names
}

/// In-memory [`Database`] with realistic not-found and conflict semantics
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query executed so far, in execution order
    pub async fn queries(&self) -> Vec<QueryRecord> {
        self.state.lock().await.queries.clone()
    }

    pub async fn document(&self, collection: &str, key: &str) -> Option<Value> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection)
            .and_then(|c| c.documents.get(key).cloned())
    }

    pub async fn documents(&self, collection: &str) -> Vec<Value> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection)
            .map(|c| c.documents.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn collection_options(&self, name: &str) -> Option<CreateCollectionOptions> {
        let state = self.state.lock().await;
        state.collections.get(name).map(|c| c.options.clone())
    }

    pub async fn indexes(&self, collection: &str) -> Vec<IndexInfo> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default()
    }

    pub async fn graph_options(&self, name: &str) -> Option<CreateGraphOptions> {
        self.state.lock().await.graphs.get(name).cloned()
    }

    pub async fn view_properties(&self, name: &str) -> Option<ViewProperties> {
        self.state.lock().await.views.get(name).cloned()
    }

    pub async fn analyzer_definition(&self, name: &str) -> Option<AnalyzerDefinition> {
        self.state.lock().await.analyzers.get(name).cloned()
    }

    fn collection_handle(&self, name: &str) -> Arc<dyn Collection> {
        Arc::new(MemoryCollection {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    fn graph_handle(&self, name: &str) -> Arc<dyn Graph> {
        Arc::new(MemoryGraph {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    fn view_handle(&self, name: &str) -> Arc<dyn View> {
        Arc::new(MemoryView {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    fn analyzer_handle(&self, name: &str) -> Arc<dyn Analyzer> {
        Arc::new(MemoryAnalyzer {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn query(&self, query: &str, bind_vars: &Map<String, Value>) -> DbResult<Vec<Value>> {
        if query.trim().is_empty() {
            return Err(DbError::Query("query is empty".to_string()));
        }

        let mut state = self.state.lock().await;
        let referenced = referenced_bind_parameters(query);

        for name in &referenced {
            let value = bind_vars.get(name).ok_or_else(|| {
                DbError::Query(format!(
                    "no value specified for declared bind parameter '{name}'"
                ))
            })?;

            if name.starts_with('@') {
                let collection = value.as_str().ok_or_else(|| {
                    DbError::Query(format!(
                        "bind parameter '{name}' has an invalid value or type"
                    ))
                })?;
                state.collection(collection)?;
            }
        }

        if let Some(unused) = bind_vars.keys().find(|key| !referenced.contains(key)) {
            return Err(DbError::Query(format!(
                "bind parameter '{unused}' was not declared in the query"
            )));
        }

        state.queries.push(QueryRecord {
            query: query.to_string(),
            bind_vars: bind_vars.clone(),
        });
        Ok(Vec::new())
    }

    async fn collection_exists(&self, name: &str) -> DbResult<bool> {
        Ok(self.state.lock().await.collections.contains_key(name))
    }

    async fn collection(&self, name: &str) -> DbResult<Arc<dyn Collection>> {
        self.state.lock().await.collection(name)?;
        Ok(self.collection_handle(name))
    }

    async fn create_collection(
        &self,
        name: &str,
        options: &CreateCollectionOptions,
    ) -> DbResult<Arc<dyn Collection>> {
        if name.is_empty() {
            return Err(DbError::InvalidRequest("collection name is empty".to_string()));
        }

        let mut state = self.state.lock().await;
        if state.collections.contains_key(name) || state.views.contains_key(name) {
            return Err(DbError::conflict("collection", name));
        }

        state.collections.insert(
            name.to_string(),
            CollectionState {
                options: options.clone(),
                ..CollectionState::default()
            },
        );
        Ok(self.collection_handle(name))
    }

    async fn graph(&self, name: &str) -> DbResult<Arc<dyn Graph>> {
        let state = self.state.lock().await;
        if !state.graphs.contains_key(name) {
            return Err(DbError::not_found("graph", name));
        }
        Ok(self.graph_handle(name))
    }

    async fn create_graph(
        &self,
        name: &str,
        options: &CreateGraphOptions,
    ) -> DbResult<Arc<dyn Graph>> {
        let mut state = self.state.lock().await;
        if state.graphs.contains_key(name) {
            return Err(DbError::conflict("graph", name));
        }

        for (i, definition) in options.edge_definitions.iter().enumerate() {
            if options.edge_definitions[..i]
                .iter()
                .any(|other| other.collection == definition.collection)
            {
                return Err(DbError::InvalidRequest(format!(
                    "edge collection '{}' is defined twice",
                    definition.collection
                )));
            }
            state.ensure_edge_definition(definition)?;
        }
        for orphan in &options.orphan_vertex_collections {
            state.ensure_collection(orphan, CollectionType::Document)?;
        }

        state.graphs.insert(name.to_string(), options.clone());
        Ok(self.graph_handle(name))
    }

    async fn view(&self, name: &str) -> DbResult<Arc<dyn View>> {
        let state = self.state.lock().await;
        if !state.views.contains_key(name) {
            return Err(DbError::not_found("view", name));
        }
        Ok(self.view_handle(name))
    }

    async fn create_view(
        &self,
        name: &str,
        properties: &ViewProperties,
    ) -> DbResult<Arc<dyn View>> {
        let mut state = self.state.lock().await;
        if state.views.contains_key(name) || state.collections.contains_key(name) {
            return Err(DbError::conflict("view", name));
        }

        state.validate_view(properties)?;
        state.views.insert(name.to_string(), properties.clone());
        Ok(self.view_handle(name))
    }

    async fn analyzer(&self, name: &str) -> DbResult<Arc<dyn Analyzer>> {
        let state = self.state.lock().await;
        if !state.analyzers.contains_key(name) {
            return Err(DbError::not_found("analyzer", name));
        }
        Ok(self.analyzer_handle(name))
    }

    async fn ensure_analyzer(
        &self,
        definition: &AnalyzerDefinition,
    ) -> DbResult<(bool, Arc<dyn Analyzer>)> {
        if definition.analyzer_type.is_empty() {
            return Err(DbError::InvalidRequest(format!(
                "analyzer '{}' has no type",
                definition.name
            )));
        }

        let mut state = self.state.lock().await;
        if BUILTIN_ANALYZERS.contains(&definition.name.as_str()) {
            return Err(DbError::conflict("analyzer", definition.name.clone()));
        }

        let existed = match state.analyzers.get(&definition.name) {
            Some(existing) if existing == definition => true,
            Some(_) => return Err(DbError::conflict("analyzer", definition.name.clone())),
            None => {
                state
                    .analyzers
                    .insert(definition.name.clone(), definition.clone());
                false
            }
        };

        Ok((existed, self.analyzer_handle(&definition.name)))
    }
}

struct MemoryCollection {
    name: String,
    state: Arc<Mutex<State>>,
}

/// Stamp a fresh revision onto a stored document
fn with_revision(document: &mut Value, rev: &str) {
    if let Some(object) = document.as_object_mut() {
        object.insert("_rev".to_string(), Value::String(rev.to_string()));
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn document_exists(&self, key: &str) -> DbResult<bool> {
        let state = self.state.lock().await;
        Ok(state.collection(&self.name)?.documents.contains_key(key))
    }

    async fn create_document(&self, document: &Value) -> DbResult<DocumentMeta> {
        let key = document
            .get("_key")
            .and_then(Value::as_str)
            .ok_or_else(|| DbError::InvalidRequest("document is missing its _key".to_string()))?
            .to_string();

        let mut state = self.state.lock().await;
        let rev = state.next_id().to_string();
        let collection = state.collection_mut(&self.name)?;
        if collection.documents.contains_key(&key) {
            return Err(DbError::conflict("document", key));
        }

        let mut stored = document.clone();
        with_revision(&mut stored, &rev);
        collection.documents.insert(key.clone(), stored);
        Ok(DocumentMeta { key, rev })
    }

    async fn read_document(&self, key: &str) -> DbResult<Value> {
        let state = self.state.lock().await;
        state
            .collection(&self.name)?
            .documents
            .get(key)
            .cloned()
            .ok_or_else(|| DbError::not_found("document", key))
    }

    async fn update_document(&self, key: &str, document: &Value) -> DbResult<DocumentMeta> {
        let patch = document
            .as_object()
            .ok_or_else(|| DbError::InvalidRequest("document must be an object".to_string()))?;

        let mut state = self.state.lock().await;
        let rev = state.next_id().to_string();
        let collection = state.collection_mut(&self.name)?;
        let stored = collection
            .documents
            .get_mut(key)
            .ok_or_else(|| DbError::not_found("document", key))?;

        if let Some(object) = stored.as_object_mut() {
            for (field, value) in patch {
                if field != "_key" {
                    object.insert(field.clone(), value.clone());
                }
            }
        }
        with_revision(stored, &rev);

        Ok(DocumentMeta {
            key: key.to_string(),
            rev,
        })
    }

    async fn set_properties(&self, properties: &CollectionProperties) -> DbResult<()> {
        let mut state = self.state.lock().await;
        let options = &mut state.collection_mut(&self.name)?.options;

        if properties.wait_for_sync.is_some() {
            options.wait_for_sync = properties.wait_for_sync;
        }
        if properties.replication_factor.is_some() {
            options.replication_factor = properties.replication_factor;
        }
        if properties.write_concern.is_some() {
            options.write_concern = properties.write_concern;
        }
        if properties.schema.is_some() {
            options.schema = properties.schema.clone();
        }
        if properties.cache_enabled.is_some() {
            options.cache_enabled = properties.cache_enabled;
        }
        Ok(())
    }

    async fn remove(&self) -> DbResult<()> {
        let mut state = self.state.lock().await;
        state
            .collections
            .remove(&self.name)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("collection", self.name.clone()))
    }

    async fn ensure_index(&self, definition: &IndexDefinition) -> DbResult<(bool, IndexInfo)> {
        let fields = definition.fields();
        if fields.is_empty() || fields.iter().any(String::is_empty) {
            return Err(DbError::InvalidRequest(format!(
                "{} index requires at least one field",
                definition.index_type()
            )));
        }

        let mut state = self.state.lock().await;
        let id = state.next_id();
        let collection = state.collection_mut(&self.name)?;
        let index_type = definition.index_type();

        if let Some(existing) = collection
            .indexes
            .iter()
            .find(|index| index.index_type == index_type && index.fields == fields)
        {
            return Ok((false, existing.clone()));
        }

        if let Some(name) = definition.name() {
            if collection.indexes.iter().any(|index| index.name == name) {
                return Err(DbError::conflict("index", name));
            }
        }

        let info = IndexInfo {
            id: format!("{}/{}", self.name, id),
            name: definition
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("idx_{id}")),
            index_type,
            fields,
        };
        collection.indexes.push(info.clone());
        Ok((true, info))
    }

    async fn index(&self, name: &str) -> DbResult<Arc<dyn Index>> {
        let state = self.state.lock().await;
        let info = state
            .collection(&self.name)?
            .indexes
            .iter()
            .find(|index| index.name == name || index.id == name)
            .ok_or_else(|| DbError::not_found("index", name))?;

        Ok(Arc::new(MemoryIndex {
            collection: self.name.clone(),
            name: info.name.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryIndex {
    collection: String,
    name: String,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Index for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn remove(&self) -> DbResult<()> {
        let mut state = self.state.lock().await;
        let collection = state.collection_mut(&self.collection)?;
        let position = collection
            .indexes
            .iter()
            .position(|index| index.name == self.name)
            .ok_or_else(|| DbError::not_found("index", self.name.clone()))?;
        collection.indexes.remove(position);
        Ok(())
    }
}

struct MemoryGraph {
    name: String,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Graph for MemoryGraph {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add_vertex_collection(&self, collection: &str, satellites: &[String]) -> DbResult<()> {
        let mut state = self.state.lock().await;
        let graph = state.graph_mut(&self.name)?;
        let in_definitions = graph
            .edge_definitions
            .iter()
            .any(|d| d.from.iter().chain(d.to.iter()).any(|v| v == collection));
        if in_definitions || graph.orphan_vertex_collections.iter().any(|v| v == collection) {
            return Err(DbError::conflict("vertex collection", collection));
        }

        graph.orphan_vertex_collections.push(collection.to_string());
        graph.satellites.extend(satellites.iter().cloned());
        state.ensure_collection(collection, CollectionType::Document)
    }

    async fn remove_vertex_collection(
        &self,
        collection: &str,
        drop_collection: bool,
    ) -> DbResult<()> {
        let mut state = self.state.lock().await;
        let graph = state.graph_mut(&self.name)?;

        if let Some(position) = graph
            .orphan_vertex_collections
            .iter()
            .position(|v| v == collection)
        {
            graph.orphan_vertex_collections.remove(position);
        } else if graph
            .edge_definitions
            .iter()
            .any(|d| d.from.iter().chain(d.to.iter()).any(|v| v == collection))
        {
            return Err(DbError::InvalidRequest(format!(
                "vertex collection '{collection}' is used in an edge definition of graph '{}'",
                self.name
            )));
        } else {
            return Err(DbError::not_found("vertex collection", collection));
        }

        if drop_collection {
            state.collections.remove(collection);
        }
        Ok(())
    }

    async fn add_edge_definition(
        &self,
        definition: &EdgeDefinition,
        satellites: &[String],
    ) -> DbResult<()> {
        let mut state = self.state.lock().await;
        let graph = state.graph_mut(&self.name)?;
        if graph
            .edge_definitions
            .iter()
            .any(|d| d.collection == definition.collection)
        {
            return Err(DbError::conflict("edge definition", definition.collection.clone()));
        }

        graph
            .orphan_vertex_collections
            .retain(|v| !definition.from.contains(v) && !definition.to.contains(v));
        graph.edge_definitions.push(definition.clone());
        graph.satellites.extend(satellites.iter().cloned());
        state.ensure_edge_definition(definition)
    }

    async fn remove_edge_definition(
        &self,
        collection: &str,
        drop_collection: bool,
    ) -> DbResult<()> {
        let mut state = self.state.lock().await;
        let graph = state.graph_mut(&self.name)?;
        let position = graph
            .edge_definitions
            .iter()
            .position(|d| d.collection == collection)
            .ok_or_else(|| DbError::not_found("edge definition", collection))?;
        let removed = graph.edge_definitions.remove(position);

        // Vertex collections no longer connected by any edge stay in the graph as orphans.
        for vertex in removed.from.iter().chain(removed.to.iter()) {
            let still_used = graph
                .edge_definitions
                .iter()
                .any(|d| d.from.iter().chain(d.to.iter()).any(|v| v == vertex));
            if !still_used && !graph.orphan_vertex_collections.contains(vertex) {
                graph.orphan_vertex_collections.push(vertex.clone());
            }
        }

        if drop_collection {
            state.collections.remove(collection);
        }
        Ok(())
    }

    async fn remove(&self) -> DbResult<()> {
        let mut state = self.state.lock().await;
        state
            .graphs
            .remove(&self.name)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("graph", self.name.clone()))
    }
}

struct MemoryView {
    name: String,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl View for MemoryView {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set_properties(&self, properties: &ViewProperties) -> DbResult<()> {
        let mut state = self.state.lock().await;
        state.validate_view(properties)?;
        let view = state
            .views
            .get_mut(&self.name)
            .ok_or_else(|| DbError::not_found("view", self.name.clone()))?;
        view.merge(properties);
        Ok(())
    }

    async fn remove(&self) -> DbResult<()> {
        let mut state = self.state.lock().await;
        state
            .views
            .remove(&self.name)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("view", self.name.clone()))
    }
}

struct MemoryAnalyzer {
    name: String,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Analyzer for MemoryAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn remove(&self, force: bool) -> DbResult<()> {
        let mut state = self.state.lock().await;
        if !state.analyzers.contains_key(&self.name) {
            return Err(DbError::not_found("analyzer", self.name.clone()));
        }
        if !force && state.analyzer_in_use(&self.name) {
            return Err(DbError::InvalidRequest(format!(
                "analyzer '{}' is in use",
                self.name
            )));
        }
        state.analyzers.remove(&self.name);
        Ok(())
    }
}
