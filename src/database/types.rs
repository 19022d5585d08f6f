//! Strongly-typed option records accepted by the database capability surface.
//!
//! Every record decodes with camelCase field names and rejects unknown
//! fields, so a misspelled option in a migration document fails loudly
//! instead of being dropped.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of documents a collection stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "CollectionTypeRepr")]
pub enum CollectionType {
    Document,
    Edge,
}

/// Collection types may be written by name or by their numeric wire code
#[derive(Deserialize)]
#[serde(untagged)]
enum CollectionTypeRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<CollectionTypeRepr> for CollectionType {
    type Error = String;

    fn try_from(repr: CollectionTypeRepr) -> Result<Self, Self::Error> {
        match repr {
            CollectionTypeRepr::Code(2) => Ok(Self::Document),
            CollectionTypeRepr::Code(3) => Ok(Self::Edge),
            CollectionTypeRepr::Code(code) => Err(format!("unknown collection type code {code}")),
            CollectionTypeRepr::Name(name) => match name.as_str() {
                "document" => Ok(Self::Document),
                "edge" => Ok(Self::Edge),
                _ => Err(format!("unknown collection type '{name}'")),
            },
        }
    }
}

/// Document key generator of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyGenerator {
    Traditional,
    Autoincrement,
    Uuid,
    Padded,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeyOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub generator: Option<KeyGenerator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_user_keys: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

/// How strictly a collection schema is enforced on writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaLevel {
    None,
    New,
    Moderate,
    #[default]
    Strict,
}

/// JSON-schema validation attached to a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionSchema {
    pub rule: Value,
    #[serde(default)]
    pub level: SchemaLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCollectionOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<CollectionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_system: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_shards: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_concern: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_options: Option<KeyOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<CollectionSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_enabled: Option<bool>,
}

impl CreateCollectionOptions {
    pub fn collection_type(&self) -> CollectionType {
        self.collection_type.unwrap_or(CollectionType::Document)
    }
}

/// Mutable properties of an existing collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_concern: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<CollectionSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_enabled: Option<bool>,
}

/// Relation between vertex collections through one edge collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EdgeDefinition {
    pub collection: String,
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default)]
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateGraphOptions {
    #[serde(default)]
    pub edge_definitions: Vec<EdgeDefinition>,
    #[serde(default)]
    pub orphan_vertex_collections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_smart: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_graph_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disjoint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_shards: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_concern: Option<u32>,
    #[serde(default)]
    pub satellites: Vec<String>,
}

/// Vertex collections an edge collection may connect
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VertexConstraints {
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default)]
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreValues {
    None,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Lz4,
    None,
}

/// Per-collection (or per-field) link of a search view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ViewLink {
    #[serde(default)]
    pub analyzers: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, ViewLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all_fields: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_list_positions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_values: Option<StoreValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_background: Option<bool>,
}

impl ViewLink {
    /// Every analyzer referenced by this link and its nested fields
    pub fn referenced_analyzers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.analyzers.iter().map(String::as_str).collect();
        for field in self.fields.values() {
            names.extend(field.referenced_analyzers());
        }
        names
    }
}

fn default_ascending() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrimarySortEntry {
    pub field: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoredValue {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,
}

/// Properties of a search view, used both on creation and on update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ViewProperties {
    #[serde(default)]
    pub links: BTreeMap<String, ViewLink>,
    #[serde(default)]
    pub primary_sort: Vec<PrimarySortEntry>,
    #[serde(default)]
    pub stored_values: Vec<StoredValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_interval_step: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_interval_msec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consolidation_interval_msec: Option<u64>,
}

impl ViewProperties {
    /// Apply a partial update: links are merged by collection, scalar
    /// properties are replaced only when present in `update`.
    pub fn merge(&mut self, update: &ViewProperties) {
        for (collection, link) in &update.links {
            self.links.insert(collection.clone(), link.clone());
        }
        if !update.primary_sort.is_empty() {
            self.primary_sort = update.primary_sort.clone();
        }
        if !update.stored_values.is_empty() {
            self.stored_values = update.stored_values.clone();
        }
        if update.cleanup_interval_step.is_some() {
            self.cleanup_interval_step = update.cleanup_interval_step;
        }
        if update.commit_interval_msec.is_some() {
            self.commit_interval_msec = update.commit_interval_msec;
        }
        if update.consolidation_interval_msec.is_some() {
            self.consolidation_interval_msec = update.consolidation_interval_msec;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Primary,
    Edge,
    Fulltext,
    Geo,
    Hash,
    Inverted,
    Persistent,
    Skiplist,
    Ttl,
    Zkd,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Edge => "edge",
            Self::Fulltext => "fulltext",
            Self::Geo => "geo",
            Self::Hash => "hash",
            Self::Inverted => "inverted",
            Self::Persistent => "persistent",
            Self::Skiplist => "skiplist",
            Self::Ttl => "ttl",
            Self::Zkd => "zkd",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FulltextIndexOptions {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_background: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeoIndexOptions {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_json: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_polygons: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_background: Option<bool>,
}

/// Options shared by hash and skiplist indexes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HashIndexOptions {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_background: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersistentIndexOptions {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_enabled: Option<bool>,
    #[serde(default)]
    pub stored_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_background: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TtlIndexOptions {
    pub field: String,
    pub expire_after: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_background: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZkdFieldType {
    #[default]
    Double,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ZkdIndexOptions {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub field_value_types: ZkdFieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_background: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InvertedField {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all_fields: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_list_positions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_field: Option<bool>,
}

/// Inverted index fields may be written as a bare attribute path
#[derive(Deserialize)]
#[serde(untagged)]
enum InvertedFieldRepr {
    Path(String),
    Field(InvertedField),
}

fn inverted_fields<'de, D>(deserializer: D) -> Result<Vec<InvertedField>, D::Error>
where
    D: Deserializer<'de>,
{
    let fields = Vec::<InvertedFieldRepr>::deserialize(deserializer)?;
    Ok(fields
        .into_iter()
        .map(|field| match field {
            InvertedFieldRepr::Path(name) => InvertedField {
                name,
                ..InvertedField::default()
            },
            InvertedFieldRepr::Field(field) => field,
        })
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InvertedIndexOptions {
    #[serde(deserialize_with = "inverted_fields")]
    pub fields: Vec<InvertedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all_fields: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_list_positions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_field: Option<bool>,
    #[serde(default)]
    pub primary_sort: Vec<PrimarySortEntry>,
    #[serde(default)]
    pub stored_values: Vec<StoredValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_background: Option<bool>,
}

/// A secondary index to ensure on a collection
#[derive(Debug, Clone, PartialEq)]
pub enum IndexDefinition {
    Fulltext(FulltextIndexOptions),
    Geo(GeoIndexOptions),
    Hash(HashIndexOptions),
    Inverted(InvertedIndexOptions),
    Persistent(PersistentIndexOptions),
    Skiplist(HashIndexOptions),
    Ttl(TtlIndexOptions),
    Zkd(ZkdIndexOptions),
}

impl IndexDefinition {
    pub fn index_type(&self) -> IndexType {
        match self {
            Self::Fulltext(_) => IndexType::Fulltext,
            Self::Geo(_) => IndexType::Geo,
            Self::Hash(_) => IndexType::Hash,
            Self::Inverted(_) => IndexType::Inverted,
            Self::Persistent(_) => IndexType::Persistent,
            Self::Skiplist(_) => IndexType::Skiplist,
            Self::Ttl(_) => IndexType::Ttl,
            Self::Zkd(_) => IndexType::Zkd,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Fulltext(opts) => opts.name.as_deref(),
            Self::Geo(opts) => opts.name.as_deref(),
            Self::Hash(opts) | Self::Skiplist(opts) => opts.name.as_deref(),
            Self::Inverted(opts) => opts.name.as_deref(),
            Self::Persistent(opts) => opts.name.as_deref(),
            Self::Ttl(opts) => opts.name.as_deref(),
            Self::Zkd(opts) => opts.name.as_deref(),
        }
    }

    /// Indexed attribute paths, in declaration order
    pub fn fields(&self) -> Vec<String> {
        match self {
            Self::Fulltext(opts) => opts.fields.clone(),
            Self::Geo(opts) => opts.fields.clone(),
            Self::Hash(opts) | Self::Skiplist(opts) => opts.fields.clone(),
            Self::Inverted(opts) => opts.fields.iter().map(|f| f.name.clone()).collect(),
            Self::Persistent(opts) => opts.fields.clone(),
            Self::Ttl(opts) => vec![opts.field.clone()],
            Self::Zkd(opts) => opts.fields.clone(),
        }
    }
}

/// Description of an index as reported by the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerFeature {
    Frequency,
    Norm,
    Position,
    Offset,
}

/// Full definition of a text analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub analyzer_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub features: Vec<AnalyzerFeature>,
}

/// Metadata returned by document writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_type_accepts_names_and_codes() {
        let by_name: CreateCollectionOptions =
            serde_json::from_value(json!({ "type": "edge" })).unwrap();
        let by_code: CreateCollectionOptions =
            serde_json::from_value(json!({ "type": 3 })).unwrap();
        assert_eq!(by_name.collection_type(), CollectionType::Edge);
        assert_eq!(by_code.collection_type(), CollectionType::Edge);

        let defaulted = CreateCollectionOptions::default();
        assert_eq!(defaulted.collection_type(), CollectionType::Document);
    }

    #[test]
    fn test_collection_type_rejects_unknown_code() {
        let result: Result<CreateCollectionOptions, _> =
            serde_json::from_value(json!({ "type": 7 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<HashIndexOptions, _> =
            serde_json::from_value(json!({ "fields": ["a"], "unqiue": true }));
        assert!(result.unwrap_err().to_string().contains("unqiue"));
    }

    #[test]
    fn test_inverted_fields_shorthand() {
        let opts: InvertedIndexOptions = serde_json::from_value(json!({
            "fields": ["title", { "name": "body", "analyzer": "text_en" }]
        }))
        .unwrap();

        assert_eq!(opts.fields.len(), 2);
        assert_eq!(opts.fields[0].name, "title");
        assert_eq!(opts.fields[1].analyzer.as_deref(), Some("text_en"));
    }

    #[test]
    fn test_view_properties_merge() {
        let mut props: ViewProperties = serde_json::from_value(json!({
            "links": { "users": { "analyzers": ["identity"] } },
            "commitIntervalMsec": 1000
        }))
        .unwrap();
        let update: ViewProperties = serde_json::from_value(json!({
            "links": { "posts": { "includeAllFields": true } },
            "cleanupIntervalStep": 2
        }))
        .unwrap();

        props.merge(&update);

        assert!(props.links.contains_key("users"));
        assert!(props.links.contains_key("posts"));
        assert_eq!(props.commit_interval_msec, Some(1000));
        assert_eq!(props.cleanup_interval_step, Some(2));
    }

    #[test]
    fn test_view_link_referenced_analyzers() {
        let link: ViewLink = serde_json::from_value(json!({
            "analyzers": ["identity"],
            "fields": { "title": { "analyzers": ["text_en"] } }
        }))
        .unwrap();

        assert_eq!(link.referenced_analyzers(), vec!["identity", "text_en"]);
    }
}
