//! Option records for operations whose options are not a plain capability record.

use crate::database::{AnalyzerFeature, VertexConstraints};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AqlOptions {
    pub query: String,
    #[serde(default)]
    pub bind_vars: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddVertexOptions {
    pub collection: String,
    #[serde(default)]
    pub satellites: Vec<String>,
}

/// Shared by vertex and edge removal
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoveFromGraphOptions {
    pub collection: String,
    #[serde(default)]
    pub drop_collection: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddEdgeOptions {
    pub collection: String,
    #[serde(default)]
    pub constraints: VertexConstraints,
    #[serde(default)]
    pub satellites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteIndexOptions {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAnalyzerOptions {
    #[serde(rename = "type")]
    pub analyzer_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub features: Vec<AnalyzerFeature>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteAnalyzerOptions {
    #[serde(default)]
    pub force: bool,
}

/// Kinds that take no options at all
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoOptions {}
