//! Operation registry.
//!
//! An [`Operation`] is one declarative change loaded from a migration
//! document: a kind from the closed [`OperationKind`] vocabulary, an optional
//! target name and an untyped option map. [`Operation::prepare`] decodes the
//! option map into the record that kind expects and yields an
//! [`OperationCall`], which performs exactly one call against the
//! [`Database`](crate::database::Database) capability surface.

mod call;
mod kind;
mod options;

pub use call::OperationCall;
pub use kind::OperationKind;
pub use options::{
    AddEdgeOptions, AddVertexOptions, AqlOptions, CreateAnalyzerOptions, DeleteAnalyzerOptions,
    DeleteIndexOptions, NoOptions, RemoveFromGraphOptions,
};

use crate::database::{Database, DbError};
use crate::executor::RunContext;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("invalid operation kind: {0}")]
    InvalidKind(String),

    #[error("{0} requires a target name in `collection`")]
    MissingTarget(OperationKind),

    #[error("invalid options for {kind}: {source}")]
    InvalidOptions {
        kind: OperationKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("analyzer '{0}' already exists")]
    AnalyzerExists(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// A single declarative change within a migration
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    /// Name of the collection, graph, view or analyzer the operation targets
    pub collection: Option<String>,
    pub options: Map<String, Value>,
}

impl Operation {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            collection: None,
            options: Map::new(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// The target name, required by every kind except ad-hoc queries
    pub fn target(&self) -> Result<&str, OperationError> {
        match self.collection.as_deref() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(OperationError::MissingTarget(self.kind)),
        }
    }

    /// Decode the option map into the record `T`, rejecting unknown fields
    pub fn decode_options<T: DeserializeOwned>(&self) -> Result<T, OperationError> {
        serde_json::from_value(Value::Object(self.options.clone())).map_err(|source| {
            OperationError::InvalidOptions {
                kind: self.kind,
                source,
            }
        })
    }

    /// Validate and decode this operation into a ready-to-run call
    pub fn prepare(&self) -> Result<OperationCall, OperationError> {
        OperationCall::from_operation(self)
    }

    /// Prepare and run the operation against `db`
    pub async fn run(&self, ctx: &RunContext, db: &dyn Database) -> Result<(), OperationError> {
        self.prepare()?.run(ctx, db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_target_required() {
        let op = Operation::new(OperationKind::DeleteCollection);
        assert!(matches!(
            op.target(),
            Err(OperationError::MissingTarget(OperationKind::DeleteCollection))
        ));

        let blank = Operation::new(OperationKind::DeleteCollection).with_collection("");
        assert!(blank.target().is_err());
    }

    #[test]
    fn test_decode_options_rejects_unknown_field() {
        let op = Operation::new(OperationKind::ExecuteAql)
            .with_options(options(json!({ "query": "RETURN 1", "bindvars": {} })));

        let err = op.decode_options::<AqlOptions>().unwrap_err();
        assert!(matches!(
            err,
            OperationError::InvalidOptions {
                kind: OperationKind::ExecuteAql,
                ..
            }
        ));
        assert!(err.to_string().contains("bindvars"));
    }

    #[test]
    fn test_decode_options_rejects_mistyped_field() {
        let op = Operation::new(OperationKind::DeleteAnalyzer)
            .with_collection("shingles")
            .with_options(options(json!({ "force": "yes" })));

        assert!(op.decode_options::<DeleteAnalyzerOptions>().is_err());
    }
}
