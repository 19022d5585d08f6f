//! Decoded operations and their dispatch onto the capability surface.

use super::{
    AddEdgeOptions, AddVertexOptions, AqlOptions, CreateAnalyzerOptions, DeleteAnalyzerOptions,
    DeleteIndexOptions, NoOptions, Operation, OperationError, OperationKind,
    RemoveFromGraphOptions,
};
use crate::database::{
    AnalyzerDefinition, CollectionProperties, CreateCollectionOptions, CreateGraphOptions,
    Database, EdgeDefinition, IndexDefinition, ViewProperties,
};
use crate::executor::RunContext;

/// A fully decoded operation, ready to run.
///
/// Each variant maps to exactly one capability call, preceded by the
/// lookup of its target handle where the call needs one.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationCall {
    ExecuteAql(AqlOptions),
    CreateCollection {
        name: String,
        options: CreateCollectionOptions,
    },
    UpdateCollection {
        name: String,
        properties: CollectionProperties,
    },
    DeleteCollection {
        name: String,
    },
    CreateGraph {
        name: String,
        options: CreateGraphOptions,
    },
    AddVertexToGraph {
        graph: String,
        options: AddVertexOptions,
    },
    RemoveVertexFromGraph {
        graph: String,
        options: RemoveFromGraphOptions,
    },
    AddEdgeToGraph {
        graph: String,
        options: AddEdgeOptions,
    },
    RemoveEdgeFromGraph {
        graph: String,
        options: RemoveFromGraphOptions,
    },
    DeleteGraph {
        name: String,
    },
    CreateView {
        name: String,
        properties: ViewProperties,
    },
    UpdateView {
        name: String,
        properties: ViewProperties,
    },
    DeleteView {
        name: String,
    },
    EnsureIndex {
        collection: String,
        definition: IndexDefinition,
    },
    DeleteIndex {
        collection: String,
        name: String,
    },
    CreateAnalyzer(AnalyzerDefinition),
    DeleteAnalyzer {
        name: String,
        force: bool,
    },
}

impl OperationCall {
    pub fn from_operation(op: &Operation) -> Result<Self, OperationError> {
        let target = if op.kind.requires_target() {
            op.target()?.to_string()
        } else {
            String::new()
        };

        let call = match op.kind {
            OperationKind::ExecuteAql => Self::ExecuteAql(op.decode_options()?),
            OperationKind::CreateCollection => Self::CreateCollection {
                name: target,
                options: op.decode_options()?,
            },
            OperationKind::UpdateCollection => Self::UpdateCollection {
                name: target,
                properties: op.decode_options()?,
            },
            OperationKind::DeleteCollection => {
                op.decode_options::<NoOptions>()?;
                Self::DeleteCollection { name: target }
            }
            OperationKind::CreateGraph => Self::CreateGraph {
                name: target,
                options: op.decode_options()?,
            },
            OperationKind::AddVertexToGraph => Self::AddVertexToGraph {
                graph: target,
                options: op.decode_options()?,
            },
            OperationKind::RemoveVertexFromGraph => Self::RemoveVertexFromGraph {
                graph: target,
                options: op.decode_options()?,
            },
            OperationKind::AddEdgeToGraph => Self::AddEdgeToGraph {
                graph: target,
                options: op.decode_options()?,
            },
            OperationKind::RemoveEdgeFromGraph => Self::RemoveEdgeFromGraph {
                graph: target,
                options: op.decode_options()?,
            },
            OperationKind::DeleteGraph => {
                op.decode_options::<NoOptions>()?;
                Self::DeleteGraph { name: target }
            }
            OperationKind::CreateView => Self::CreateView {
                name: target,
                properties: op.decode_options()?,
            },
            OperationKind::UpdateView => Self::UpdateView {
                name: target,
                properties: op.decode_options()?,
            },
            OperationKind::DeleteView => {
                op.decode_options::<NoOptions>()?;
                Self::DeleteView { name: target }
            }
            OperationKind::CreateFulltextIndex => Self::EnsureIndex {
                collection: target,
                definition: IndexDefinition::Fulltext(op.decode_options()?),
            },
            OperationKind::CreateGeoSpatialIndex => Self::EnsureIndex {
                collection: target,
                definition: IndexDefinition::Geo(op.decode_options()?),
            },
            OperationKind::CreateHashIndex => Self::EnsureIndex {
                collection: target,
                definition: IndexDefinition::Hash(op.decode_options()?),
            },
            OperationKind::CreateInvertedIndex => Self::EnsureIndex {
                collection: target,
                definition: IndexDefinition::Inverted(op.decode_options()?),
            },
            OperationKind::CreatePersistentIndex => Self::EnsureIndex {
                collection: target,
                definition: IndexDefinition::Persistent(op.decode_options()?),
            },
            OperationKind::CreateSkipListIndex => Self::EnsureIndex {
                collection: target,
                definition: IndexDefinition::Skiplist(op.decode_options()?),
            },
            OperationKind::CreateTtlIndex => Self::EnsureIndex {
                collection: target,
                definition: IndexDefinition::Ttl(op.decode_options()?),
            },
            OperationKind::CreateZkdIndex => Self::EnsureIndex {
                collection: target,
                definition: IndexDefinition::Zkd(op.decode_options()?),
            },
            OperationKind::DeleteIndex => {
                let opts: DeleteIndexOptions = op.decode_options()?;
                Self::DeleteIndex {
                    collection: target,
                    name: opts.name,
                }
            }
            OperationKind::CreateAnalyzer => {
                let opts: CreateAnalyzerOptions = op.decode_options()?;
                Self::CreateAnalyzer(AnalyzerDefinition {
                    name: target,
                    analyzer_type: opts.analyzer_type,
                    properties: opts.properties,
                    features: opts.features,
                })
            }
            OperationKind::DeleteAnalyzer => {
                let opts: DeleteAnalyzerOptions = op.decode_options()?;
                Self::DeleteAnalyzer {
                    name: target,
                    force: opts.force,
                }
            }
        };

        Ok(call)
    }

    /// Run the call against `db`, racing every capability call against `ctx`
    pub async fn run(&self, ctx: &RunContext, db: &dyn Database) -> Result<(), OperationError> {
        match self {
            Self::ExecuteAql(opts) => {
                ctx.guard(db.query(&opts.query, &opts.bind_vars)).await?;
            }
            Self::CreateCollection { name, options } => {
                ctx.guard(db.create_collection(name, options)).await?;
            }
            Self::UpdateCollection { name, properties } => {
                let collection = ctx.guard(db.collection(name)).await?;
                ctx.guard(collection.set_properties(properties)).await?;
            }
            Self::DeleteCollection { name } => {
                let collection = ctx.guard(db.collection(name)).await?;
                ctx.guard(collection.remove()).await?;
            }
            Self::CreateGraph { name, options } => {
                ctx.guard(db.create_graph(name, options)).await?;
            }
            Self::AddVertexToGraph { graph, options } => {
                let graph = ctx.guard(db.graph(graph)).await?;
                ctx.guard(graph.add_vertex_collection(&options.collection, &options.satellites))
                    .await?;
            }
            Self::RemoveVertexFromGraph { graph, options } => {
                let graph = ctx.guard(db.graph(graph)).await?;
                ctx.guard(
                    graph.remove_vertex_collection(&options.collection, options.drop_collection),
                )
                .await?;
            }
            Self::AddEdgeToGraph { graph, options } => {
                let graph = ctx.guard(db.graph(graph)).await?;
                let definition = EdgeDefinition {
                    collection: options.collection.clone(),
                    from: options.constraints.from.clone(),
                    to: options.constraints.to.clone(),
                };
                ctx.guard(graph.add_edge_definition(&definition, &options.satellites))
                    .await?;
            }
            Self::RemoveEdgeFromGraph { graph, options } => {
                let graph = ctx.guard(db.graph(graph)).await?;
                ctx.guard(
                    graph.remove_edge_definition(&options.collection, options.drop_collection),
                )
                .await?;
            }
            Self::DeleteGraph { name } => {
                let graph = ctx.guard(db.graph(name)).await?;
                ctx.guard(graph.remove()).await?;
            }
            Self::CreateView { name, properties } => {
                ctx.guard(db.create_view(name, properties)).await?;
            }
            Self::UpdateView { name, properties } => {
                let view = ctx.guard(db.view(name)).await?;
                ctx.guard(view.set_properties(properties)).await?;
            }
            Self::DeleteView { name } => {
                let view = ctx.guard(db.view(name)).await?;
                ctx.guard(view.remove()).await?;
            }
            Self::EnsureIndex {
                collection,
                definition,
            } => {
                let collection = ctx.guard(db.collection(collection)).await?;
                ctx.guard(collection.ensure_index(definition)).await?;
            }
            Self::DeleteIndex { collection, name } => {
                let collection = ctx.guard(db.collection(collection)).await?;
                let index = ctx.guard(collection.index(name)).await?;
                ctx.guard(index.remove()).await?;
            }
            Self::CreateAnalyzer(definition) => {
                let (existed, _) = ctx.guard(db.ensure_analyzer(definition)).await?;
                if existed {
                    return Err(OperationError::AnalyzerExists(definition.name.clone()));
                }
            }
            Self::DeleteAnalyzer { name, force } => {
                let analyzer = ctx.guard(db.analyzer(name)).await?;
                ctx.guard(analyzer.remove(*force)).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{HashIndexOptions, TtlIndexOptions};
    use serde_json::{json, Map, Value};

    fn op(kind: OperationKind, target: &str, options: Value) -> Operation {
        Operation::new(kind)
            .with_collection(target)
            .with_options(options.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_query_needs_no_target() {
        let call = Operation::new(OperationKind::ExecuteAql)
            .with_options(
                json!({ "query": "RETURN 1" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .prepare()
            .unwrap();

        assert_eq!(
            call,
            OperationCall::ExecuteAql(AqlOptions {
                query: "RETURN 1".to_string(),
                bind_vars: Map::new(),
            })
        );
    }

    #[test]
    fn test_query_requires_query_text() {
        let result = Operation::new(OperationKind::ExecuteAql).prepare();
        assert!(matches!(result, Err(OperationError::InvalidOptions { .. })));
    }

    #[test]
    fn test_skiplist_shares_hash_options() {
        let call = op(
            OperationKind::CreateSkipListIndex,
            "users",
            json!({ "fields": ["age"], "sparse": true }),
        )
        .prepare()
        .unwrap();

        assert_eq!(
            call,
            OperationCall::EnsureIndex {
                collection: "users".to_string(),
                definition: IndexDefinition::Skiplist(HashIndexOptions {
                    fields: vec!["age".to_string()],
                    sparse: Some(true),
                    ..Default::default()
                }),
            }
        );
    }

    #[test]
    fn test_ttl_index_uses_single_field() {
        let call = op(
            OperationKind::CreateTtlIndex,
            "sessions",
            json!({ "field": "createdAt", "expireAfter": 3600 }),
        )
        .prepare()
        .unwrap();

        assert_eq!(
            call,
            OperationCall::EnsureIndex {
                collection: "sessions".to_string(),
                definition: IndexDefinition::Ttl(TtlIndexOptions {
                    field: "createdAt".to_string(),
                    expire_after: 3600,
                    ..Default::default()
                }),
            }
        );
    }

    #[test]
    fn test_delete_kinds_reject_options() {
        let result = op(OperationKind::DeleteView, "search", json!({ "force": true })).prepare();
        assert!(matches!(result, Err(OperationError::InvalidOptions { .. })));
    }

    #[test]
    fn test_analyzer_name_comes_from_target() {
        let call = op(
            OperationKind::CreateAnalyzer,
            "shingles",
            json!({ "type": "ngram", "properties": { "min": 2, "max": 3 }, "features": ["frequency"] }),
        )
        .prepare()
        .unwrap();

        match call {
            OperationCall::CreateAnalyzer(definition) => {
                assert_eq!(definition.name, "shingles");
                assert_eq!(definition.analyzer_type, "ngram");
                assert_eq!(definition.features.len(), 1);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn test_every_targeted_kind_rejects_missing_target() {
        for kind in OperationKind::ALL.into_iter().filter(|k| k.requires_target()) {
            let result = Operation::new(kind).prepare();
            assert!(
                matches!(result, Err(OperationError::MissingTarget(k)) if k == kind),
                "{kind} accepted an operation without a target"
            );
        }
    }
}
