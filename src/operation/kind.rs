//! The closed vocabulary of operation kinds.

use super::OperationError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Every schema or data change a migration can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    ExecuteAql,
    CreateCollection,
    UpdateCollection,
    DeleteCollection,
    CreateGraph,
    AddVertexToGraph,
    RemoveVertexFromGraph,
    AddEdgeToGraph,
    RemoveEdgeFromGraph,
    DeleteGraph,
    CreateView,
    UpdateView,
    DeleteView,
    CreateFulltextIndex,
    CreateGeoSpatialIndex,
    CreateHashIndex,
    CreateInvertedIndex,
    CreatePersistentIndex,
    CreateSkipListIndex,
    CreateTtlIndex,
    CreateZkdIndex,
    DeleteIndex,
    CreateAnalyzer,
    DeleteAnalyzer,
}

/// Lookup table from document spelling to kind, built once
static KINDS_BY_NAME: Lazy<HashMap<&'static str, OperationKind>> = Lazy::new(|| {
    OperationKind::ALL
        .iter()
        .map(|kind| (kind.as_str(), *kind))
        .collect()
});

impl OperationKind {
    /// All kinds, in vocabulary order
    pub const ALL: [OperationKind; 24] = [
        Self::ExecuteAql,
        Self::CreateCollection,
        Self::UpdateCollection,
        Self::DeleteCollection,
        Self::CreateGraph,
        Self::AddVertexToGraph,
        Self::RemoveVertexFromGraph,
        Self::AddEdgeToGraph,
        Self::RemoveEdgeFromGraph,
        Self::DeleteGraph,
        Self::CreateView,
        Self::UpdateView,
        Self::DeleteView,
        Self::CreateFulltextIndex,
        Self::CreateGeoSpatialIndex,
        Self::CreateHashIndex,
        Self::CreateInvertedIndex,
        Self::CreatePersistentIndex,
        Self::CreateSkipListIndex,
        Self::CreateTtlIndex,
        Self::CreateZkdIndex,
        Self::DeleteIndex,
        Self::CreateAnalyzer,
        Self::DeleteAnalyzer,
    ];

    /// The spelling used in migration documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecuteAql => "executeAQL",
            Self::CreateCollection => "createCollection",
            Self::UpdateCollection => "updateCollection",
            Self::DeleteCollection => "deleteCollection",
            Self::CreateGraph => "createGraph",
            Self::AddVertexToGraph => "addVertexToGraph",
            Self::RemoveVertexFromGraph => "removeVertexFromGraph",
            Self::AddEdgeToGraph => "addEdgeToGraph",
            Self::RemoveEdgeFromGraph => "removeEdgeFromGraph",
            Self::DeleteGraph => "deleteGraph",
            Self::CreateView => "createView",
            Self::UpdateView => "updateView",
            Self::DeleteView => "deleteView",
            Self::CreateFulltextIndex => "createFulltextIndex",
            Self::CreateGeoSpatialIndex => "createGeoSpatialIndex",
            Self::CreateHashIndex => "createHashIndex",
            Self::CreateInvertedIndex => "createInvertedIndex",
            Self::CreatePersistentIndex => "createPersistentIndex",
            Self::CreateSkipListIndex => "createSkipListIndex",
            Self::CreateTtlIndex => "createTTLIndex",
            Self::CreateZkdIndex => "createZKDIndex",
            Self::DeleteIndex => "deleteIndex",
            Self::CreateAnalyzer => "createAnalyzer",
            Self::DeleteAnalyzer => "deleteAnalyzer",
        }
    }

    /// Stable numeric code used in the checksum encoding.
    ///
    /// Codes are 1-based in vocabulary order and must never be reassigned.
    pub fn code(&self) -> u8 {
        match self {
            Self::ExecuteAql => 1,
            Self::CreateCollection => 2,
            Self::UpdateCollection => 3,
            Self::DeleteCollection => 4,
            Self::CreateGraph => 5,
            Self::AddVertexToGraph => 6,
            Self::RemoveVertexFromGraph => 7,
            Self::AddEdgeToGraph => 8,
            Self::RemoveEdgeFromGraph => 9,
            Self::DeleteGraph => 10,
            Self::CreateView => 11,
            Self::UpdateView => 12,
            Self::DeleteView => 13,
            Self::CreateFulltextIndex => 14,
            Self::CreateGeoSpatialIndex => 15,
            Self::CreateHashIndex => 16,
            Self::CreateInvertedIndex => 17,
            Self::CreatePersistentIndex => 18,
            Self::CreateSkipListIndex => 19,
            Self::CreateTtlIndex => 20,
            Self::CreateZkdIndex => 21,
            Self::DeleteIndex => 22,
            Self::CreateAnalyzer => 23,
            Self::DeleteAnalyzer => 24,
        }
    }

    /// Whether the operation addresses a named object through `collection`
    pub fn requires_target(&self) -> bool {
        !matches!(self, Self::ExecuteAql)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KINDS_BY_NAME
            .get(s)
            .copied()
            .ok_or_else(|| OperationError::InvalidKind(s.to_string()))
    }
}

impl Serialize for OperationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
