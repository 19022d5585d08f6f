//! Content-derived migration identity.
//!
//! The checksum is the SHA-256 of a YAML rendering of the migration id and
//! its operations. Operation kinds are written as their numeric code and
//! option maps are written in natural key order, so the bytes depend only
//! on content.

use super::encoding::{self, EncodeError, Node};
use crate::operation::Operation;
use crate::utils::compute_hash;

/// The exact bytes the checksum is computed over
pub fn canonical_encoding(id: i64, operations: &[Operation]) -> Result<String, EncodeError> {
    let operations = operations
        .iter()
        .map(|op| {
            Node::Map(vec![
                ("kind", Node::int(i64::from(op.kind.code()))),
                ("collection", Node::Str(op.collection.as_deref().unwrap_or_default())),
                ("options", Node::object(&op.options)),
            ])
        })
        .collect();

    encoding::document(&[("id", Node::int(id)), ("operations", Node::Seq(operations))])
}

pub fn checksum(id: i64, operations: &[Operation]) -> Result<String, EncodeError> {
    let encoded = canonical_encoding(id, operations)?;
    Ok(compute_hash(encoded.as_bytes()))
}
